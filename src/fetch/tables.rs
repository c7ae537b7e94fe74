// src/fetch/tables.rs

use crate::config::{TableSelector, TableSpec};
use crate::dataset::{clean_text, Cell, Dataset, TableSet, UNNAMED_PREFIX};
use crate::error::FetchError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("table selector should parse"));

// HTML caps spans at these values; anything larger is clamped.
const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

#[derive(Clone, Debug)]
struct RawCell {
    text: String,
    header: bool,
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn span_attr(el: &ElementRef, name: &str, max: usize) -> usize {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, max)
}

/// Rows of one table, split into head/body/foot, without entering nested tables.
fn section_rows<'a>(
    table: ElementRef<'a>,
) -> (Vec<ElementRef<'a>>, Vec<ElementRef<'a>>, Vec<ElementRef<'a>>) {
    let rows_of = |section: ElementRef<'a>| {
        child_elements(section)
            .filter(|e| e.value().name() == "tr")
            .collect::<Vec<_>>()
    };

    let (mut head, mut body, mut foot) = (Vec::new(), Vec::new(), Vec::new());
    for child in child_elements(table) {
        match child.value().name() {
            "thead" => head.extend(rows_of(child)),
            "tbody" => body.extend(rows_of(child)),
            "tfoot" => foot.extend(rows_of(child)),
            "tr" => body.push(child),
            _ => {}
        }
    }
    (head, body, foot)
}

fn place(
    grid: &mut Vec<RawCell>,
    pending: &mut BTreeMap<usize, (usize, RawCell)>,
    cell: RawCell,
    rowspan: usize,
) {
    if rowspan > 1 {
        pending.insert(grid.len(), (rowspan - 1, cell.clone()));
    }
    grid.push(cell);
}

/// Lay the rows of one section out on a grid, repeating spanned cells.
fn expand_spans(rows: &[ElementRef]) -> Vec<Vec<RawCell>> {
    let mut out = Vec::with_capacity(rows.len());
    // column -> (rows still covered, cell)
    let mut pending: BTreeMap<usize, (usize, RawCell)> = BTreeMap::new();

    for row in rows {
        let mut carried = std::mem::take(&mut pending);
        let mut grid: Vec<RawCell> = Vec::new();

        let cells = child_elements(*row).filter(|e| matches!(e.value().name(), "td" | "th"));
        for cell in cells {
            while let Some((left, raw)) = carried.remove(&grid.len()) {
                place(&mut grid, &mut pending, raw, left);
            }
            let raw = RawCell {
                text: clean_text(&cell.text().collect::<String>()),
                header: cell.value().name() == "th",
            };
            let colspan = span_attr(&cell, "colspan", MAX_COLSPAN);
            let rowspan = span_attr(&cell, "rowspan", MAX_ROWSPAN);
            for _ in 0..colspan {
                place(&mut grid, &mut pending, raw.clone(), rowspan);
            }
        }

        // spans hanging past the last real cell
        for (col, (left, raw)) in carried {
            while grid.len() < col {
                grid.push(RawCell {
                    text: String::new(),
                    header: false,
                });
            }
            place(&mut grid, &mut pending, raw, left);
        }

        if !grid.is_empty() {
            out.push(grid);
        }
    }
    out
}

fn column_names(header: Option<&[RawCell]>, width: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(width);
    let mut seen: HashMap<String, usize> = HashMap::new();

    for i in 0..width {
        let base = match header {
            None => i.to_string(),
            Some(cells) => match cells.get(i) {
                Some(c) if !c.text.is_empty() => c.text.clone(),
                _ => format!("{}: {}", UNNAMED_PREFIX, i),
            },
        };
        let count = seen.entry(base.clone()).or_insert(0);
        let name = if *count == 0 {
            base
        } else {
            format!("{}.{}", base, count)
        };
        *count += 1;
        names.push(name);
    }
    names
}

/// Convert one `<table>` element to a dataset.
///
/// The header is the last `<thead>` row, or else the last of the leading
/// rows made only of `<th>` cells. Tables without a header get `0`, `1`, …
pub fn parse_table(table: ElementRef) -> Dataset {
    let (head, body, foot) = section_rows(table);
    let mut head_rows = expand_spans(&head);
    let mut body_rows = expand_spans(&body);
    body_rows.extend(expand_spans(&foot));

    if head_rows.is_empty() {
        let leading = body_rows
            .iter()
            .take_while(|r| !r.is_empty() && r.iter().all(|c| c.header))
            .count();
        head_rows = body_rows.drain(..leading).collect();
    }

    let header = head_rows.last().map(Vec::as_slice);
    let width = header
        .map(<[RawCell]>::len)
        .into_iter()
        .chain(body_rows.iter().map(Vec::len))
        .max()
        .unwrap_or(0);

    let columns = column_names(header, width);
    trace!(?columns, rows = body_rows.len(), "Parsed table");
    Dataset::from_rows(
        columns,
        body_rows
            .into_iter()
            .map(|r| r.iter().map(|c| Cell::infer(&c.text)).collect()),
    )
}

fn caption_matches(table: &ElementRef, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    child_elements(*table)
        .filter(|e| e.value().name() == "caption")
        .any(|cap| {
            clean_text(&cap.text().collect::<String>())
                .to_lowercase()
                .contains(&needle)
        })
}

fn locate<'a>(
    doc: &'a Html,
    tables: &[ElementRef<'a>],
    spec: &TableSpec,
) -> Result<ElementRef<'a>, FetchError> {
    let found = match &spec.selector {
        TableSelector::Position(pos) => pos.checked_sub(1).and_then(|i| tables.get(i)).copied(),
        TableSelector::Caption(text) => tables.iter().find(|t| caption_matches(t, text)).copied(),
        TableSelector::Css(css) => {
            let sel = Selector::parse(css).map_err(|e| FetchError::InvalidSelector {
                selector: css.clone(),
                reason: format!("{:?}", e),
            })?;
            doc.select(&sel).find(|e| e.value().name() == "table")
        }
    };

    found.ok_or_else(|| FetchError::TableNotFound {
        key: spec.key.clone(),
        rule: spec.selector.to_string(),
    })
}

/// Parse `html` and pull out every configured table. Either every table is
/// found or the whole extraction fails.
pub fn extract_tables(
    html: &str,
    specs: &[TableSpec],
    min_tables: usize,
) -> Result<TableSet, FetchError> {
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef> = doc.select(&TABLE_SELECTOR).collect();
    debug!(found = tables.len(), required = min_tables, "Located tables");

    if tables.len() < min_tables {
        return Err(FetchError::TooFewTables {
            found: tables.len(),
            required: min_tables,
        });
    }

    let mut out = BTreeMap::new();
    for spec in specs {
        let table = locate(&doc, &tables, spec)?;
        let mut ds = parse_table(table);
        if spec.clean {
            ds = ds.without_unnamed();
        }
        debug!(key = %spec.key, rows = ds.len(), cols = ds.columns().len(), "Extracted table");
        out.insert(spec.key.clone(), ds);
    }
    Ok(TableSet::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::error::FetchErrorKind;

    fn first_table(html: &str) -> Dataset {
        let doc = Html::parse_document(html);
        let table = doc.select(&TABLE_SELECTOR).next().expect("no table in fixture");
        parse_table(table)
    }

    fn strs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn page(tables: usize) -> String {
        let mut html = String::from("<html><body>");
        for i in 1..=tables {
            html.push_str(&format!(
                "<table><thead><tr><th></th><th>Symbol</th><th>Week Change (%)</th></tr></thead>\
                 <tbody><tr><td>{i}</td><td>SYM{i}</td><td>{i}.00%</td></tr></tbody></table>"
            ));
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn test_thead_header_and_unnamed_marker() {
        let ds = first_table(
            "<table><thead><tr><th></th><th>Symbol</th><th>Close</th></tr></thead>\
             <tbody><tr><td>x</td><td>ABC</td><td>1,050.25</td></tr></tbody></table>",
        );
        assert_eq!(ds.columns(), &strs(&["Unnamed: 0", "Symbol", "Close"])[..]);
        assert_eq!(ds.value(0, "Symbol"), Some(&Cell::Text("ABC".into())));
        assert_eq!(ds.value(0, "Close"), Some(&Cell::Number(1050.25)));
    }

    #[test]
    fn test_leading_th_rows_become_header() {
        let ds = first_table(
            "<table><tr><th>Index</th><th>Value</th></tr>\
             <tr><td>Main</td><td>330,000.10</td></tr>\
             <tr><td>Junior</td><td>3,900</td></tr></table>",
        );
        assert_eq!(ds.columns(), &strs(&["Index", "Value"])[..]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(1, "Value"), Some(&Cell::Number(3900.0)));
    }

    #[test]
    fn test_headerless_table_uses_positions() {
        let ds = first_table("<table><tr><td>a</td><td>b</td></tr></table>");
        assert_eq!(ds.columns(), &strs(&["0", "1"])[..]);
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_spans_are_expanded() {
        let ds = first_table(
            "<table><thead><tr><th colspan=\"2\">Name</th><th>Change</th></tr></thead>\
             <tbody><tr><td rowspan=\"2\">A</td><td>x</td><td>1</td></tr>\
             <tr><td>y</td><td>2</td></tr></tbody></table>",
        );
        assert_eq!(ds.columns(), &strs(&["Name", "Name.1", "Change"])[..]);
        let rows: Vec<_> = ds.rows().collect();
        assert_eq!(rows[1][0], Cell::Text("A".into()));
        assert_eq!(rows[1][1], Cell::Text("y".into()));
        assert_eq!(rows[1][2], Cell::Number(2.0));
    }

    #[test]
    fn test_nested_tables_do_not_leak_rows() {
        let ds = first_table(
            "<table><tr><th>Outer</th></tr>\
             <tr><td><table><tr><td>inner</td></tr></table></td></tr></table>",
        );
        assert_eq!(ds.columns(), &strs(&["Outer"])[..]);
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_default_layout_picks_and_cleans() {
        let cfg = ScraperConfig::default();
        let set = extract_tables(&page(5), &cfg.tables, cfg.min_tables).unwrap();

        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["Table 1", "Table 3", "Table 5"]);
        // indices table is left as parsed
        assert!(!set.get("Table 1").unwrap().is_clean());

        let ordinary = set.get("Table 3").unwrap();
        assert!(ordinary.is_clean());
        assert_eq!(ordinary.value(0, "Symbol"), Some(&Cell::Text("SYM3".into())));
        let preference = set.get("Table 5").unwrap();
        assert_eq!(preference.value(0, "Symbol"), Some(&Cell::Text("SYM5".into())));
    }

    #[test]
    fn test_four_tables_is_structural_mismatch() {
        let cfg = ScraperConfig::default();
        let err = extract_tables(&page(4), &cfg.tables, cfg.min_tables).unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::StructuralMismatch);
        assert!(matches!(err, FetchError::TooFewTables { found: 4, required: 5 }));
    }

    #[test]
    fn test_caption_and_css_selectors() {
        let html = "<table id=\"idx\"><caption>Market Indices</caption>\
                    <tr><th>Index</th></tr><tr><td>JSE</td></tr></table>\
                    <table class=\"quotes\"><tr><th>Symbol</th></tr><tr><td>ABC</td></tr></table>";
        let specs = vec![
            TableSpec {
                key: "indices".into(),
                display_name: "INDICES".into(),
                selector: TableSelector::Caption("market indices".into()),
                clean: false,
            },
            TableSpec {
                key: "quotes".into(),
                display_name: "QUOTES".into(),
                selector: TableSelector::Css("table.quotes".into()),
                clean: true,
            },
        ];
        let set = extract_tables(html, &specs, 0).unwrap();
        assert_eq!(
            set.get("indices").unwrap().value(0, "Index"),
            Some(&Cell::Text("JSE".into()))
        );
        assert_eq!(
            set.get("quotes").unwrap().value(0, "Symbol"),
            Some(&Cell::Text("ABC".into()))
        );
    }

    #[test]
    fn test_unmatched_selector_fails_whole_extraction() {
        let specs = vec![TableSpec {
            key: "missing".into(),
            display_name: "MISSING".into(),
            selector: TableSelector::Caption("Bonds".into()),
            clean: false,
        }];
        let err = extract_tables(&page(2), &specs, 1).unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::StructuralMismatch);
    }
}
