// src/dataset.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt};

/// Header assigned by the table parser when a header cell is empty.
pub const UNNAMED_PREFIX: &str = "Unnamed";

static UNNAMED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Unnamed").expect("unnamed marker regex should compile"));

static PLAIN_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("number regex should compile")
});

static THOUSANDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d*)?$").expect("thousands regex should compile")
});

/// Collapse all whitespace runs to a single space and trim the ends.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `name` is a placeholder header produced for an empty header cell.
pub fn is_unnamed(name: &str) -> bool {
    UNNAMED_RE.is_match(name)
}

/// A single table value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Infer a cell from scraped text: empty is missing, plain or
    /// comma-grouped decimals are numbers, anything else stays text.
    pub fn infer(raw: &str) -> Cell {
        let text = clean_text(raw);
        if text.is_empty() {
            return Cell::Missing;
        }
        if PLAIN_NUMBER_RE.is_match(&text) {
            if let Ok(v) = text.parse::<f64>() {
                return Cell::Number(v);
            }
        }
        if THOUSANDS_RE.is_match(&text) {
            if let Ok(v) = text.replace(',', "").parse::<f64>() {
                return Cell::Number(v);
            }
        }
        Cell::Text(text)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Missing => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(v) => serializer.serialize_f64(*v),
            Cell::Missing => serializer.serialize_none(),
        }
    }
}

/// An ordered set of named columns and rows of cells aligned to them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from header names and rows; see [`Dataset::push_row`].
    pub fn from_rows<I>(columns: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let mut ds = Self::new(columns);
        for row in rows {
            ds.push_row(row);
        }
        ds
    }

    /// Append a row. Short rows are padded with `Missing`, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// True iff no column carries the unnamed marker.
    pub fn is_clean(&self) -> bool {
        !self.columns.iter().any(|c| is_unnamed(c))
    }

    /// Copy of this dataset with every unnamed-marker column removed.
    /// Remaining columns keep their order.
    pub fn without_unnamed(&self) -> Dataset {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !is_unnamed(c))
            .map(|(i, _)| i)
            .collect();

        Dataset {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }
}

/// Named datasets extracted from one fetch, keyed by logical table name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TableSet {
    tables: BTreeMap<String, Dataset>,
}

impl TableSet {
    pub fn new(tables: BTreeMap<String, Dataset>) -> Self {
        Self { tables }
    }

    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.tables.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<(String, Dataset)> for TableSet {
    fn from_iter<I: IntoIterator<Item = (String, Dataset)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
