// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    fmt, fs,
    path::Path,
};
use url::Url;

pub const DEFAULT_URL: &str = "https://www.jamstockex.com/trading/trade-quotes/weekly-quotes/";

/// Some exchanges reject non-browser clients outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const SYMBOL_COLUMN: &str = "Symbol";
pub const CHANGE_COLUMN: &str = "Week Change (%)";

pub const INDICES_KEY: &str = "Table 1";
pub const ORDINARY_KEY: &str = "Table 3";
pub const PREFERENCE_KEY: &str = "Table 5";

/// How a logical table is located in the fetched page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSelector {
    /// 1-based index among all `<table>` elements in document order.
    Position(usize),
    /// First table whose `<caption>` contains this text (case-insensitive).
    Caption(String),
    /// First `<table>` matched by this CSS selector.
    Css(String),
}

impl fmt::Display for TableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelector::Position(p) => write!(f, "position {}", p),
            TableSelector::Caption(c) => write!(f, "caption {:?}", c),
            TableSelector::Css(s) => write!(f, "selector {:?}", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub key: String,
    pub display_name: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub selector: TableSelector,
    /// Strip unnamed-marker columns after parsing.
    #[serde(default)]
    pub clean: bool,
}

/// A ranking panel: one table, or the concatenation of several.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub title: String,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Fewer tables than this on the page is a structural mismatch.
    pub min_tables: usize,
    pub tables: Vec<TableSpec>,
    pub symbol_column: String,
    pub change_column: String,
    pub summary: Vec<PanelSpec>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        let table = |key: &str, name: &str, pos: usize, clean: bool| TableSpec {
            key: key.to_string(),
            display_name: name.to_string(),
            selector: TableSelector::Position(pos),
            clean,
        };
        let panel = |title: &str, keys: &[&str]| PanelSpec {
            title: title.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        };

        Self {
            url: DEFAULT_URL.to_string(),
            headers: default_headers(),
            min_tables: 5,
            tables: vec![
                table(INDICES_KEY, "INDICES", 1, false),
                table(ORDINARY_KEY, "ORDINARY SHARES", 3, true),
                table(PREFERENCE_KEY, "PREFERENCE SHARES", 5, true),
            ],
            symbol_column: SYMBOL_COLUMN.to_string(),
            change_column: CHANGE_COLUMN.to_string(),
            summary: vec![
                panel("Overall Market", &[ORDINARY_KEY, PREFERENCE_KEY]),
                panel("Ordinary Shares", &[ORDINARY_KEY]),
                panel("Preference Shares", &[PREFERENCE_KEY]),
            ],
        }
    }
}

/// Request headers sent with every fetch unless overridden.
pub fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("User-Agent".to_string(), BROWSER_USER_AGENT.to_string())])
}

/// Lay `overrides` over `base`. Header names compare case-insensitively, so an
/// override replaces a base entry whatever its spelling.
pub fn merge_headers(base: &mut BTreeMap<String, String>, overrides: &BTreeMap<String, String>) {
    for (name, value) in overrides {
        base.retain(|k, _| !k.eq_ignore_ascii_case(name));
        base.insert(name.clone(), value.clone());
    }
}

impl ScraperConfig {
    /// Read a YAML config file; unspecified fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg: ScraperConfig =
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        cfg.validate()
            .with_context(|| format!("validating config {:?}", path))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url).with_context(|| format!("parsing url {}", self.url))?;

        let mut keys = HashSet::new();
        for spec in &self.tables {
            if !keys.insert(spec.key.as_str()) {
                bail!("duplicate table key {:?}", spec.key);
            }
            if let TableSelector::Position(pos) = spec.selector {
                if pos == 0 {
                    bail!("table {:?}: positions start at 1", spec.key);
                }
                if pos > self.min_tables {
                    bail!(
                        "table {:?} at position {} exceeds min_tables {}",
                        spec.key,
                        pos,
                        self.min_tables
                    );
                }
            }
        }

        for panel in &self.summary {
            if panel.keys.is_empty() {
                bail!("panel {:?} has no tables", panel.title);
            }
            if let Some(k) = panel.keys.iter().find(|k| !keys.contains(k.as_str())) {
                bail!("panel {:?} references unknown table {:?}", panel.title, k);
            }
        }
        Ok(())
    }

    pub fn table(&self, key: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.key == key)
    }

    /// Header map for a request: configured headers over the browser default.
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = default_headers();
        merge_headers(&mut headers, &self.headers);
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_layout_is_valid() {
        let cfg = ScraperConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.min_tables, 5);
        assert_eq!(
            cfg.table(ORDINARY_KEY).map(|t| &t.selector),
            Some(&TableSelector::Position(3))
        );
        assert!(!cfg.table(INDICES_KEY).unwrap().clean);
        assert!(cfg.request_headers().contains_key("User-Agent"));
    }

    #[test]
    fn test_load_yaml_with_selectors() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            r#"
url: "https://example.com/quotes"
min_tables: 2
tables:
  - key: indices
    display_name: INDICES
    selector:
      caption: Market Indices
  - key: ordinary
    display_name: ORDINARY SHARES
    selector:
      position: 2
    clean: true
  - key: preference
    display_name: PREFERENCE SHARES
    selector:
      css: "table#pref"
    clean: true
summary:
  - title: Ordinary Shares
    keys: [ordinary]
"#
        )?;

        let cfg = ScraperConfig::load(tmp.path())?;
        assert_eq!(cfg.url, "https://example.com/quotes");
        assert_eq!(cfg.tables.len(), 3);
        assert_eq!(
            cfg.tables[0].selector,
            TableSelector::Caption("Market Indices".into())
        );
        assert_eq!(cfg.tables[2].selector, TableSelector::Css("table#pref".into()));
        // unspecified fields fall back to the defaults
        assert_eq!(cfg.symbol_column, SYMBOL_COLUMN);
        assert_eq!(cfg.change_column, CHANGE_COLUMN);
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_panel_key() {
        let mut cfg = ScraperConfig::default();
        cfg.summary.push(PanelSpec {
            title: "Bonds".into(),
            keys: vec!["Table 9".into()],
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_position_beyond_min_tables() {
        let mut cfg = ScraperConfig::default();
        cfg.min_tables = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_configured_headers_override_default() {
        let mut cfg = ScraperConfig::default();
        cfg.headers.insert("User-Agent".into(), "custom".into());
        cfg.headers.insert("Accept".into(), "text/html".into());
        let headers = cfg.request_headers();
        assert_eq!(headers["User-Agent"], "custom");
        assert_eq!(headers["Accept"], "text/html");
    }

    #[test]
    fn test_header_override_ignores_case() {
        let mut cfg = ScraperConfig::default();
        cfg.headers = BTreeMap::from([("USER-AGENT".to_string(), "custom".to_string())]);
        let headers = cfg.request_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["USER-AGENT"], "custom");
    }

    #[test]
    fn test_merge_headers_keeps_unrelated_entries() {
        let mut headers = default_headers();
        merge_headers(
            &mut headers,
            &BTreeMap::from([
                ("user-agent".to_string(), "bot".to_string()),
                ("Accept".to_string(), "text/html".to_string()),
            ]),
        );
        assert_eq!(
            headers,
            BTreeMap::from([
                ("Accept".to_string(), "text/html".to_string()),
                ("user-agent".to_string(), "bot".to_string()),
            ])
        );
    }
}
