// src/session.rs

//! Caller-held state between refreshes. The fetch and analysis functions
//! never touch it; a front end owns one `Session` and passes it around.

use crate::analyze::{combine, rank, MoverRanking};
use crate::config::ScraperConfig;
use crate::dataset::TableSet;
use crate::error::{AnalysisError, FetchError};
use crate::fetch::TableSource;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

/// How many movers each panel shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TopN(usize);

impl TopN {
    pub const MIN: usize = 1;
    pub const MAX: usize = 20;
    pub const DEFAULT: usize = 5;

    /// Clamp `n` into `MIN..=MAX`.
    pub fn new(n: usize) -> Self {
        TopN(n.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for TopN {
    fn default() -> Self {
        TopN(Self::DEFAULT)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub ranking: MoverRanking,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MarketSummary {
    pub panels: Vec<Panel>,
}

#[derive(Debug, Default)]
pub struct Session {
    tables: Option<TableSet>,
    last_refresh: Option<DateTime<Local>>,
    top_n: TopN,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> Option<&TableSet> {
        self.tables.as_ref()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn top_n(&self) -> TopN {
        self.top_n
    }

    pub fn set_top_n(&mut self, n: usize) {
        self.top_n = TopN::new(n);
    }

    /// Fetch a new table set. On failure the previous tables stay in place.
    pub fn refresh<S: TableSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<&TableSet, FetchError> {
        match source.fetch_tables() {
            Ok(tables) => {
                let now = Local::now();
                info!(tables = tables.len(), at = %now, "refreshed market data");
                self.last_refresh = Some(now);
                Ok(self.tables.insert(tables))
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "refresh failed");
                Err(e)
            }
        }
    }

    /// Rank every configured panel with the current count. `None` until the
    /// first successful refresh.
    pub fn summary(&self, config: &ScraperConfig) -> Option<Result<MarketSummary, AnalysisError>> {
        let tables = self.tables.as_ref()?;
        Some(summarize(tables, config, self.top_n.get()))
    }
}

/// One ranking per `config.summary` panel; multi-table panels are combined first.
pub fn summarize(
    tables: &TableSet,
    config: &ScraperConfig,
    n: usize,
) -> Result<MarketSummary, AnalysisError> {
    let mut panels = Vec::with_capacity(config.summary.len());
    for spec in &config.summary {
        let ranking = match spec.keys.as_slice() {
            [key] => {
                let ds = tables
                    .get(key)
                    .ok_or_else(|| AnalysisError::MissingKey(key.clone()))?;
                rank(ds, &config.symbol_column, &config.change_column, n)?
            }
            keys => {
                let merged = combine(tables, keys)?;
                rank(&merged, &config.symbol_column, &config.change_column, n)?
            }
        };
        panels.push(Panel {
            title: spec.title.clone(),
            ranking,
        });
    }
    Ok(MarketSummary { panels })
}
