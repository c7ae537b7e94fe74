// src/fetch/mod.rs

//! Page retrieval and table extraction.

pub mod page;
pub mod tables;

use crate::config::{merge_headers, ScraperConfig};
use crate::dataset::TableSet;
use crate::error::FetchError;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use tracing::{info, instrument};

pub use tables::{extract_tables, parse_table};

/// Anything that can produce a fresh `TableSet` on demand.
pub trait TableSource {
    fn fetch_tables(&self) -> Result<TableSet, FetchError>;
}

/// Fetches the quotes page described by a `ScraperConfig`.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    config: ScraperConfig,
}

impl Fetcher {
    pub fn new(config: ScraperConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Use a caller-built client, e.g. one with a timeout or proxy settings.
    pub fn with_client(client: Client, config: ScraperConfig) -> Self {
        Self { client, config }
    }
}

impl TableSource for Fetcher {
    fn fetch_tables(&self) -> Result<TableSet, FetchError> {
        fetch_with(
            &self.client,
            &self.config.url,
            &self.config.request_headers(),
            &self.config,
        )
    }
}

/// Fetch `url` with the default JSE table layout.
///
/// `headers` are sent on top of the browser `User-Agent` default and replace
/// it when they name the same header in any case.
pub fn fetch(url: &str, headers: &BTreeMap<String, String>) -> Result<TableSet, FetchError> {
    let layout = ScraperConfig::default();
    let mut merged = layout.request_headers();
    merge_headers(&mut merged, headers);
    fetch_with(&Client::new(), url, &merged, &layout)
}

/// One GET followed by extraction of every table in `layout`.
#[instrument(level = "info", skip(client, headers, layout))]
pub fn fetch_with(
    client: &Client,
    url: &str,
    headers: &BTreeMap<String, String>,
    layout: &ScraperConfig,
) -> Result<TableSet, FetchError> {
    let html = page::get_text(client, url, headers)?;
    let set = extract_tables(&html, &layout.tables, layout.min_tables)?;
    info!(tables = set.len(), "fetched table set");
    Ok(set)
}
