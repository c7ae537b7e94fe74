// src/fetch/page.rs

use crate::error::FetchError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || FetchError::InvalidHeader { name: name.clone() };
        let key = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let val = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(key, val);
    }
    Ok(map)
}

/// One GET, no retries. Any transport problem or non-2xx status is an error.
pub fn get_text(
    client: &Client,
    url: &str,
    headers: &BTreeMap<String, String>,
) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    debug!("Fetching text from {}", parsed);
    let resp = client
        .get(parsed.as_str())
        .headers(header_map(headers)?)
        .send()
        .map_err(transport)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = resp.text().map_err(transport)?;
    debug!(%url, bytes = body.len(), "Fetched page");
    Ok(body)
}
