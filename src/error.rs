// src/error.rs

use thiserror::Error;

/// Broad classification of a failed fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    NetworkFailure,
    StructuralMismatch,
}

/// Everything that can abort a fetch. A fetch never yields a partial `TableSet`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid request header {name:?}")]
    InvalidHeader { name: String },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("page has {found} tables, layout requires at least {required}")]
    TooFewTables { found: usize, required: usize },

    #[error("no table matched {rule} for {key:?}")]
    TableNotFound { key: String, rule: String },

    #[error("invalid CSS selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl { .. }
            | FetchError::InvalidHeader { .. }
            | FetchError::Transport { .. }
            | FetchError::Status { .. } => FetchErrorKind::NetworkFailure,
            FetchError::TooFewTables { .. }
            | FetchError::TableNotFound { .. }
            | FetchError::InvalidSelector { .. } => FetchErrorKind::StructuralMismatch,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisErrorKind {
    MissingColumn,
    MissingKey,
    InvalidCount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("column {0:?} not found in dataset")]
    MissingColumn(String),

    #[error("table {0:?} not found in table set")]
    MissingKey(String),

    #[error("ranking count must be at least 1")]
    InvalidCount,
}

impl AnalysisError {
    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            AnalysisError::MissingColumn(_) => AnalysisErrorKind::MissingColumn,
            AnalysisError::MissingKey(_) => AnalysisErrorKind::MissingKey,
            AnalysisError::InvalidCount => AnalysisErrorKind::InvalidCount,
        }
    }
}
