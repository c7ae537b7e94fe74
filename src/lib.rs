pub mod analyze;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod fetch;
pub mod report;
pub mod session;

pub use analyze::{combine, rank, Mover, MoverRanking};
pub use config::ScraperConfig;
pub use dataset::{Cell, Dataset, TableSet};
pub use error::{AnalysisError, AnalysisErrorKind, FetchError, FetchErrorKind};
pub use fetch::{fetch, Fetcher, TableSource};
pub use session::{MarketSummary, Session, TopN};
