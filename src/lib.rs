pub mod cli;
pub mod config;
pub mod dedupe;
pub mod delay_manager;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod logger;
pub mod pipeline;
pub mod query_builder;
pub mod report;
pub mod scraper;
pub mod search_engine;

#[cfg(test)]
mod test_server;

// Exporting types for convenience
pub use config::RunConfig;
pub use error::{ConfigError, ReportError, SearchError};
pub use extractor::Extractor;
pub use filter::{extract_domain, FilterChain, FilterConfig};
pub use pipeline::{CancelToken, Phase, Pipeline, ProgressEvent, RunReport};
pub use report::{ColumnSelection, Report};
pub use scraper::{HttpFetcher, PageFetch, PageFetcher, ProspectRecord, ScrapeStatus, SignalExtractor};
pub use search_engine::{SearchProvider, SearchResult, SerpApiSearch};
