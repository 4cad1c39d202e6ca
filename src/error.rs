use thiserror::Error;

/// Problems with caller-supplied settings. Fatal: a run never starts with one.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("niche must not be empty")]
    MissingNiche,

    #[error("a search API key is required")]
    MissingApiKey,

    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A single search page call failed. Recoverable: the page contributes no results.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("search provider returned status {0}")]
    Status(u16),

    #[error("could not decode search response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
