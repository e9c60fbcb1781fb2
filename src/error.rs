// src/error.rs

use thiserror::Error;

/// Why a single GET did not yield a page body.
#[derive(Debug, Error)]
pub enum FetchCause {
    /// Connection, TLS, timeout or body-read failure.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("non-success status {0}")]
    Status(u16),

    /// A discovered link that cannot be resolved against the base URL.
    #[error("unresolvable link: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Error)]
#[error("fetching {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("no data table: {reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("column '{0}' not found in header")]
    MissingColumn(String),

    #[error("row {row} has {len} cells, column '{column}' is at index {index}")]
    ShortRow {
        row: usize,
        len: usize,
        column: String,
        index: usize,
    },

    #[error("row {row}: '{text}' in column '{column}' is not an integer")]
    InvalidValue {
        row: usize,
        column: String,
        text: String,
        #[source]
        error: std::num::ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook {path}: {message}")]
    Workbook { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Landing page unreachable; nothing can be discovered.
    #[error("landing page unavailable: {0}")]
    Discovery(#[source] FetchError),

    #[error("collection did not finish within {0:?}")]
    Timeout(std::time::Duration),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("aggregation aborted: {0}")]
    Aggregate(#[from] AggregateError),
}
