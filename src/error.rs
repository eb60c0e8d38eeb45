//! Error types for rss-sum.

use thiserror::Error;

/// Common error type for rss-sum.
#[derive(Error, Debug)]
pub enum RssSumError {
    /// Configuration error. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A feed could not be fetched after all retry attempts.
    #[error("failed to fetch feed {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Previously stored posts for a feed could not be loaded.
    #[error("failed to load existing posts for feed {url}: {reason}")]
    DedupLoad { url: String, reason: String },

    /// A single post could not be summarized after all retry attempts.
    #[error("failed to summarize post {source_url}: {reason}")]
    Summarize { source_url: String, reason: String },

    /// The summarized batch of a feed could not be saved.
    #[error("failed to save posts for feed {url}: {reason}")]
    Persist { url: String, reason: String },

    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// RSS feed error.
    #[error("RSS error: {0}")]
    Rss(String),

    /// Summarization service error.
    #[error("assistant error: {0}")]
    Assistant(String),

    /// The cycle deadline elapsed while an operation was in flight.
    #[error("{0} timed out")]
    Timeout(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for RssSumError {
    fn from(e: sqlx::Error) -> Self {
        RssSumError::Database(e.to_string())
    }
}

/// Result type alias for rss-sum operations.
pub type Result<T> = std::result::Result<T, RssSumError>;
