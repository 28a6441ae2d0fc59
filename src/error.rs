//! Typed errors for the ingestion pipeline.
//!
//! None of these escape an adapter or the pipeline: each is recovered at the
//! level where it occurs and logged. Only unexpected failures travel upward as
//! `anyhow::Error`.

use thiserror::Error;

/// Failure to obtain a document from a housing site
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out waiting for {what} on {url}")]
    Timeout { url: String, what: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("browser session failed: {0:#}")]
    Browser(anyhow::Error),

    #[error("fetcher does not support {0}")]
    Unsupported(String),

    #[error("fetch task aborted: {0}")]
    Task(String),
}

/// A listing fragment that could not be turned into a listing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("fragment has no {0}")]
    MissingField(&'static str),

    #[error("invalid link {href:?}: {reason}")]
    InvalidLink { href: String, reason: String },
}

/// Dedup store unreachable or corrupt
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not open store at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("could not prepare store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("listing {id} has unreadable added_at {value:?}")]
    Timestamp { id: String, value: String },
}

/// Delivery channel unreachable or rejecting the message
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("notification channel returned status {0}")]
    Status(u16),
}
