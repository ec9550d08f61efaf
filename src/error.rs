//! Error types for depthcharge.
//!
//! Only [`DepthChargeError`] is fatal to a traversal. Edge source and cache
//! write failures are absorbed by the engine and surfaced as
//! [`Diagnostic`](crate::report::Diagnostic) records instead.

use thiserror::Error;

/// Fatal errors returned to the caller of a traversal or CLI command.
#[derive(Debug, Error)]
pub enum DepthChargeError {
    /// The adjacency cache could not be opened or read.
    #[error("storage unavailable: {0}")]
    Storage(#[from] CacheError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("worker pool error: {0}")]
    ThreadPool(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DepthChargeError>;

/// Why an edge source could not produce an edge set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-success HTTP status.
    #[error("request failed with HTTP status {0}")]
    Status(u16),

    /// Connection, TLS or timeout failure before a status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with an `error` object.
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    /// The body was not the JSON shape we expect.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("fetch cancelled")]
    Cancelled,
}

/// Failures inside an adjacency cache implementation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt cache entry for {page}: {reason}")]
    Corrupt { page: String, reason: String },

    #[error("{field} too long for {page}: {len} > {max}")]
    TooLong {
        page: String,
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The backing store cannot be reached at all.
    #[error("{0}")]
    Unavailable(String),
}
