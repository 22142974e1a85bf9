// Error types for buildstats.
// Covers upstream API errors, store errors, and payload corruption.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("upstream API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("missing BUILDKITE_API_TOKEN environment variable")]
    MissingToken,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The store returned bytes it claims are valid but they fail to
    /// decompress or deserialize. Unrecoverable; never retried.
    #[error("corrupt cache chunk: {reason}")]
    CorruptChunk { reason: String },

    /// A wire record for a passed build is missing one of its timestamps.
    #[error("build {id} is missing its {field} timestamp")]
    MissingTimestamp { id: String, field: &'static str },

    #[error("{} interval fetch(es) failed: {}", .0.len(),
        .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Fanout(Vec<Error>),

    #[error("invalid report definition: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    Other(String),
}

/// Transport-level failure talking to the chunk store. A miss is not an
/// error; stores report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
