//! Error types for tapreel-cache

use thiserror::Error;

/// Main error type for tapreel-cache
#[derive(Error, Debug)]
pub enum Error {
    /// The network could not deliver a response at all
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The network answered with a non-success status
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    /// One asset failed, so the whole generation was left unpopulated
    #[error("Install of {cache} aborted: {source}")]
    Install {
        cache: String,
        #[source]
        source: Box<Error>,
    },
}

/// Convenience Result type using tapreel-cache Error
pub type Result<T> = std::result::Result<T, Error>;
