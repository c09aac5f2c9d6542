//! Error types for links_db

use thiserror::Error;

/// Result type alias for links_db operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in links_db operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend tool could not be invoked at all. Fatal, never retried.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend ran but reported a fault for this invocation. Carries
    /// the backend's diagnostic text; distinguishable from "zero rows",
    /// which is an empty, successful output.
    #[error("Backend query failed: {0}")]
    BackendQueryFailed(String),

    /// The backend succeeded but its output did not contain a link where
    /// one was required.
    #[error("Failed to parse backend output: {0}")]
    ParseFailure(String),

    /// A logical miss where the caller requires existence. Plain absence
    /// on reads is `None`, not this error.
    #[error("Not found: {0}")]
    NotFound(String),
}
