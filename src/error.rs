//! Error types shared across the crate.

use thiserror::Error;

/// Convenience alias used by every fallible snapcache operation.
pub type Result<T> = std::result::Result<T, SnapError>;

/// Errors surfaced by configuration, store, and inspection operations.
///
/// [`Recorder::snapshot`](crate::Recorder::snapshot) never returns
/// `SnapError`: store faults are absorbed into miss/skip outcomes there,
/// and only the wrapped call's own error crosses that boundary.
#[derive(Error, Debug)]
pub enum SnapError {
    /// Invalid mode, sync scope, or endpoint configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure in the local fixture store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fixture file exists but is not a valid fixture document.
    #[error("Invalid fixture: {0}")]
    Fixture(String),

    /// Remote store transport or protocol failure.
    #[error("Remote store error: {0}")]
    Remote(String),
}
