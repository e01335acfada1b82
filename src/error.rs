//! Error types for the mention feature library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for this library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while detecting and scoring mentions
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration, reported before any processing starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// The language model could not be loaded. Never retried.
    #[error("Failed to load language model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// A delimiter leaked into entity, expression or mention text
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// An answer is missing from a caller-supplied label map
    #[error("Unknown answer class: {0}")]
    UnknownClass(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset JSON could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
