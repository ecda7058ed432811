//! Error types for the index queue.
//!
//! All fallible operations in this crate return [`IndexQueueError`]. Per-target
//! failures that happen while a flush is being applied are not returned as
//! errors; they are collected in a
//! [`DispatchReport`](crate::dispatch::DispatchReport) and each entry carries
//! one of these values.
//!
//! # Examples
//!
//! ```
//! use index_queue::error::{IndexQueueError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(IndexQueueError::engine("catalog is read-only"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for index queue operations.
#[derive(Error, Debug)]
pub enum IndexQueueError {
    /// I/O errors (config and script files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A queued target could not be resolved to a live object at drain time.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// The index engine rejected or failed an operation.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Internal consistency fault, e.g. two live records for one target.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A commit was refused because the flush reported per-target failures.
    #[error("Dispatch failed for {failed} of {attempted} operations")]
    DispatchFailed { failed: usize, attempted: usize },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument (CLI operation syntax, script steps, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Errors raised by user-supplied engines or stores.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with IndexQueueError.
pub type Result<T> = std::result::Result<T, IndexQueueError>;

impl IndexQueueError {
    /// Create a new resolution error.
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        IndexQueueError::Resolution(msg.into())
    }

    /// Create a new engine error.
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        IndexQueueError::Engine(msg.into())
    }

    /// Create a new invariant violation.
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        IndexQueueError::InvariantViolation(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        IndexQueueError::Config(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        IndexQueueError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        IndexQueueError::Other(msg.into())
    }

    /// Whether this error is a per-target failure that a flush records and
    /// moves past, rather than a fault that stops the batch.
    pub fn is_per_target(&self) -> bool {
        !matches!(self, IndexQueueError::InvariantViolation(_))
    }
}
