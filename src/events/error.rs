//! Event store error types

use thiserror::Error;

/// Errors that can occur in the event store
#[derive(Error, Debug)]
pub enum EventError {
    /// A mutation violated a validation rule; nothing was changed
    #[error("validation error: {0}")]
    Validation(String),

    /// No event with the given id exists
    #[error("event not found: {0}")]
    NotFound(String),

    /// Snapshot I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization/deserialization failed
    #[error("snapshot error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store lock was poisoned by a panicking writer
    #[error("event store lock poisoned")]
    Lock,
}

/// Result type alias for event store operations
pub type EventResult<T> = Result<T, EventError>;
