//! Domain error types
//!
//! These errors represent business logic failures, distinct from infrastructure errors.
//! Using thiserror for ergonomic error handling with proper Display implementations.

use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised by the artifact and chat stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named record does not exist (any more)
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A recency rank outside `1..=count` was requested
    #[error("Invalid number {requested}. There are {count} items.")]
    OutOfRange { requested: usize, count: usize },

    /// Saving a chat with no messages
    #[error("The chat is empty")]
    EmptyChat,

    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record exists but could not be decoded
    #[error("Corrupt record {name}: {reason}")]
    Parse { name: String, reason: String },
}

impl StoreError {
    /// Conditions spoken to the user rather than treated as backend failures
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::OutOfRange { .. } | StoreError::EmptyChat
        )
    }
}

/// Errors raised while handling a single marker
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The clipboard did not carry the expected record number
    #[error("Expected a number on the clipboard, found {0:?}")]
    InvalidNumber(String),

    /// Clipboard could not be read or written
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Provider failure, never retried automatically
    #[error(transparent)]
    Provider(#[from] LlmError),

    /// A handler unwound instead of returning
    #[error("Handler panicked: {0}")]
    HandlerPanic(String),
}
