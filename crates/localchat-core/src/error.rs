//! Core domain errors.

use thiserror::Error;

/// Errors raised by the persistence adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform store rejected a read or write.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A persisted record exists but cannot be decoded.
    #[error("stored record '{key}' is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Imported text is not a valid conversation list.
    #[error("Invalid JSON format: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by the chat session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A request is still in flight; only one may run at a time.
    #[error("a request is already in progress")]
    Busy,

    /// Message content is empty after trimming.
    #[error("message is empty")]
    EmptyMessage,
}

/// Top-level error for front ends that drive the core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Conversation not found.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
