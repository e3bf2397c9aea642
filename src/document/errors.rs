//! # Document Store Errors

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type for document store operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document store errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Replacement body is not well-formed JSON. Nothing was written.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The durable write did not complete. The committed document is unchanged.
    #[error("Persistence failure: {message}")]
    PersistenceFailure {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Another store instance holds the lock on this file
    #[error("Document store {path} is locked by another process or store instance")]
    StoreLocked { path: String },

    /// Document file exists but does not parse (strict load only)
    #[error("Corrupt document at {path}: {reason}")]
    CorruptDocument { path: String, reason: String },
}

impl DocumentError {
    pub fn invalid(err: serde_json::Error) -> Self {
        DocumentError::InvalidDocument(err.to_string())
    }

    pub fn persistence(message: impl Into<String>, source: io::Error) -> Self {
        DocumentError::PersistenceFailure {
            message: message.into(),
            source,
        }
    }

    pub fn persistence_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::persistence(format!("{} {}", action, path.display()), source)
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            DocumentError::InvalidDocument(_) => 400,
            DocumentError::PersistenceFailure { .. } => 500,
            DocumentError::StoreLocked { .. } => 500,
            DocumentError::CorruptDocument { .. } => 500,
        }
    }
}
