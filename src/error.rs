//! Error types for the storage engine.

use crate::types::{PageId, RecordId};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the storage engine
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attempted to create a file that already exists
    #[error("file {0:?} already exists")]
    AlreadyExists(PathBuf),

    /// The named storage file does not exist
    #[error("file {0:?} not found")]
    FileNotFound(PathBuf),

    /// Page number is outside the file's current page range
    #[error("page {page} out of range (file has {page_count} pages)")]
    PageOutOfRange { page: PageId, page_count: u32 },

    /// No slot exists for the given record ID
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    /// The record was deleted (slot is a tombstone)
    #[error("record {0} is deleted")]
    RecordDeleted(RecordId),

    /// Forwarding chain is cyclic or points outside the file
    #[error("corrupt forwarding chain for record {0}")]
    CorruptForward(RecordId),

    /// A single record exceeds the maximum page payload
    #[error("record of {needed} bytes exceeds max page payload of {max} bytes")]
    NoSpace { needed: usize, max: usize },

    /// Attribute name is not part of the record descriptor
    #[error("unknown attribute {0:?}")]
    UnknownAttribute(String),

    /// Invalid operation for the current state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl StorageError {
    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
