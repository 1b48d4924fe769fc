//! Error taxonomy for the sync task.

use std::fmt;

use thiserror::Error;

use crate::contract::ObjectRef;

/// Storage call that failed, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    Head,
    Get,
    Put,
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Head => "head",
            Self::Get => "get",
            Self::Put => "put",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Staging or production object does not exist.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectRef),

    /// Transient object storage failure.
    #[error("storage service unavailable during {operation} of {object}: {message}")]
    ServiceUnavailable {
        operation: StorageOperation,
        object: ObjectRef,
        message: String,
    },

    /// Transient cache failure. `prod_updated` reports whether production had
    /// already been overwritten when the cache write failed; the copy is not
    /// undone.
    #[error("cache unavailable writing `{key}` (prod updated: {prod_updated}): {message}")]
    CacheUnavailable {
        key: String,
        prod_updated: bool,
        message: String,
    },

    #[error("failed to encode cache record: {0}")]
    RecordEncoding(#[from] serde_json::Error),

    #[error("malformed cache record: {0}")]
    MalformedRecord(String),
}

impl SyncError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ObjectNotFound(_) => "object_not_found",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::CacheUnavailable { .. } => "cache_unavailable",
            Self::RecordEncoding(_) | Self::MalformedRecord(_) => "record_encoding",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must not be blank")]
    Blank { name: &'static str },

    #[error("invalid {name} value `{value}`; expected {expected}")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}
