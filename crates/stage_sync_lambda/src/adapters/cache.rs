use thiserror::Error;

/// Key-value cache that only needs overwriting `set`.
pub trait CacheStore {
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Error)]
#[error("cache set for `{key}` failed: {message}")]
pub struct CacheError {
    pub key: String,
    pub message: String,
}

impl CacheError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}
