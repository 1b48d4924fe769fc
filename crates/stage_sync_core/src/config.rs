use crate::contract::{ObjectRef, UpdatedFlagPolicy};
use crate::error::ConfigError;

pub const DEFAULT_STAGING_BUCKET: &str = "kanchan96-staging-bucket";
pub const DEFAULT_PROD_BUCKET: &str = "kanchan96-prod-bucket";
pub const DEFAULT_STAGING_KEY: &str = "index.html";
pub const DEFAULT_PROD_KEY: &str = "index.html";
pub const DEFAULT_CACHE_KEY: &str = "my_key";

/// Fixed identifiers for one deployment of the sync task.
///
/// Built once per process and passed into every run; nothing here varies per
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub staging_bucket: String,
    pub prod_bucket: String,
    pub staging_key: String,
    pub prod_key: String,
    pub cache_key: String,
    pub updated_flag: UpdatedFlagPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staging_bucket: DEFAULT_STAGING_BUCKET.to_string(),
            prod_bucket: DEFAULT_PROD_BUCKET.to_string(),
            staging_key: DEFAULT_STAGING_KEY.to_string(),
            prod_key: DEFAULT_PROD_KEY.to_string(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            updated_flag: UpdatedFlagPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn staging(&self) -> ObjectRef {
        ObjectRef::new(&self.staging_bucket, &self.staging_key)
    }

    pub fn prod(&self) -> ObjectRef {
        ObjectRef::new(&self.prod_bucket, &self.prod_key)
    }

    /// Reads overrides through `lookup` (normally `std::env::var(..).ok()`),
    /// falling back to the default deployment identifiers.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let updated_flag = match lookup("UPDATED_FLAG_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.updated_flag,
        };

        Ok(Self {
            staging_bucket: read_identifier(&lookup, "STAGING_BUCKET", defaults.staging_bucket)?,
            prod_bucket: read_identifier(&lookup, "PROD_BUCKET", defaults.prod_bucket)?,
            staging_key: read_identifier(&lookup, "STAGING_KEY", defaults.staging_key)?,
            prod_key: read_identifier(&lookup, "PROD_KEY", defaults.prod_key)?,
            cache_key: read_identifier(&lookup, "CACHE_KEY", defaults.cache_key)?,
            updated_flag,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

fn read_identifier(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: String,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Blank { name }),
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(default),
    }
}
