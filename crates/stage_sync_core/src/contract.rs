use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;

use crate::error::{ConfigError, SyncError};

pub const SUCCESS_STATUS_CODE: u16 = 200;

/// A `(bucket, key)` pair addressing one blob in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// How the "updated" flag in the cache record is derived.
///
/// `ReflectCopy` records `true` only when production was overwritten during
/// the run. `AlwaysTrue` records `true` on every successful run, matching the
/// historical deployment of this task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatedFlagPolicy {
    #[default]
    ReflectCopy,
    AlwaysTrue,
}

impl UpdatedFlagPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReflectCopy => "reflect_copy",
            Self::AlwaysTrue => "always_true",
        }
    }

    pub fn flag(self, prod_updated: bool) -> bool {
        match self {
            Self::ReflectCopy => prod_updated,
            Self::AlwaysTrue => true,
        }
    }
}

impl FromStr for UpdatedFlagPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reflect_copy" => Ok(Self::ReflectCopy),
            "always_true" => Ok(Self::AlwaysTrue),
            other => Err(ConfigError::InvalidValue {
                name: "UPDATED_FLAG_POLICY",
                value: other.to_string(),
                expected: "reflect_copy or always_true",
            }),
        }
    }
}

/// Invocation marker stored under the fixed cache key.
///
/// Encodes as a single-member JSON object mapping the RFC 3339 invocation
/// time (UTC, microsecond precision) to the updated flag, spaced as
/// `{"<timestamp>": <flag>}` so existing readers of the key see the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub invoked_at: DateTime<Utc>,
    pub updated: bool,
}

impl CacheRecord {
    pub fn new(invoked_at: DateTime<Utc>, updated: bool) -> Self {
        Self {
            invoked_at: invoked_at.trunc_subsecs(6),
            updated,
        }
    }

    pub fn timestamp_key(&self) -> String {
        self.invoked_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        let key = serde_json::to_string(&self.timestamp_key())?;
        Ok(format!("{{{key}: {}}}", self.updated))
    }

    pub fn from_json(value: &str) -> Result<Self, SyncError> {
        let entry: BTreeMap<String, bool> = serde_json::from_str(value)?;
        if entry.len() != 1 {
            return Err(SyncError::MalformedRecord(format!(
                "expected exactly one entry, found {}",
                entry.len()
            )));
        }
        let (timestamp, updated) = entry
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::MalformedRecord("record is empty".to_string()))?;
        let invoked_at = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|error| {
                SyncError::MalformedRecord(format!("invalid timestamp `{timestamp}`: {error}"))
            })?
            .with_timezone(&Utc);
        Ok(Self::new(invoked_at, updated))
    }
}

/// Result of one completed sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub staging_last_modified: DateTime<Utc>,
    pub prod_last_modified: DateTime<Utc>,
    /// Whether production content was overwritten during this run.
    pub prod_updated: bool,
    pub record: CacheRecord,
}

impl SyncOutcome {
    pub fn message(&self) -> String {
        format!("Prod updated: {}", self.record.updated)
    }

    pub fn into_response(self) -> SyncResponse {
        SyncResponse {
            status_code: SUCCESS_STATUS_CODE,
            body: self.message(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}
