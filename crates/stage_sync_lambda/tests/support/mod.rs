#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use stage_sync_lambda::adapters::cache::{CacheError, CacheStore};
use stage_sync_lambda::adapters::object_store::{ObjectStore, StorageError};
use stage_sync_lambda::runtime::config::SyncConfig;
use stage_sync_lambda::runtime::contract::{ObjectRef, UpdatedFlagPolicy};
use stage_sync_lambda::runtime::error::StorageOperation;

pub fn timestamp(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn sync_config(updated_flag: UpdatedFlagPolicy) -> SyncConfig {
    SyncConfig {
        staging_bucket: "site-staging".to_string(),
        prod_bucket: "site-prod".to_string(),
        staging_key: "index.html".to_string(),
        prod_key: "index.html".to_string(),
        cache_key: "my_key".to_string(),
        updated_flag,
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Object store that stamps every put with the current wall clock, the way
/// S3 refreshes `LastModified` on overwrite.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<ObjectRef, StoredObject>>,
    unavailable: Mutex<Vec<(StorageOperation, ObjectRef)>>,
    calls: Mutex<Vec<(StorageOperation, ObjectRef)>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, object: &ObjectRef, body: &[u8], last_modified: DateTime<Utc>) {
        self.objects.lock().expect("poisoned mutex").insert(
            object.clone(),
            StoredObject {
                body: body.to_vec(),
                last_modified,
            },
        );
    }

    pub fn fail_on(&self, operation: StorageOperation, object: &ObjectRef) {
        self.unavailable
            .lock()
            .expect("poisoned mutex")
            .push((operation, object.clone()));
    }

    pub fn body(&self, object: &ObjectRef) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(object)
            .map(|stored| stored.body.clone())
    }

    pub fn last_modified(&self, object: &ObjectRef) -> Option<DateTime<Utc>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(object)
            .map(|stored| stored.last_modified)
    }

    pub fn calls(&self, operation: StorageOperation) -> Vec<ObjectRef> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|(recorded, _)| *recorded == operation)
            .map(|(_, object)| object.clone())
            .collect()
    }

    fn enter(&self, operation: StorageOperation, object: &ObjectRef) -> Result<(), StorageError> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((operation, object.clone()));
        let failing = self
            .unavailable
            .lock()
            .expect("poisoned mutex")
            .iter()
            .any(|(recorded, target)| *recorded == operation && target == object);
        if failing {
            Err(StorageError::unavailable(object, "503 Slow Down"))
        } else {
            Ok(())
        }
    }

    fn stored(&self, object: &ObjectRef) -> Result<StoredObject, StorageError> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(object)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                object: object.clone(),
            })
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn head_object(&self, object: &ObjectRef) -> Result<DateTime<Utc>, StorageError> {
        self.enter(StorageOperation::Head, object)?;
        Ok(self.stored(object)?.last_modified)
    }

    fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError> {
        self.enter(StorageOperation::Get, object)?;
        Ok(self.stored(object)?.body)
    }

    fn put_object(&self, object: &ObjectRef, body: &[u8]) -> Result<(), StorageError> {
        self.enter(StorageOperation::Put, object)?;
        self.insert(object, body, Utc::now());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCache {
    entries: Mutex<BTreeMap<String, String>>,
    unavailable: bool,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            unavailable: true,
        }
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), value.to_string());
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().expect("poisoned mutex").clone()
    }
}

impl CacheStore for RecordingCache {
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        if self.unavailable {
            return Err(CacheError::new(key, "connection refused"));
        }
        self.entries
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
