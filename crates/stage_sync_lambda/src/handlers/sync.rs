use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::adapters::cache::CacheStore;
use crate::adapters::object_store::ObjectStore;
use crate::runtime::config::SyncConfig;
use crate::runtime::contract::{CacheRecord, SyncOutcome};
use crate::runtime::decision::{decide_promotion, Promotion};
use crate::runtime::error::{StorageOperation, SyncError};

const COMPONENT: &str = "sync_task";

/// Runs one staging-to-production sync.
///
/// Heads both objects, overwrites production with staging content when
/// staging is strictly newer, then writes the invocation record to the cache.
/// The cache write happens on every run that gets past the storage steps; a
/// failed cache write does not undo an earlier copy.
pub fn run_sync(
    config: &SyncConfig,
    object_store: &impl ObjectStore,
    cache: &impl CacheStore,
    clock: impl FnOnce() -> DateTime<Utc>,
) -> Result<SyncOutcome, SyncError> {
    let started_at = Instant::now();
    info!(
        component = COMPONENT,
        event = "sync_started",
        staging = %config.staging(),
        prod = %config.prod(),
        cache_key = %config.cache_key,
        updated_flag = config.updated_flag.as_str(),
    );

    match sync_and_record(config, object_store, cache, clock) {
        Ok(outcome) => {
            info!(
                component = COMPONENT,
                event = "sync_completed",
                prod_updated = outcome.prod_updated,
                recorded_flag = outcome.record.updated,
                duration_ms = started_at.elapsed().as_millis() as u64,
            );
            Ok(outcome)
        }
        Err(sync_error) => {
            error!(
                component = COMPONENT,
                event = "sync_failed",
                kind = sync_error.kind(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                error = %sync_error,
            );
            Err(sync_error)
        }
    }
}

pub fn run_sync_with_system_clock(
    config: &SyncConfig,
    object_store: &impl ObjectStore,
    cache: &impl CacheStore,
) -> Result<SyncOutcome, SyncError> {
    run_sync(config, object_store, cache, Utc::now)
}

fn sync_and_record(
    config: &SyncConfig,
    object_store: &impl ObjectStore,
    cache: &impl CacheStore,
    clock: impl FnOnce() -> DateTime<Utc>,
) -> Result<SyncOutcome, SyncError> {
    let staging = config.staging();
    let prod = config.prod();

    let staging_last_modified = object_store
        .head_object(&staging)
        .map_err(|error| error.into_sync_error(StorageOperation::Head))?;
    let prod_last_modified = object_store
        .head_object(&prod)
        .map_err(|error| error.into_sync_error(StorageOperation::Head))?;

    let promotion = decide_promotion(staging_last_modified, prod_last_modified);
    info!(
        component = COMPONENT,
        event = "timestamps_compared",
        staging_last_modified = %staging_last_modified.to_rfc3339(),
        prod_last_modified = %prod_last_modified.to_rfc3339(),
        decision = promotion.as_str(),
    );

    let prod_updated = match promotion {
        Promotion::Copy => {
            let body = object_store
                .get_object(&staging)
                .map_err(|error| error.into_sync_error(StorageOperation::Get))?;
            object_store
                .put_object(&prod, &body)
                .map_err(|error| error.into_sync_error(StorageOperation::Put))?;
            info!(
                component = COMPONENT,
                event = "prod_overwritten",
                prod = %prod,
                bytes = body.len() as u64,
            );
            true
        }
        Promotion::Skip => false,
    };

    let record = CacheRecord::new(clock(), config.updated_flag.flag(prod_updated));
    let value = record.to_json()?;
    cache
        .set(&config.cache_key, &value)
        .map_err(|error| SyncError::CacheUnavailable {
            key: config.cache_key.clone(),
            prod_updated,
            message: error.message,
        })?;
    info!(
        component = COMPONENT,
        event = "cache_record_written",
        cache_key = %config.cache_key,
        value = %value,
    );

    Ok(SyncOutcome {
        staging_last_modified,
        prod_last_modified,
        prod_updated,
        record,
    })
}
