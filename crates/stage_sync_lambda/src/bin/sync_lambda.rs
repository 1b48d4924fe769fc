use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use redis::AsyncCommands;
use serde_json::Value;
use stage_sync_lambda::adapters::cache::{CacheError, CacheStore};
use stage_sync_lambda::adapters::object_store::{
    get_object_error, head_object_error, last_modified_utc, sdk_error_unavailable, ObjectStore,
    StorageError,
};
use stage_sync_lambda::handlers::sync::run_sync_with_system_clock;
use stage_sync_lambda::runtime::config::SyncConfig;
use stage_sync_lambda::runtime::contract::{ObjectRef, SyncResponse};
use stage_sync_lambda::trigger::describe_trigger;
use tracing_subscriber::EnvFilter;

struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn head_object(&self, object: &ObjectRef) -> Result<DateTime<Utc>, StorageError> {
        let bucket = object.bucket.clone();
        let object_key = object.key.clone();
        let client = self.s3_client.clone();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .head_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
            })
        })
        .map_err(|error| head_object_error(object, &error))?;

        last_modified_utc(object, output.last_modified())
    }

    fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError> {
        let bucket = object.bucket.clone();
        let object_key = object.key.clone();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map_err(|error| get_object_error(object, &error))?;
                output
                    .body
                    .collect()
                    .await
                    .map(|data| data.into_bytes().to_vec())
                    .map_err(|error| {
                        StorageError::unavailable(
                            object,
                            format!("failed to read object body: {error}"),
                        )
                    })
            })
        })
    }

    fn put_object(&self, object: &ObjectRef, body: &[u8]) -> Result<(), StorageError> {
        let bucket = object.bucket.clone();
        let object_key = object.key.clone();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| sdk_error_unavailable(object, &error))
            })
        })
    }
}

struct RedisCacheStore {
    client: redis::Client,
}

impl CacheStore for RedisCacheStore {
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let client = self.client.clone();
        let cache_key = key.to_string();
        let cache_value = value.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut connection = client.get_multiplexed_async_connection().await?;
                connection.set::<_, _, ()>(cache_key, cache_value).await?;
                Ok::<(), redis::RedisError>(())
            })
        })
        .map_err(|error| CacheError::new(key, error.to_string()))
    }
}

struct RuntimeDependencies {
    config: SyncConfig,
    object_store: S3ObjectStore,
    cache: RedisCacheStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<SyncResponse, Error> {
    tracing::info!(
        component = "sync_lambda",
        event = "invocation_received",
        request_id = %event.context.request_id,
        trigger = %describe_trigger(&event.payload),
    );

    let outcome = run_sync_with_system_clock(&deps.config, &deps.object_store, &deps.cache)
        .map_err(Error::from)?;
    Ok(outcome.into_response())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = SyncConfig::from_env()
        .map_err(|error| Error::from(format!("invalid sync configuration: {error}")))?;
    let cache_url =
        std::env::var("CACHE_URL").map_err(|_| Error::from("CACHE_URL must be configured"))?;
    let cache_client = redis::Client::open(cache_url.as_str())
        .map_err(|error| Error::from(format!("invalid CACHE_URL: {error}")))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        object_store: S3ObjectStore {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        cache: RedisCacheStore {
            client: cache_client,
        },
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event| handle_request(event, deps))).await
}
