use std::fmt::Debug;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::DateTime as S3DateTime;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::runtime::contract::ObjectRef;
use crate::runtime::error::{StorageOperation, SyncError};

/// S3 answers 403 instead of 404 for a missing key when the caller lacks
/// `s3:ListBucket` on the bucket.
const ACCESS_DENIED_HINT: &str =
    "access denied; a missing key also returns 403 when the role lacks s3:ListBucket";

/// Blob storage addressed by [`ObjectRef`], with last-modified metadata.
pub trait ObjectStore {
    /// Returns the last-modified time without fetching content.
    fn head_object(&self, object: &ObjectRef) -> Result<DateTime<Utc>, StorageError>;
    fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError>;
    /// Replaces any existing content at `object`.
    fn put_object(&self, object: &ObjectRef, body: &[u8]) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{object} does not exist")]
    NotFound { object: ObjectRef },

    /// Any other failure. A 403 on a missing key also ends up here; the
    /// message then carries the service error code and an access hint.
    #[error("{object}: {message}")]
    Unavailable { object: ObjectRef, message: String },
}

impl StorageError {
    pub fn unavailable(object: &ObjectRef, message: impl Into<String>) -> Self {
        Self::Unavailable {
            object: object.clone(),
            message: message.into(),
        }
    }

    pub fn into_sync_error(self, operation: StorageOperation) -> SyncError {
        match self {
            Self::NotFound { object } => SyncError::ObjectNotFound(object),
            Self::Unavailable { object, message } => SyncError::ServiceUnavailable {
                operation,
                object,
                message,
            },
        }
    }
}

pub fn head_object_error<R: Debug>(
    object: &ObjectRef,
    error: &SdkError<HeadObjectError, R>,
) -> StorageError {
    let not_found = error
        .as_service_error()
        .is_some_and(HeadObjectError::is_not_found);
    classify_sdk_error(object, not_found, error)
}

pub fn get_object_error<R: Debug>(
    object: &ObjectRef,
    error: &SdkError<GetObjectError, R>,
) -> StorageError {
    let not_found = error
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key);
    classify_sdk_error(object, not_found, error)
}

/// For operations where no service error means "missing", such as `PutObject`.
pub fn sdk_error_unavailable<E, R>(object: &ObjectRef, error: &SdkError<E, R>) -> StorageError
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
    R: Debug,
{
    classify_sdk_error(object, false, error)
}

fn classify_sdk_error<E, R>(
    object: &ObjectRef,
    not_found: bool,
    error: &SdkError<E, R>,
) -> StorageError
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
    R: Debug,
{
    if not_found {
        return StorageError::NotFound {
            object: object.clone(),
        };
    }

    let context = DisplayErrorContext(error);
    let message = match error.as_service_error().and_then(ProvideErrorMetadata::code) {
        Some(code @ ("AccessDenied" | "Forbidden")) => {
            format!("{code}: {ACCESS_DENIED_HINT}: {context}")
        }
        Some(code) => format!("{code}: {context}"),
        None => context.to_string(),
    };
    StorageError::unavailable(object, message)
}

/// Converts the `LastModified` header of a head response to UTC.
pub fn last_modified_utc(
    object: &ObjectRef,
    last_modified: Option<&S3DateTime>,
) -> Result<DateTime<Utc>, StorageError> {
    let Some(last_modified) = last_modified else {
        return Err(StorageError::unavailable(
            object,
            "head response has no LastModified",
        ));
    };
    DateTime::<Utc>::from_timestamp(last_modified.secs(), last_modified.subsec_nanos())
        .ok_or_else(|| {
            StorageError::unavailable(
                object,
                format!("LastModified out of range: {last_modified:?}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::types::error::{NoSuchKey, NotFound};
    use chrono::TimeZone;

    use super::*;

    fn object() -> ObjectRef {
        ObjectRef::new("staging", "index.html")
    }

    fn access_denied() -> ErrorMetadata {
        ErrorMetadata::builder()
            .code("AccessDenied")
            .message("Access Denied")
            .build()
    }

    #[test]
    fn not_found_maps_to_object_not_found() {
        let error = StorageError::NotFound { object: object() };

        let sync_error = error.into_sync_error(StorageOperation::Head);
        assert!(matches!(
            sync_error,
            SyncError::ObjectNotFound(missing) if missing == object()
        ));
    }

    #[test]
    fn unavailable_keeps_operation_context() {
        let object = ObjectRef::new("prod", "index.html");
        let error = StorageError::unavailable(&object, "slow down");

        let sync_error = error.into_sync_error(StorageOperation::Put);
        assert_eq!(sync_error.kind(), "service_unavailable");
        assert_eq!(
            sync_error.to_string(),
            "storage service unavailable during put of s3://prod/index.html: slow down"
        );
    }

    #[test]
    fn head_not_found_is_object_not_found() {
        let service_error = HeadObjectError::NotFound(NotFound::builder().build());
        let error: SdkError<HeadObjectError, ()> = SdkError::service_error(service_error, ());

        let mapped = head_object_error(&object(), &error);
        assert!(matches!(
            mapped,
            StorageError::NotFound { object: missing } if missing == object()
        ));
    }

    #[test]
    fn get_no_such_key_is_object_not_found() {
        let service_error = GetObjectError::NoSuchKey(NoSuchKey::builder().build());
        let error: SdkError<GetObjectError, ()> = SdkError::service_error(service_error, ());

        let mapped = get_object_error(&object(), &error);
        assert!(matches!(mapped, StorageError::NotFound { .. }));
    }

    #[test]
    fn head_access_denied_is_unavailable_with_hint() {
        let service_error = HeadObjectError::generic(access_denied());
        let error: SdkError<HeadObjectError, ()> = SdkError::service_error(service_error, ());

        let mapped = head_object_error(&object(), &error);
        let StorageError::Unavailable { message, .. } = &mapped else {
            panic!("unexpected error: {mapped}");
        };
        assert!(message.starts_with("AccessDenied: "), "{message}");
        assert!(message.contains("s3:ListBucket"), "{message}");
        assert!(mapped.to_string().starts_with("s3://staging/index.html: "));
    }

    #[test]
    fn get_access_denied_is_not_object_not_found() {
        let service_error = GetObjectError::generic(access_denied());
        let error: SdkError<GetObjectError, ()> = SdkError::service_error(service_error, ());

        let mapped = get_object_error(&object(), &error);
        assert!(matches!(mapped, StorageError::Unavailable { .. }));
    }

    #[test]
    fn timeout_is_unavailable() {
        let error: SdkError<HeadObjectError, ()> = SdkError::timeout_error("read timed out");

        let mapped = head_object_error(&object(), &error);
        assert!(matches!(mapped, StorageError::Unavailable { .. }));
    }

    #[test]
    fn last_modified_converts_to_utc() {
        let header = S3DateTime::from_secs_and_nanos(1_704_153_600, 500_000_000);
        let expected = Utc
            .timestamp_opt(1_704_153_600, 500_000_000)
            .single()
            .expect("valid timestamp");

        let converted = last_modified_utc(&object(), Some(&header)).expect("in range");
        assert_eq!(converted, expected);
    }

    #[test]
    fn missing_last_modified_is_unavailable() {
        let error = last_modified_utc(&object(), None).expect_err("missing header should fail");

        assert!(error.to_string().contains("no LastModified"));
    }

    #[test]
    fn out_of_range_last_modified_is_unavailable() {
        let header = S3DateTime::from_secs(i64::MAX);

        let error = last_modified_utc(&object(), Some(&header)).expect_err("out of range");
        assert!(error.to_string().contains("out of range"));
    }
}
