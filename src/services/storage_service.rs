//! src/services/storage_service.rs
//!
//! ObjectStore — the seam between the HTTP handlers and the cloud object
//! store. Three pass-through operations (write object, sign a read URL,
//! list the bucket) with no retry, no backoff, and no circuit breaking;
//! the backend owns durability and consistency. `S3ObjectStore` is the
//! production implementation over the AWS SDK.

use crate::{config::AppConfig, models::object::ObjectSummary};
use async_trait::async_trait;
use aws_sdk_s3::{Client, config::Region, presigning::PresigningConfig, primitives::ByteStream};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::debug;

/// Expiry applied to every signed download URL, in seconds.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write object `{key}`: {message}")]
    Put { key: String, message: String },
    #[error("failed to sign download URL for `{key}`: {message}")]
    Presign { key: String, message: String },
    #[error("failed to list bucket contents: {0}")]
    List(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Backend operations the handlers depend on.
///
/// Kept minimal on purpose: the gateway carries no business logic of its
/// own, so everything it needs from the backend fits in three calls.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write one object's bytes under `key` with the declared content type.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()>;

    /// Produce a time-limited read URL for an existing key.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Fetch one listing page of the bucket, in the backend's key order.
    async fn list_objects(&self) -> StorageResult<Vec<ObjectSummary>>;
}

/// Shared handle the router carries as state.
pub type SharedStore = Arc<dyn ObjectStore>;

/// Derive the bucket key for an uploaded file.
///
/// Two uploads of the same filename within the same millisecond produce the
/// same key and silently overwrite; the timestamp prefix makes that
/// overwhelmingly unlikely and collisions are not detected.
pub fn object_key(now_millis: i64, filename: &str) -> String {
    format!("{}_{}", now_millis, filename)
}

/// Production store over a single S3 bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build the SDK client from explicit configuration, resolved once at
    /// startup. Credentials come from the default provider chain (env vars,
    /// profiles, IAM roles); timeouts and retries are the SDK defaults.
    pub async fn new(cfg: &AppConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &cfg.endpoint {
            // S3-compatible backends (MinIO, R2) need path-style addressing.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: cfg.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()> {
        debug!(key, size = body.len(), "writing object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::Put {
                key: key.to_string(),
                message: err.into_service_error().to_string(),
            })?;
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|err| StorageError::Presign {
                key: key.to_string(),
                message: err.to_string(),
            })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| StorageError::Presign {
                key: key.to_string(),
                message: err.into_service_error().to_string(),
            })?;

        Ok(request.uri().to_string())
    }

    async fn list_objects(&self) -> StorageResult<Vec<ObjectSummary>> {
        // Single page only. Continuation tokens are not followed, so a
        // bucket past the backend's page limit is silently truncated.
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| StorageError::List(err.into_service_error().to_string()))?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let last_modified = obj
                    .last_modified()
                    .and_then(|ts| ts.to_millis().ok())
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .unwrap_or(DateTime::UNIX_EPOCH);
                Some(ObjectSummary {
                    key,
                    size: obj.size().unwrap_or(0),
                    last_modified,
                })
            })
            .collect();

        Ok(objects)
    }
}
