//! Per-request store calls
//!
//! [`S3Operations`] is the seam between the transfer logic (listing pages,
//! splitting uploads, streaming downloads) and whatever actually talks to the
//! store. [`S3Client`](super::S3Client) implements it on top of the AWS SDK;
//! [`MemoryStore`](super::MemoryStore) implements it in-process.
//!
//! Every call is one round trip. Implementations must not retry on their own
//! beyond what the underlying transport does.

use super::error::{S3Error, S3Result};
use super::types::{BucketEntry, ObjectBody, ObjectPage, UploadPartInfo};
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Single-request operations against an S3-compatible store
#[async_trait]
pub trait S3Operations: Send + Sync {
    /// List all buckets visible to the credentials
    async fn list_buckets(&self) -> S3Result<Vec<BucketEntry>>;

    /// Fetch one page of objects, continuing from `token` if given
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> S3Result<ObjectPage>;

    /// Store an object in a single request
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> S3Result<()>;

    /// Start a multipart upload and return its upload id
    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> S3Result<String>;

    /// Upload one part of a multipart upload
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> S3Result<UploadPartInfo>;

    /// Assemble the uploaded parts (ascending part number) into the object
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[UploadPartInfo],
    ) -> S3Result<()>;

    /// Discard a multipart upload and its parts
    async fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str)
        -> S3Result<()>;

    /// Open a streaming read of an object; `NotFound` if the key is absent
    async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectBody>;
}

/// Reject an empty bucket name before any request goes out
pub(crate) fn require_bucket(bucket: &str) -> S3Result<()> {
    if bucket.is_empty() {
        return Err(S3Error::Configuration("bucket name is required".to_string()));
    }
    Ok(())
}

/// Reject an empty bucket or key name before any request goes out
pub(crate) fn require_object(bucket: &str, key: &str) -> S3Result<()> {
    require_bucket(bucket)?;
    if key.is_empty() {
        return Err(S3Error::Configuration("key name is required".to_string()));
    }
    Ok(())
}

/// Run a store call unless `cancel` fires first
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> S3Result<T>
where
    F: Future<Output = S3Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(S3Error::Cancelled),
        result = fut => result,
    }
}
