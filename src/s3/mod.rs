//! S3-compatible object store access
//!
//! Built on `aws-sdk-s3`, against any store that speaks the S3 API with
//! path-style addressing (MinIO, Ceph RGW, LocalStack, AWS itself).
//!
//! # Features
//!
//! - Explicit endpoint, static credentials and region; no ambient discovery
//! - Lazy, paginated object listing as a stream
//! - Chunked upload with bounded part concurrency and abort on failure
//! - Streaming download into any `AsyncWrite`
//! - Cancellation of every operation through a `CancellationToken`
//! - Optional wire-level request/response tracing
//!
//! # Example
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use s3_utils::s3::{list_objects, EndpointConfig, S3Client};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EndpointConfig::build("http://localhost:9000", "minioadmin", "minioadmin");
//!     let client = S3Client::new(config);
//!     let cancel = CancellationToken::new();
//!
//!     let mut objects = list_objects(&client, "backups", Some("2024/"), &cancel);
//!     while let Some(object) = objects.try_next().await? {
//!         println!("{} ({} bytes)", object.key, object.size);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod download;
mod error;
mod list;
mod memory;
mod operations;
mod types;
mod upload;
pub mod wire;

pub use client::S3Client;
pub use config::{
    EndpointConfig, LogMode, UploadOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REGION, DEFAULT_TIMEOUT,
};
pub use error::{S3Error, S3Result};
pub use memory::MemoryStore;
pub use operations::S3Operations;
pub use types::{
    BucketEntry, ObjectBody, ObjectEntry, ObjectPage, Payload, UploadPartInfo, UploadSummary,
};

pub use download::download;
pub use list::{list_buckets, list_objects};
pub use upload::upload;

/// Default upload part size (5 MiB)
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;

/// Minimum part size accepted by S3 for all but the last part
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Maximum part size (5 GiB)
pub const MAX_PART_SIZE: usize = 5 * 1024 * 1024 * 1024;

/// Default number of parts in flight
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Maximum number of parts in flight
pub const MAX_CONCURRENCY: usize = 16;

/// Maximum number of parts in one multipart upload
pub const MAX_PART_COUNT: i32 = 10_000;
