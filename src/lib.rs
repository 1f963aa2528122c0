/*!
 * s3-utils - command-line utilities for S3-compatible object stores
 *
 * A small client layer over aws-sdk-s3 with:
 * - Explicit endpoint configuration (path-style, static credentials)
 * - Lazy paginated listing of buckets and objects
 * - Chunked multipart upload with bounded concurrency
 * - Streaming download
 * - Optional wire-level request tracing
 *
 * The binaries under src/bin are thin wrappers around the `s3` module.
 */

pub mod cli;
pub mod logging;
pub mod s3;

pub use s3::{EndpointConfig, LogMode, S3Client, S3Error, S3Operations, S3Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
