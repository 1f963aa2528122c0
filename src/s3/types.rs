//! Type definitions for S3 operations

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::AsyncRead;

/// A bucket returned by a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Bucket name
    pub name: String,
}

/// An object returned by an object listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object key (path within bucket)
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// ETag, if the store reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ObjectEntry {
    /// Create an entry with only a key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            etag: None,
        }
    }
}

/// One page of an object listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects in store order
    pub objects: Vec<ObjectEntry>,

    /// Cursor for the next page; `None` on the last page
    pub next_token: Option<String>,
}

/// A completed part of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPartInfo {
    /// 1-based part number
    pub part_number: i32,

    /// ETag returned for the part
    pub etag: String,

    /// Part size in bytes
    pub size: usize,
}

impl UploadPartInfo {
    /// Create new part info
    pub fn new(part_number: i32, etag: String, size: usize) -> Self {
        Self {
            part_number,
            etag,
            size,
        }
    }
}

/// Streaming body of a downloaded object. Dropping it releases the
/// underlying connection.
pub type ObjectBody = Box<dyn AsyncRead + Send + Unpin>;

/// Bytes to upload
pub enum Payload {
    /// In-memory buffer
    Bytes(Bytes),

    /// Streaming source, read part by part
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl Payload {
    /// Wrap any reader
    pub fn reader<R: AsyncRead + Send + Unpin + 'static>(reader: R) -> Self {
        Payload::Reader(Box::new(reader))
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Payload::Bytes(data)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(data))
    }
}

impl From<&'static str> for Payload {
    fn from(data: &'static str) -> Self {
        Payload::Bytes(Bytes::from_static(data.as_bytes()))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Payload::Reader(_) => f.write_str("Reader"),
        }
    }
}

/// Outcome of a successful upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    /// Total bytes uploaded
    pub bytes: u64,

    /// Number of parts; 0 when the object went up in a single request
    pub parts: usize,
}
