//! In-process S3 store
//!
//! [`MemoryStore`] keeps buckets and objects in memory and implements
//! [`S3Operations`], so listing, upload and download logic can run without a
//! server. It also records how it was called and can be told to fail specific
//! requests.

use super::error::{S3Error, S3Result};
use super::operations::S3Operations;
use super::types::{BucketEntry, ObjectBody, ObjectEntry, ObjectPage, UploadPartInfo};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::ops::Bound;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Default maximum number of keys per listing page, as on S3
const DEFAULT_PAGE_SIZE: usize = 1000;

/// A multipart upload that has not been completed or aborted
#[derive(Debug)]
struct PendingUpload {
    bucket: String,
    key: String,
    parts: BTreeMap<i32, (String, Bytes)>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, Bytes>>,
    uploads: HashMap<String, PendingUpload>,
    next_upload_id: u64,
    uploads_started: usize,
    uploads_aborted: usize,
    list_page_requests: usize,
    fail_list_page: Option<usize>,
    fail_upload_part: Option<i32>,
}

/// In-memory S3-compatible store
///
/// Clones share the same contents.
///
/// # Example
///
/// ```
/// use s3_utils::s3::{download, MemoryStore};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.create_bucket("backups");
/// store.insert_object("backups", "hello.txt", b"hello world");
///
/// let mut out = Vec::new();
/// let cancel = CancellationToken::new();
/// download(&store, "backups", "hello.txt", &mut out, &cancel).await.unwrap();
/// assert_eq!(out, b"hello world");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    open_readers: Arc<AtomicUsize>,
    page_size: usize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            open_readers: Arc::new(AtomicUsize::new(0)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Limit listing pages to `page_size` keys (at least one)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a bucket; existing contents are kept
    pub fn create_bucket(&self, name: &str) {
        self.state().buckets.entry(name.to_string()).or_default();
    }

    /// Store an object, creating the bucket if needed
    pub fn insert_object(&self, bucket: &str, key: &str, data: &[u8]) {
        self.state()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), Bytes::copy_from_slice(data));
    }

    /// Contents of an object, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.state().buckets.get(bucket)?.get(key).cloned()
    }

    /// Number of listing pages requested so far
    pub fn list_page_requests(&self) -> usize {
        self.state().list_page_requests
    }

    /// Make the `n`th listing page request (1-based) fail
    pub fn fail_list_page(&self, n: usize) {
        self.state().fail_list_page = Some(n);
    }

    /// Make every upload of the given part number fail
    pub fn fail_upload_part(&self, part_number: i32) {
        self.state().fail_upload_part = Some(part_number);
    }

    /// Multipart uploads created so far
    pub fn multipart_uploads_started(&self) -> usize {
        self.state().uploads_started
    }

    /// Multipart uploads neither completed nor aborted
    pub fn pending_multipart_uploads(&self) -> usize {
        self.state().uploads.len()
    }

    /// Multipart uploads aborted so far
    pub fn multipart_uploads_aborted(&self) -> usize {
        self.state().uploads_aborted
    }

    /// Object bodies handed out and not yet dropped
    pub fn open_readers(&self) -> usize {
        self.open_readers.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn no_such_bucket(bucket: &str) -> S3Error {
    S3Error::Service {
        code: "NoSuchBucket".to_string(),
        message: format!("The specified bucket does not exist: {}", bucket),
    }
}

fn no_such_upload(upload_id: &str) -> S3Error {
    S3Error::Service {
        code: "NoSuchUpload".to_string(),
        message: format!("The specified upload does not exist: {}", upload_id),
    }
}

#[async_trait]
impl S3Operations for MemoryStore {
    async fn list_buckets(&self) -> S3Result<Vec<BucketEntry>> {
        Ok(self
            .state()
            .buckets
            .keys()
            .map(|name| BucketEntry { name: name.clone() })
            .collect())
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> S3Result<ObjectPage> {
        let mut state = self.state();
        state.list_page_requests += 1;
        if state.fail_list_page == Some(state.list_page_requests) {
            return Err(S3Error::Network("injected listing failure".to_string()));
        }

        let objects = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let start = match &token {
            Some(token) => Bound::Excluded(token.as_str()),
            None => Bound::Unbounded,
        };
        let prefix = prefix.unwrap_or("");

        let mut matching = objects
            .range::<str, _>((start, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| ObjectEntry {
                key: key.clone(),
                size: data.len() as u64,
                etag: None,
            });

        let page: Vec<ObjectEntry> = matching.by_ref().take(self.page_size).collect();
        let next_token = if matching.next().is_some() {
            page.last().map(|entry| entry.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            objects: page,
            next_token,
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> S3Result<()> {
        let mut state = self.state();
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> S3Result<String> {
        let mut state = self.state();
        if !state.buckets.contains_key(bucket) {
            return Err(no_such_bucket(bucket));
        }
        state.next_upload_id += 1;
        state.uploads_started += 1;
        let upload_id = format!("upload-{}", state.next_upload_id);
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> S3Result<UploadPartInfo> {
        let mut state = self.state();
        if state.fail_upload_part == Some(part_number) {
            return Err(S3Error::Network(format!(
                "injected failure for part {}",
                part_number
            )));
        }
        let upload = state
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;

        let size = data.len();
        let etag = format!("\"{}-{}-{}\"", upload_id, part_number, size);
        upload.parts.insert(part_number, (etag.clone(), data));
        Ok(UploadPartInfo::new(part_number, etag, size))
    }

    async fn complete_multipart_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        parts: &[UploadPartInfo],
    ) -> S3Result<()> {
        let mut state = self.state();
        let upload = state
            .uploads
            .get(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;

        if parts.is_empty() || parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(S3Error::Service {
                code: "InvalidPartOrder".to_string(),
                message: "parts must be listed in ascending order".to_string(),
            });
        }

        let mut object = BytesMut::new();
        for part in parts {
            match upload.parts.get(&part.part_number) {
                Some((etag, data)) if *etag == part.etag => object.extend_from_slice(data),
                _ => {
                    return Err(S3Error::Service {
                        code: "InvalidPart".to_string(),
                        message: format!("part {} was not uploaded", part.part_number),
                    })
                }
            }
        }

        if let Some(upload) = state.uploads.remove(upload_id) {
            state
                .buckets
                .entry(upload.bucket)
                .or_default()
                .insert(upload.key, object.freeze());
        }
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> S3Result<()> {
        let mut state = self.state();
        state
            .uploads
            .remove(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;
        state.uploads_aborted += 1;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectBody> {
        let data = self
            .state()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| S3Error::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        Ok(Box::new(TrackedReader::new(
            data,
            Arc::clone(&self.open_readers),
        )))
    }
}

/// Object body that counts itself in [`MemoryStore::open_readers`] until dropped
struct TrackedReader {
    inner: Cursor<Bytes>,
    open: Arc<AtomicUsize>,
}

impl TrackedReader {
    fn new(data: Bytes, open: Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: Cursor::new(data),
            open,
        }
    }
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
