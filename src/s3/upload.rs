//! Chunked upload
//!
//! Payloads smaller than the part size go up in one `PutObject`. Anything
//! larger becomes a multipart upload: the payload is cut into parts of the
//! configured size (the last one may be shorter), read sequentially, and up
//! to `concurrency` parts are in flight at once. Parts are completed in part
//! number order, so the object is the plain concatenation of the payload
//! regardless of the order the uploads finished in. If anything fails or the
//! operation is cancelled, the multipart upload is aborted and nothing
//! becomes visible at the key.

use super::config::UploadOptions;
use super::error::{S3Error, S3Result};
use super::operations::{cancellable, require_object, S3Operations};
use super::types::{Payload, UploadPartInfo, UploadSummary};
use bytes::Bytes;
use futures::stream::{self, TryStreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Upload `payload` to `bucket/key`, creating or replacing the object
pub async fn upload<S>(
    store: &S,
    bucket: &str,
    key: &str,
    payload: Payload,
    options: &UploadOptions,
    cancel: &CancellationToken,
) -> S3Result<UploadSummary>
where
    S: S3Operations + ?Sized,
{
    require_object(bucket, key)?;
    options.validate()?;

    let mut source = PartSource::new(payload, options.part_size);
    let first = read_part(&mut source, cancel).await?;

    if first.len() < options.part_size {
        let bytes = first.len() as u64;
        cancellable(cancel, store.put_object(bucket, key, first))
            .await
            .map_err(|e| e.transfer_failure("put object failed"))?;
        debug!(bucket, key, bytes, "single request upload completed");
        return Ok(UploadSummary { bytes, parts: 0 });
    }

    let upload_id = cancellable(cancel, store.create_multipart_upload(bucket, key))
        .await
        .map_err(|e| e.transfer_failure("create multipart upload failed"))?;
    debug!(bucket, key, upload_id = %upload_id, "multipart upload started");

    match upload_parts(store, bucket, key, &upload_id, first, source, options, cancel).await {
        Ok(summary) => {
            debug!(
                bucket,
                key,
                bytes = summary.bytes,
                parts = summary.parts,
                "multipart upload completed"
            );
            Ok(summary)
        }
        Err(err) => {
            // Not tied to the cancellation token: the abort must still go out
            if let Err(abort_err) = store.abort_multipart_upload(bucket, key, &upload_id).await {
                warn!(
                    bucket,
                    key,
                    upload_id = %upload_id,
                    error = %abort_err,
                    "failed to abort multipart upload"
                );
            }
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn upload_parts<S>(
    store: &S,
    bucket: &str,
    key: &str,
    upload_id: &str,
    first: Bytes,
    source: PartSource,
    options: &UploadOptions,
    cancel: &CancellationToken,
) -> S3Result<UploadSummary>
where
    S: S3Operations + ?Sized,
{
    let numbered_parts = stream::try_unfold(
        (Some(first), source, 1i32),
        move |(pending, mut source, part_number)| async move {
            let data = match pending {
                Some(data) => data,
                None => read_part(&mut source, cancel).await?,
            };
            if data.is_empty() {
                return Ok::<_, S3Error>(None);
            }
            if part_number > super::MAX_PART_COUNT {
                return Err(S3Error::Configuration(format!(
                    "payload needs more than {} parts; increase the part size",
                    super::MAX_PART_COUNT
                )));
            }
            Ok(Some(((part_number, data), (None, source, part_number + 1))))
        },
    );

    let mut parts: Vec<UploadPartInfo> = numbered_parts
        .map_ok(move |(part_number, data)| async move {
            let size = data.len();
            let part = cancellable(
                cancel,
                store.upload_part(bucket, key, upload_id, part_number, data),
            )
            .await
            .map_err(|e| e.transfer_failure(format!("upload part {} failed", part_number)))?;
            debug!(part_number, size, "part uploaded");
            Ok::<_, S3Error>(part)
        })
        .try_buffer_unordered(options.concurrency)
        .try_collect()
        .await?;

    parts.sort_by_key(|p| p.part_number);

    cancellable(
        cancel,
        store.complete_multipart_upload(bucket, key, upload_id, &parts),
    )
    .await
    .map_err(|e| e.transfer_failure("complete multipart upload failed"))?;

    Ok(UploadSummary {
        bytes: parts.iter().map(|p| p.size as u64).sum(),
        parts: parts.len(),
    })
}

async fn read_part(source: &mut PartSource, cancel: &CancellationToken) -> S3Result<Bytes> {
    cancellable(cancel, async {
        source
            .next_part()
            .await
            .map_err(|e| S3Error::from(e).transfer_failure("read payload failed"))
    })
    .await
}

/// Cuts a payload into consecutive parts
enum PartSource {
    Bytes {
        data: Bytes,
        part_size: usize,
    },
    Reader {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        part_size: usize,
    },
}

impl PartSource {
    fn new(payload: Payload, part_size: usize) -> Self {
        match payload {
            Payload::Bytes(data) => PartSource::Bytes { data, part_size },
            Payload::Reader(reader) => PartSource::Reader { reader, part_size },
        }
    }

    /// Next part: `part_size` bytes, fewer at the end, empty once exhausted
    async fn next_part(&mut self) -> io::Result<Bytes> {
        match self {
            PartSource::Bytes { data, part_size } => {
                let len = data.len().min(*part_size);
                Ok(data.split_to(len))
            }
            PartSource::Reader { reader, part_size } => {
                let mut buffer = Vec::with_capacity(*part_size);
                (&mut *reader)
                    .take(*part_size as u64)
                    .read_to_end(&mut buffer)
                    .await?;
                Ok(Bytes::from(buffer))
            }
        }
    }
}
