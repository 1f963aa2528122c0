//! Streaming download

use super::error::{S3Error, S3Result};
use super::operations::{cancellable, require_object, S3Operations};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Copy the object at `bucket/key` into `sink` and return the byte count.
///
/// The body is streamed, never buffered whole. The remote read handle is
/// released before returning on every path, including a failed or cancelled
/// copy. After an error the sink may hold a prefix of the object.
pub async fn download<S, W>(
    store: &S,
    bucket: &str,
    key: &str,
    sink: &mut W,
    cancel: &CancellationToken,
) -> S3Result<u64>
where
    S: S3Operations + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    require_object(bucket, key)?;

    let mut body = cancellable(cancel, store.get_object(bucket, key))
        .await
        .map_err(|e| e.transfer_failure("get object failed"))?;

    let copied = cancellable(cancel, async {
        let copied = tokio::io::copy(&mut body, &mut *sink).await?;
        sink.flush().await?;
        Ok::<_, S3Error>(copied)
    })
    .await
    .map_err(|e| e.transfer_failure("download content failed"));
    drop(body);

    let copied = copied?;
    debug!(bucket, key, bytes = copied, "download completed");
    Ok(copied)
}
