//! Bucket and object listing

use super::error::S3Result;
use super::operations::{cancellable, require_bucket, S3Operations};
use super::types::{BucketEntry, ObjectEntry};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Position of an object listing between pages
enum PageCursor {
    Start,
    Next(String),
    Done,
}

/// List every bucket visible to the client in one request
pub async fn list_buckets<S>(store: &S, cancel: &CancellationToken) -> S3Result<Vec<BucketEntry>>
where
    S: S3Operations + ?Sized,
{
    let buckets = cancellable(cancel, store.list_buckets())
        .await
        .map_err(|e| e.list_failure("list buckets failed"))?;
    debug!(count = buckets.len(), "list buckets completed");
    Ok(buckets)
}

/// Lazily list the objects of `bucket`, optionally restricted to keys
/// starting with `prefix`.
///
/// Pages are fetched one at a time as the stream is polled, so dropping the
/// stream early never requests further pages. Entries come out in store
/// order. The first failing page yields one `ListFailure` and ends the
/// stream; entries already yielded stay valid. An empty bucket name yields a
/// single `Configuration` error without any request.
pub fn list_objects<'a, S>(
    store: &'a S,
    bucket: &'a str,
    prefix: Option<&'a str>,
    cancel: &'a CancellationToken,
) -> BoxStream<'a, S3Result<ObjectEntry>>
where
    S: S3Operations + ?Sized,
{
    if let Err(err) = require_bucket(bucket) {
        return stream::once(future::ready(Err(err))).boxed();
    }
    let prefix = prefix.filter(|p| !p.is_empty());

    stream::unfold(PageCursor::Start, move |cursor| async move {
        let token = match cursor {
            PageCursor::Done => return None,
            PageCursor::Start => None,
            PageCursor::Next(token) => Some(token),
        };

        match cancellable(cancel, store.list_objects_page(bucket, prefix, token)).await {
            Ok(page) => {
                debug!(
                    bucket,
                    prefix,
                    count = page.objects.len(),
                    more = page.next_token.is_some(),
                    "list objects page fetched"
                );
                let next = match page.next_token {
                    Some(token) => PageCursor::Next(token),
                    None => PageCursor::Done,
                };
                Some((stream::iter(page.objects.into_iter().map(Ok)).boxed(), next))
            }
            Err(e) => {
                let err = e.list_failure("list objects failed");
                Some((
                    stream::once(future::ready(Err(err))).boxed(),
                    PageCursor::Done,
                ))
            }
        }
    })
    .flatten()
    .boxed()
}
