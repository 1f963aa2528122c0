//! End-to-end listing and transfer behaviour against the in-memory store

use futures::{StreamExt, TryStreamExt};
use s3_utils::s3::{
    download, list_buckets, list_objects, upload, EndpointConfig, MemoryStore, ObjectEntry,
    Payload, S3Client, S3Error, UploadOptions, DEFAULT_PART_SIZE,
};
use std::collections::BTreeSet;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

fn backups() -> MemoryStore {
    let store = MemoryStore::new();
    store.create_bucket("backups");
    for key in ["a.txt", "b.txt", "logs/1.txt"] {
        store.insert_object("backups", key, key.as_bytes());
    }
    store
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

async fn all_keys(store: &MemoryStore, bucket: &str, prefix: Option<&str>) -> Vec<String> {
    let cancel = CancellationToken::new();
    list_objects(store, bucket, prefix, &cancel)
        .map_ok(|entry| entry.key)
        .try_collect()
        .await
        .unwrap()
}

async fn round_trip(store: &MemoryStore, key: &str, data: &[u8], options: UploadOptions) -> Vec<u8> {
    let cancel = CancellationToken::new();
    upload(
        store,
        "backups",
        key,
        Payload::from(data.to_vec()),
        &options,
        &cancel,
    )
    .await
    .unwrap();

    let mut out = Vec::new();
    let copied = download(store, "backups", key, &mut out, &cancel)
        .await
        .unwrap();
    assert_eq!(copied, data.len() as u64);
    out
}

#[tokio::test]
async fn test_backups_scenario_listing() {
    let store = backups();

    assert_eq!(
        all_keys(&store, "backups", Some("logs/")).await,
        vec!["logs/1.txt"]
    );
    assert_eq!(
        all_keys(&store, "backups", None).await,
        vec!["a.txt", "b.txt", "logs/1.txt"]
    );

    let cancel = CancellationToken::new();
    let buckets = list_buckets(&store, &cancel).await.unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "backups");
}

#[tokio::test]
async fn test_hello_world_round_trip() {
    let store = backups();
    let cancel = CancellationToken::new();

    upload(
        &store,
        "backups",
        "hello.txt",
        Payload::from("hello world"),
        &UploadOptions::default(),
        &cancel,
    )
    .await
    .unwrap();

    let mut out = Vec::new();
    download(&store, "backups", "hello.txt", &mut out, &cancel)
        .await
        .unwrap();
    assert_eq!(out, b"hello world");
}

#[tokio::test]
async fn test_pagination_is_complete_for_any_page_size() {
    let expected: BTreeSet<String> = (0..23).map(|i| format!("obj/{:03}", i)).collect();

    for page_size in [1, 2, 3, 5, 22, 23, 24, 1000] {
        let store = MemoryStore::new().with_page_size(page_size);
        store.create_bucket("many");
        for key in &expected {
            store.insert_object("many", key, b"x");
        }

        let keys = all_keys(&store, "many", None).await;
        assert_eq!(keys.len(), expected.len(), "page size {}", page_size);
        let unique: BTreeSet<String> = keys.into_iter().collect();
        assert_eq!(unique, expected, "page size {}", page_size);

        let pages = (expected.len() + page_size - 1) / page_size;
        assert_eq!(store.list_page_requests(), pages.max(1), "page size {}", page_size);
    }
}

#[tokio::test]
async fn test_prefix_yields_exact_subset() {
    let store = MemoryStore::new().with_page_size(2);
    store.create_bucket("mixed");
    let keys = [
        "2024/01/a", "2024/01/b", "2024/02/a", "2025/01/a", "readme", "2024",
    ];
    for key in keys {
        store.insert_object("mixed", key, key.as_bytes());
    }

    for prefix in ["", "2024", "2024/", "2024/01/", "2025/", "nothing"] {
        let expected: Vec<String> = {
            let mut matching: Vec<String> = keys
                .iter()
                .filter(|k| k.starts_with(prefix))
                .map(|k| k.to_string())
                .collect();
            matching.sort();
            matching
        };
        let actual = all_keys(&store, "mixed", Some(prefix)).await;
        assert_eq!(actual, expected, "prefix {:?}", prefix);
    }
}

#[tokio::test]
async fn test_empty_bucket_lists_nothing() {
    let store = MemoryStore::new();
    store.create_bucket("empty");
    assert!(all_keys(&store, "empty", None).await.is_empty());
    assert!(all_keys(&store, "empty", Some("logs/")).await.is_empty());
}

#[tokio::test]
async fn test_round_trip_sizes() {
    let store = backups();
    let sizes = [
        0,
        1,
        DEFAULT_PART_SIZE - 1,
        DEFAULT_PART_SIZE,
        DEFAULT_PART_SIZE + 1,
        2 * DEFAULT_PART_SIZE + 3,
    ];

    for (i, size) in sizes.into_iter().enumerate() {
        let data = pattern(size);
        for concurrency in [1, 3] {
            let key = format!("rt/{}-{}", i, concurrency);
            let options = UploadOptions::new(DEFAULT_PART_SIZE, concurrency);
            let out = round_trip(&store, &key, &data, options).await;
            assert!(out == data, "size {} concurrency {}", size, concurrency);
        }
    }
    assert_eq!(store.pending_multipart_uploads(), 0);
    assert_eq!(store.open_readers(), 0);
}

#[tokio::test]
async fn test_upload_replaces_existing_object() {
    let store = backups();
    let out = round_trip(&store, "a.txt", b"replaced", UploadOptions::default()).await;
    assert_eq!(out, b"replaced");
}

#[tokio::test]
async fn test_upload_from_file() {
    let store = backups();
    let data = pattern(DEFAULT_PART_SIZE + 4096);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let reader = tokio::fs::File::open(file.path()).await.unwrap();
    let cancel = CancellationToken::new();
    let summary = upload(
        &store,
        "backups",
        "from-file.bin",
        Payload::reader(reader),
        &UploadOptions::new(DEFAULT_PART_SIZE, 2),
        &cancel,
    )
    .await
    .unwrap();

    assert_eq!(summary.parts, 2);
    assert_eq!(summary.bytes, data.len() as u64);
    assert_eq!(store.object("backups", "from-file.bin").unwrap(), data);
}

#[tokio::test]
async fn test_download_missing_key_is_not_found() {
    let store = backups();
    let cancel = CancellationToken::new();
    let mut out = Vec::new();

    let err = download(&store, "backups", "nope.txt", &mut out, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Object not found: backups/nope.txt");
}

#[tokio::test]
async fn test_cancel_during_upload_aborts_multipart() {
    let store = backups();
    let cancel = CancellationToken::new();

    // The writer sends one full part and a bit more, then stalls without EOF
    let (reader, mut writer) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let data = pattern(DEFAULT_PART_SIZE + 10);
        writer.write_all(&data).await.unwrap();
        std::future::pending::<()>().await;
    });

    let canceller = {
        let store = store.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while store.multipart_uploads_started() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            cancel.cancel();
        })
    };

    let err = upload(
        &store,
        "backups",
        "stalled.bin",
        Payload::reader(reader),
        &UploadOptions::default(),
        &cancel,
    )
    .await
    .unwrap_err();
    canceller.await.unwrap();

    assert!(err.is_cancelled());
    assert!(store.object("backups", "stalled.bin").is_none());
    assert_eq!(store.multipart_uploads_aborted(), 1);
    assert_eq!(store.pending_multipart_uploads(), 0);
}

#[tokio::test]
async fn test_partial_listing_keeps_earlier_entries() {
    let store = backups().with_page_size(2);
    store.fail_list_page(2);
    let cancel = CancellationToken::new();

    let results: Vec<Result<ObjectEntry, S3Error>> =
        list_objects(&store, "backups", None, &cancel).collect().await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(S3Error::ListFailure { .. })));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_wrapped_transport_error() {
    let config = EndpointConfig::build("http://127.0.0.1:1", "key", "secret")
        .with_max_attempts(1)
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(1));
    let client = S3Client::new(config);
    let cancel = CancellationToken::new();

    let err = upload(
        &client,
        "backups",
        "hello.txt",
        Payload::from("hello world"),
        &UploadOptions::default(),
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, S3Error::TransferFailure { .. }));
    assert!(err.to_string().starts_with("put object failed"));

    let results: Vec<Result<ObjectEntry, S3Error>> =
        list_objects(&client, "backups", None, &cancel).collect().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(S3Error::ListFailure { .. })));
}
