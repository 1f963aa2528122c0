//! Tests against a real S3-compatible server
//!
//! Ignored by default. To run them against MinIO, LocalStack or AWS, set:
//!
//! - `S3_TESTS_ENABLED`: "1" to enable
//! - `S3_TEST_ENDPOINT`: endpoint URL, e.g. `http://localhost:9000`
//! - `S3_TEST_BUCKET`: existing bucket the tests may write to
//! - `S3_TEST_REGION`: region (default: us-east-1)
//! - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: credentials
//!
//! then `cargo test --test s3_live_test -- --ignored`.

use futures::TryStreamExt;
use s3_utils::s3::{
    download, list_buckets, list_objects, upload, EndpointConfig, Payload, S3Client,
    UploadOptions, DEFAULT_PART_SIZE,
};
use std::env;
use tokio_util::sync::CancellationToken;

fn s3_tests_enabled() -> bool {
    env::var("S3_TESTS_ENABLED").unwrap_or_default() == "1"
}

fn test_bucket() -> String {
    env::var("S3_TEST_BUCKET").unwrap_or_else(|_| "s3-utils-test".to_string())
}

fn test_client() -> S3Client {
    let config = EndpointConfig::build(
        env::var("S3_TEST_ENDPOINT").unwrap_or_default(),
        env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
        env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
    )
    .with_region(env::var("S3_TEST_REGION").unwrap_or_default());
    S3Client::new(config)
}

fn unique_key(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("s3-utils-test/{}/{}", nanos, name)
}

#[tokio::test]
#[ignore]
async fn test_list_buckets_contains_test_bucket() {
    if !s3_tests_enabled() {
        println!("Skipping S3 integration test - set S3_TESTS_ENABLED=1 to run");
        return;
    }

    let client = test_client();
    let cancel = CancellationToken::new();
    let buckets = list_buckets(&client, &cancel)
        .await
        .expect("Failed to list buckets");
    assert!(buckets.iter().any(|b| b.name == test_bucket()));
}

#[tokio::test]
#[ignore]
async fn test_small_round_trip_and_listing() {
    if !s3_tests_enabled() {
        return;
    }

    let client = test_client();
    let cancel = CancellationToken::new();
    let bucket = test_bucket();
    let key = unique_key("hello.txt");

    upload(
        &client,
        &bucket,
        &key,
        Payload::from("hello world"),
        &UploadOptions::default(),
        &cancel,
    )
    .await
    .expect("Failed to upload");

    let mut out = Vec::new();
    download(&client, &bucket, &key, &mut out, &cancel)
        .await
        .expect("Failed to download");
    assert_eq!(out, b"hello world");

    let prefix = key.trim_end_matches("hello.txt");
    let keys: Vec<String> = list_objects(&client, &bucket, Some(prefix), &cancel)
        .map_ok(|entry| entry.key)
        .try_collect()
        .await
        .expect("Failed to list objects");
    assert_eq!(keys, vec![key]);
}

#[tokio::test]
#[ignore]
async fn test_multipart_round_trip() {
    if !s3_tests_enabled() {
        return;
    }

    let client = test_client();
    let cancel = CancellationToken::new();
    let bucket = test_bucket();
    let key = unique_key("multipart.bin");
    let data: Vec<u8> = (0..2 * DEFAULT_PART_SIZE + 1234)
        .map(|i| (i % 251) as u8)
        .collect();

    let summary = upload(
        &client,
        &bucket,
        &key,
        Payload::from(data.clone()),
        &UploadOptions::new(DEFAULT_PART_SIZE, 3),
        &cancel,
    )
    .await
    .expect("Failed to upload");
    assert_eq!(summary.parts, 3);

    let mut out = Vec::new();
    download(&client, &bucket, &key, &mut out, &cancel)
        .await
        .expect("Failed to download");
    assert!(out == data);
}

#[tokio::test]
#[ignore]
async fn test_missing_key_is_not_found() {
    if !s3_tests_enabled() {
        return;
    }

    let client = test_client();
    let cancel = CancellationToken::new();
    let mut out = Vec::new();

    let err = download(&client, &test_bucket(), &unique_key("absent"), &mut out, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
}
