//! S3 client implementation

use super::config::{EndpointConfig, LogMode};
use super::error::{S3Error, S3Result};
use super::operations::S3Operations;
use super::types::{BucketEntry, ObjectBody, ObjectEntry, ObjectPage, UploadPartInfo};
use super::wire::WireLogInterceptor;
use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client as AwsS3Client;
use bytes::Bytes;
use tracing::debug;

/// Provider name attached to the static credentials
const CREDENTIALS_PROVIDER_NAME: &str = "s3-utils-static";

/// Handle for an S3-compatible store.
///
/// Cheap to clone and safe to share: it carries no per-call state, only the
/// configuration baked in at construction and the SDK's connection pool.
#[derive(Debug, Clone)]
pub struct S3Client {
    /// AWS S3 client
    client: AwsS3Client,

    /// Client configuration
    config: EndpointConfig,
}

impl S3Client {
    /// Create a client for the given endpoint.
    ///
    /// Construction is local: nothing is resolved or contacted until the
    /// first request.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use s3_utils::s3::{EndpointConfig, S3Client};
    ///
    /// let config = EndpointConfig::build("http://localhost:9000", "minioadmin", "minioadmin");
    /// let client = S3Client::new(config);
    /// assert!(client.config().use_path_style());
    /// ```
    pub fn new(config: EndpointConfig) -> Self {
        let client = Self::build_aws_client(&config);
        debug!(
            endpoint = config.url(),
            tls = config.is_tls(),
            region = config.region(),
            anonymous = !config.has_credentials(),
            log_mode = ?config.log_mode(),
            "S3 client created"
        );
        Self { client, config }
    }

    /// Build the AWS SDK S3 client from configuration
    fn build_aws_client(config: &EndpointConfig) -> AwsS3Client {
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build();

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region().to_string()))
            .force_path_style(config.use_path_style())
            .timeout_config(timeout_config)
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts()));

        if let Some(endpoint) = config.endpoint_url() {
            builder = builder.endpoint_url(endpoint);
        }

        // Static, non-rotating pair; no session token
        if config.has_credentials() {
            let credentials = Credentials::new(
                config.access_key(),
                config.secret_key(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            );
            builder = builder.credentials_provider(credentials);
        }

        if config.log_mode() == LogMode::WireTrace {
            builder = builder.interceptor(WireLogInterceptor::new());
        }

        AwsS3Client::from_conf(builder.build())
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

#[async_trait]
impl S3Operations for S3Client {
    async fn list_buckets(&self) -> S3Result<Vec<BucketEntry>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(S3Error::from)?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name())
            .map(|name| BucketEntry {
                name: name.to_string(),
            })
            .collect())
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> S3Result<ObjectPage> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(token)
            .send()
            .await
            .map_err(S3Error::from)?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(ObjectEntry {
                    key: obj.key()?.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    etag: obj.e_tag().map(|s| s.to_string()),
                })
            })
            .collect();

        // A truncated page without a token cannot be continued; treat it as the end
        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(|s| s.to_string())
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_token,
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> S3Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(S3Error::from)?;
        Ok(())
    }

    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> S3Result<String> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(S3Error::from)?;

        response
            .upload_id()
            .map(|s| s.to_string())
            .ok_or_else(|| S3Error::Sdk("No upload ID returned".to_string()))
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> S3Result<UploadPartInfo> {
        let size = data.len();

        let response = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(S3Error::from)?;

        let etag = response
            .e_tag()
            .ok_or_else(|| S3Error::Sdk(format!("No ETag returned for part {}", part_number)))?
            .to_string();

        Ok(UploadPartInfo::new(part_number, etag, size))
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[UploadPartInfo],
    ) -> S3Result<()> {
        let completed_parts: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(S3Error::from)?;

        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> S3Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(S3Error::from)?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectBody> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let code = e.as_service_error().and_then(|se| se.code());
                let status = e.raw_response().map(|raw| raw.status().as_u16());
                if is_missing_object(code, status) {
                    S3Error::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    S3Error::from(e)
                }
            })?;

        Ok(Box::new(Box::pin(response.body.into_async_read())))
    }
}

/// Whether a failed `GetObject` means the key is absent. A bare 404 only
/// counts when the store sent no error code, so `NoSuchBucket` stays a
/// service error.
fn is_missing_object(code: Option<&str>, status: Option<u16>) -> bool {
    match code {
        Some(code) => code == "NoSuchKey",
        None => status == Some(404),
    }
}
