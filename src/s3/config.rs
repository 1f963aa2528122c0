//! Configuration types for the S3 client

use super::error::{S3Error, S3Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

/// Region used when none is configured. S3-compatible servers ignore it but
/// request signing still needs one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default operation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of attempts the SDK makes per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Diagnostic logging capability of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// No wire-level logging
    #[default]
    Quiet,

    /// Log every request and response (headers and in-memory bodies)
    WireTrace,
}

/// Connection settings for an S3-compatible endpoint.
///
/// Immutable once built. Path-style addressing is always on, so the bucket
/// is part of the URL path and self-hosted servers without per-bucket
/// subdomains work.
#[derive(Clone)]
pub struct EndpointConfig {
    url: String,
    access_key: SecretString,
    secret_key: SecretString,
    region: String,
    use_path_style: bool,
    log_mode: LogMode,
    timeout: Duration,
    connect_timeout: Duration,
    max_attempts: u32,
}

impl EndpointConfig {
    /// Assemble a configuration from raw strings. Never fails; use
    /// [`EndpointConfig::require_credentials`] before operations that need them.
    pub fn build(
        url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into().trim().to_string(),
            access_key: SecretString::from(access_key.into()),
            secret_key: SecretString::from(secret_key.into()),
            region: DEFAULT_REGION.to_string(),
            use_path_style: true,
            log_mode: LogMode::Quiet,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the signing region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        if !region.is_empty() {
            self.region = region;
        }
        self
    }

    /// Set the diagnostic logging mode
    pub fn with_log_mode(mut self, log_mode: LogMode) -> Self {
        self.log_mode = log_mode;
        self
    }

    /// Set operation and connect timeouts
    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    /// Set the number of attempts per request (at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Raw endpoint URL as supplied
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the endpoint uses TLS, i.e. its scheme is `https`
    pub fn is_tls(&self) -> bool {
        match url::Url::parse(&self.url) {
            Ok(parsed) => parsed.scheme() == "https",
            Err(_) => false,
        }
    }

    /// Endpoint URL handed to the SDK. A URL without a scheme is plain HTTP.
    pub fn endpoint_url(&self) -> Option<String> {
        if self.url.is_empty() {
            return None;
        }
        if self.url.contains("://") {
            Some(self.url.clone())
        } else {
            Some(format!("http://{}", self.url))
        }
    }

    /// Access key id
    pub fn access_key(&self) -> &str {
        self.access_key.expose_secret()
    }

    /// Secret access key
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    /// Whether both keys are set
    pub fn has_credentials(&self) -> bool {
        !self.access_key().is_empty() && !self.secret_key().is_empty()
    }

    /// Signing region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Always true
    pub fn use_path_style(&self) -> bool {
        self.use_path_style
    }

    /// Diagnostic logging mode
    pub fn log_mode(&self) -> LogMode {
        self.log_mode
    }

    /// Operation timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect timeout
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Attempts per request
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Check that URL and both keys are present.
    ///
    /// Upload and download need this; listing may run anonymously.
    pub fn require_credentials(&self) -> S3Result<()> {
        if self.url.is_empty() {
            return Err(S3Error::Configuration("S3 URL is required".to_string()));
        }
        if self.access_key().is_empty() {
            return Err(S3Error::Configuration(
                "S3 access key is required".to_string(),
            ));
        }
        if self.secret_key().is_empty() {
            return Err(S3Error::Configuration(
                "S3 secret key is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("access_key", &SecretLength(self.access_key().len()))
            .field("secret_key", &SecretLength(self.secret_key().len()))
            .field("region", &self.region)
            .field("use_path_style", &self.use_path_style)
            .field("tls", &self.is_tls())
            .field("log_mode", &self.log_mode)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Renders a secret as its length only
struct SecretLength(usize);

impl fmt::Debug for SecretLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} chars>", self.0)
    }
}

/// Settings for the chunked upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Payloads of at least this many bytes go through multipart upload
    /// in parts of this size (the last part may be smaller)
    pub part_size: usize,

    /// Maximum number of parts in flight
    pub concurrency: usize,
}

impl UploadOptions {
    /// Create options with the given part size and concurrency
    pub fn new(part_size: usize, concurrency: usize) -> Self {
        Self {
            part_size,
            concurrency,
        }
    }

    /// Validate the options
    pub fn validate(&self) -> S3Result<()> {
        if self.part_size < super::MIN_PART_SIZE {
            return Err(S3Error::Configuration(format!(
                "Part size {} is below minimum {}",
                self.part_size,
                super::MIN_PART_SIZE
            )));
        }

        if self.part_size > super::MAX_PART_SIZE {
            return Err(S3Error::Configuration(format!(
                "Part size {} exceeds maximum {}",
                self.part_size,
                super::MAX_PART_SIZE
            )));
        }

        if self.concurrency == 0 {
            return Err(S3Error::Configuration(
                "Upload concurrency must be at least 1".to_string(),
            ));
        }

        if self.concurrency > super::MAX_CONCURRENCY {
            return Err(S3Error::Configuration(format!(
                "Upload concurrency {} exceeds maximum {}",
                self.concurrency,
                super::MAX_CONCURRENCY
            )));
        }

        Ok(())
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::new(super::DEFAULT_PART_SIZE, super::DEFAULT_CONCURRENCY)
    }
}
