//! Error types for S3 operations

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::io;
use thiserror::Error;

/// Result type alias for S3 operations
pub type S3Result<T> = Result<T, S3Error>;

/// Errors that can occur during S3 operations
#[derive(Error, Debug, Clone)]
pub enum S3Error {
    /// Missing or unusable configuration, detected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A list request failed
    #[error("{context}: {source}")]
    ListFailure {
        context: String,
        source: Box<S3Error>,
    },

    /// An upload or download failed
    #[error("{context}: {source}")]
    TransferFailure {
        context: String,
        source: Box<S3Error>,
    },

    /// Object not found in bucket
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    Sdk(String),

    /// S3 service error with specific error code
    #[error("S3 service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Access denied error
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl S3Error {
    /// Wrap as a list failure for the given stage.
    ///
    /// Errors that already carry their own meaning for the caller
    /// (configuration, cancellation, missing object) pass through unchanged.
    pub fn list_failure<S: Into<String>>(self, context: S) -> Self {
        if self.is_terminal() {
            return self;
        }
        S3Error::ListFailure {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Wrap as a transfer failure for the given stage
    pub fn transfer_failure<S: Into<String>>(self, context: S) -> Self {
        if self.is_terminal() {
            return self;
        }
        S3Error::TransferFailure {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if the error reports a missing object
    pub fn is_not_found(&self) -> bool {
        matches!(self, S3Error::NotFound { .. })
    }

    /// Check if the error reports a cancelled operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, S3Error::Cancelled)
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            S3Error::Configuration(_)
                | S3Error::NotFound { .. }
                | S3Error::Cancelled
                | S3Error::ListFailure { .. }
                | S3Error::TransferFailure { .. }
        )
    }
}

impl From<io::Error> for S3Error {
    fn from(err: io::Error) -> Self {
        S3Error::Io(err.to_string())
    }
}

/// Convert AWS SDK errors to S3Error
impl<E, R> From<SdkError<E, R>> for S3Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        match &error {
            SdkError::TimeoutError(_) => S3Error::Timeout(DisplayErrorContext(&error).to_string()),
            SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
                S3Error::Network(DisplayErrorContext(&error).to_string())
            }
            SdkError::ServiceError(context) => {
                let err = context.err();
                let code = err.code().unwrap_or("Unknown");
                let message = err.message().unwrap_or_default().to_string();
                match code {
                    "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
                        S3Error::AccessDenied(format!("{}: {}", code, message))
                    }
                    _ => S3Error::Service {
                        code: code.to_string(),
                        message,
                    },
                }
            }
            _ => S3Error::Sdk(DisplayErrorContext(&error).to_string()),
        }
    }
}
