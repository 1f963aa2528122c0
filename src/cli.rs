/*!
 * Shared command-line plumbing for the s3-utils binaries
 *
 * Every binary flattens [`S3Args`] for the endpoint settings, builds one
 * client, runs a single operation and exits through [`exit_with`].
 */

use crate::logging;
use crate::s3::{EndpointConfig, S3Client, S3Error, DEFAULT_MAX_ATTEMPTS, DEFAULT_REGION};
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Process exit code on success
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code on any failure
pub const EXIT_FATAL: i32 = 1;

/// Endpoint, credentials and client behaviour
#[derive(Debug, Clone, Args)]
pub struct S3Args {
    /// S3 endpoint URL (https:// enables TLS)
    #[arg(long = "s3-url", env = "S3_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Access key
    #[arg(long = "s3-access-key", env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long = "s3-secret-key", env = "S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Region used for request signing
    #[arg(long = "s3-region", env = "S3_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Verbosity level (0-3 log levels, 4 adds wire tracing)
    #[arg(short = 'v', long, env = "VERBOSITY", default_value_t = 0)]
    pub verbosity: u8,

    /// Operation timeout in seconds
    #[arg(long, env = "S3_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Attempts per request, including the first
    #[arg(long, env = "S3_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl S3Args {
    /// Assemble the endpoint configuration
    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig::build(
            self.url.clone().unwrap_or_default(),
            self.access_key.clone().unwrap_or_default(),
            self.secret_key.clone().unwrap_or_default(),
        )
        .with_region(self.region.clone())
        .with_log_mode(logging::log_mode_for(self.verbosity))
        .with_timeouts(
            Duration::from_secs(self.timeout_secs),
            crate::s3::DEFAULT_CONNECT_TIMEOUT,
        )
        .with_max_attempts(self.max_attempts)
    }

    /// Build a client, requiring URL and keys when `require_credentials`
    pub fn client(&self, require_credentials: bool) -> anyhow::Result<S3Client> {
        let config = self.endpoint_config();
        if require_credentials {
            config.require_credentials()?;
        }
        Ok(S3Client::new(config))
    }
}

/// Target bucket
#[derive(Debug, Clone, Args)]
pub struct BucketArgs {
    /// Bucket name
    #[arg(long, env = "BUCKET", value_parser = NonEmptyStringValueParser::new())]
    pub bucket: String,
}

/// Target object
#[derive(Debug, Clone, Args)]
pub struct ObjectArgs {
    /// Bucket name
    #[arg(long, env = "BUCKET", value_parser = NonEmptyStringValueParser::new())]
    pub bucket: String,

    /// Object key
    #[arg(long, env = "KEY", value_parser = NonEmptyStringValueParser::new())]
    pub key: String,
}

/// Listing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `field: 'value'` per line
    #[default]
    Text,

    /// One JSON object per line
    Json,
}

/// Write one listing entry as a line
pub fn write_entry<W, T>(
    out: &mut W,
    format: OutputFormat,
    field: &str,
    value: &str,
    entry: &T,
) -> anyhow::Result<()>
where
    W: Write + ?Sized,
    T: Serialize,
{
    match format {
        OutputFormat::Text => writeln!(out, "{}: '{}'", field, value)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, entry)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Token cancelled on the first Ctrl-C. Must be called inside a runtime.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            trigger.cancel();
        }
    });
    token
}

/// Report the outcome and terminate the process
pub fn exit_with(result: anyhow::Result<()>) -> ! {
    let code = match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            // S3Error renders its own cause chain
            if e.downcast_ref::<S3Error>().is_some() {
                eprintln!("error: {}", e);
            } else {
                eprintln!("error: {:#}", e);
            }
            EXIT_FATAL
        }
    };
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::{BucketEntry, LogMode, ObjectEntry};
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        s3: S3Args,

        #[command(flatten)]
        object: ObjectArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    }

    #[test]
    fn test_parse_flags() {
        let cli = TestCli::try_parse_from([
            "test",
            "--s3-url",
            "https://s3.example.com",
            "--s3-access-key",
            "AKIA",
            "--s3-secret-key",
            "secret",
            "--bucket",
            "backups",
            "--key",
            "hello.txt",
            "-v",
            "4",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.object.bucket, "backups");
        assert_eq!(cli.object.key, "hello.txt");
        assert_eq!(cli.output, OutputFormat::Json);

        let config = cli.s3.endpoint_config();
        assert!(config.is_tls());
        assert_eq!(config.access_key(), "AKIA");
        assert_eq!(config.log_mode(), LogMode::WireTrace);
        assert_eq!(config.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_missing_bucket_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "--key", "k"]).is_err());
    }

    #[test]
    fn test_empty_bucket_or_key_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "--bucket", "", "--key", "k"]).is_err());
        assert!(TestCli::try_parse_from(["test", "--bucket", "b", "--key", ""]).is_err());
    }

    #[tokio::test]
    async fn test_credentials_required_for_transfers() {
        let cli = TestCli::try_parse_from([
            "test",
            "--s3-url",
            "http://localhost:9000",
            "--bucket",
            "b",
            "--key",
            "k",
        ])
        .unwrap();

        let err = cli.s3.client(true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<S3Error>(),
            Some(S3Error::Configuration(_))
        ));
        assert!(cli.s3.client(false).is_ok());
    }

    #[test]
    fn test_write_entry_formats() {
        let mut out = Vec::new();
        let bucket = BucketEntry {
            name: "backups".to_string(),
        };
        write_entry(&mut out, OutputFormat::Text, "name", &bucket.name, &bucket).unwrap();

        let object = ObjectEntry {
            key: "logs/1.txt".to_string(),
            size: 3,
            etag: None,
        };
        write_entry(&mut out, OutputFormat::Json, "key", &object.key, &object).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name: 'backups'\n{\"key\":\"logs/1.txt\",\"size\":3}\n"
        );
    }
}
