//! Wire-level request/response logging
//!
//! Attached to a client only in [`LogMode::WireTrace`](super::LogMode). The
//! interceptor is read-only, so signing, retries and timeouts behave exactly
//! as without it. Signing and retry internals are logged by the SDK's own
//! `aws_sigv4` / `aws_smithy_runtime` tracing targets.

use aws_sdk_s3::config::interceptors::{
    AfterDeserializationInterceptorContextRef, BeforeTransmitInterceptorContextRef,
};
use aws_sdk_s3::config::{ConfigBag, Intercept, RuntimeComponents};
use aws_sdk_s3::error::BoxError;
use tracing::debug;

/// Tracing target for wire logs
pub const WIRE_TARGET: &str = "s3_utils::wire";

/// Bodies longer than this are cut in logs
const MAX_LOGGED_BODY: usize = 4096;

/// Headers whose values are never logged
const REDACTED_HEADERS: &[&str] = &["authorization", "x-amz-security-token"];

/// Logs method, URI, headers and in-memory bodies of every attempt
#[derive(Debug, Default)]
pub struct WireLogInterceptor;

impl WireLogInterceptor {
    /// Create the interceptor
    pub fn new() -> Self {
        Self
    }
}

impl Intercept for WireLogInterceptor {
    fn name(&self) -> &'static str {
        "WireLogInterceptor"
    }

    fn read_before_transmit(
        &self,
        context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let request = context.request();
        debug!(
            target: WIRE_TARGET,
            method = request.method(),
            uri = request.uri(),
            headers = %format_headers(request.headers().iter()),
            body = %format_body(request.body().bytes()),
            "request"
        );
        Ok(())
    }

    fn read_after_deserialization(
        &self,
        context: &AfterDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let response = context.response();
        debug!(
            target: WIRE_TARGET,
            status = response.status().as_u16(),
            headers = %format_headers(response.headers().iter()),
            body = %format_body(response.body().bytes()),
            "response"
        );
        Ok(())
    }
}

/// Render headers as `name: value` pairs, redacting credentials
fn format_headers<'a>(headers: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    headers
        .map(|(name, value)| {
            if REDACTED_HEADERS
                .iter()
                .any(|redacted| name.eq_ignore_ascii_case(redacted))
            {
                format!("{}: <redacted>", name)
            } else {
                format!("{}: {}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an in-memory body; streaming bodies are not buffered for logging
fn format_body(body: Option<&[u8]>) -> String {
    match body {
        None => "<streaming>".to_string(),
        Some([]) => "<empty>".to_string(),
        Some(bytes) if bytes.len() > MAX_LOGGED_BODY => format!(
            "{}... ({} bytes)",
            String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY]),
            bytes.len()
        ),
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_are_redacted() {
        let headers = vec![
            ("Authorization", "AWS4-HMAC-SHA256 Credential=AKIA/..."),
            ("x-amz-date", "20250101T000000Z"),
            ("X-Amz-Security-Token", "token"),
        ];
        let rendered = format_headers(headers.into_iter());
        assert_eq!(
            rendered,
            "Authorization: <redacted>, x-amz-date: 20250101T000000Z, X-Amz-Security-Token: <redacted>"
        );
    }

    #[test]
    fn test_body_rendering() {
        assert_eq!(format_body(None), "<streaming>");
        assert_eq!(format_body(Some(&b""[..])), "<empty>");
        assert_eq!(format_body(Some(&b"hello world"[..])), "hello world");

        let large = vec![b'a'; MAX_LOGGED_BODY + 10];
        let rendered = format_body(Some(large.as_slice()));
        assert!(rendered.ends_with(&format!("... ({} bytes)", MAX_LOGGED_BODY + 10)));
    }
}
