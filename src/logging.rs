/*!
 * Logging and tracing initialization
 *
 * All output goes to stderr; stdout carries listing output and downloaded
 * bytes only.
 */

use crate::s3::LogMode;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Verbosity at which wire-level tracing is switched on
pub const WIRE_TRACE_VERBOSITY: u8 = 4;

/// SDK targets that report signing, retries and protocol events
const SDK_TARGETS: &[&str] = &["aws_sigv4", "aws_smithy_runtime", "aws_sdk_s3"];

/// Log level of this crate for a verbosity count
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Client log mode for a verbosity count
pub fn log_mode_for(verbosity: u8) -> LogMode {
    if verbosity >= WIRE_TRACE_VERBOSITY {
        LogMode::WireTrace
    } else {
        LogMode::Quiet
    }
}

/// Filter directives used when `RUST_LOG` is not set
pub fn default_directives(verbosity: u8) -> String {
    let level = level_for(verbosity).as_str().to_ascii_lowercase();
    let mut directives = format!("warn,s3_utils={}", level);
    if log_mode_for(verbosity) == LogMode::WireTrace {
        for target in SDK_TARGETS {
            directives.push_str(&format!(",{}=trace", target));
        }
    }
    directives
}

/// Initialize stderr logging for the given verbosity
///
/// `RUST_LOG` takes precedence over the verbosity-derived filter. Calling
/// this more than once is harmless; later calls leave the first subscriber
/// in place.
pub fn init_logging(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("s3_utils=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    });
}
