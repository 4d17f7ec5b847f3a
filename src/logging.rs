//! Structured logging utilities for swiftrun
//!
//! The runner shares a terminal with the program it hands off to, so it is
//! quiet by default: only warnings and errors are shown unless `RUST_LOG`
//! or `SWIFTRUN_DEBUG` asks for more.
//!
//! # Log Format Conventions
//!
//! - `stage`: The pipeline stage ("acquire", "synthesize", "build", "install", "handoff")
//! - `script`: Canonical script name
//! - `status`: The result status ("fresh", "stale", "success", "error")
//!
//! # Examples
//!
//! ```rust
//! use swiftrun::logging::{stages, status};
//! use tracing::info;
//!
//! info!(
//!     stage = stages::BUILD,
//!     script = "hello",
//!     status = status::SUCCESS,
//!     duration_ms = 1200u64,
//!     "build finished"
//! );
//! ```

use std::{fmt as std_fmt, io};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

/// Custom formatter that shows "swiftrun" instead of full module path
struct SwiftrunFormatter {
    with_ansi: bool,
}

impl<S, N> FormatEvent<S, N> for SwiftrunFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "{} ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f")
        )?;

        if self.with_ansi {
            let level_style = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m", // Red
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::TRACE => "\x1b[35m", // Magenta
            };
            write!(writer, "{}{:5}(swiftrun)\x1b[0m: ", level_style, meta.level())?;
        } else {
            write!(writer, "{:5}(swiftrun): ", meta.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (default on a terminal)
    Pretty,
    /// Plain format (CI, redirected stderr)
    Compact,
    /// JSON format (for log aggregation systems)
    Json,
}

impl LogFormat {
    /// Parse from a `SWIFTRUN_LOG_FORMAT` value
    pub fn parse(value: Option<&str>, ci: bool) -> Self {
        match value.unwrap_or_default().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            _ => {
                if ci {
                    Self::Compact
                } else {
                    Self::Pretty
                }
            }
        }
    }

    pub fn from_env() -> Self {
        let value = std::env::var("SWIFTRUN_LOG_FORMAT").ok();
        Self::parse(value.as_deref(), std::env::var("CI").is_ok())
    }
}

/// Default filter directive when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize the global tracing subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "debug", "info", "warn")
/// - `SWIFTRUN_DEBUG`: If set, defaults to debug level
/// - `SWIFTRUN_LOG_FORMAT`: Set format ("pretty", "compact", "json")
/// - `CI`: If set, defaults to compact format
pub fn init() {
    let verbose = std::env::var_os(crate::merger::ENV_DEBUG).is_some();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    match LogFormat::from_env() {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .event_format(SwiftrunFormatter { with_ansi: true })
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .event_format(SwiftrunFormatter { with_ansi: false })
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_ansi(false)
                        .with_writer(io::stderr)
                        .json(),
                )
                .init();
        }
    }
}

/// Stage names for consistent logging
pub mod stages {
    pub const LOCK: &str = "lock";
    pub const ACQUIRE: &str = "acquire";
    pub const PLAN: &str = "plan";
    pub const SYNTHESIZE: &str = "synthesize";
    pub const BUILD: &str = "build";
    pub const INSTALL: &str = "install";
    pub const HANDOFF: &str = "handoff";
}

/// Status values for consistent logging
pub mod status {
    pub const FRESH: &str = "fresh";
    pub const STALE: &str = "stale";
    pub const SUCCESS: &str = "success";
    pub const SKIPPED: &str = "skipped";
    pub const ERROR: &str = "error";
}
