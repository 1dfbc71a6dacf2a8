//! Structured logging setup.
//!
//! Every component logs through `tracing`; this module installs the subscriber.
//! Configuration comes from the environment:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `DECLROUTE_LOG_LEVEL` | trace/debug/info/warn/error | `info` |
//! | `DECLROUTE_LOG_FORMAT` | json/pretty | `json` |
//! | `DECLROUTE_LOG_ASYNC` | true/false | `false` |
//! | `DECLROUTE_LOG_TARGETS` | comma separated filter directives | none |
//! | `DECLROUTE_LOG_LOCATION` | true/false | `false` |
//!
//! `RUST_LOG`, when set, takes precedence over `DECLROUTE_LOG_LEVEL`.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// JSON for production, pretty for development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a background thread instead of blocking on stdout.
    pub async_logging: bool,
    /// Extra filter directives, e.g. `declroute::router=debug`.
    pub target_filter: Option<String>,
    pub include_location: bool,
    /// Write to stderr, leaving stdout to the program's own output.
    pub stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: false,
            target_filter: None,
            include_location: false,
            stderr: false,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("DECLROUTE_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("DECLROUTE_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            async_logging: lookup("DECLROUTE_LOG_ASYNC")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.async_logging),
            target_filter: lookup("DECLROUTE_LOG_TARGETS").filter(|v| !v.trim().is_empty()),
            include_location: lookup("DECLROUTE_LOG_LOCATION")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.include_location),
            stderr: defaults.stderr,
        }
    }

    /// Verbose, human-readable output for local runs.
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
            stderr: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Install the global subscriber.
///
/// With async logging the returned guard flushes buffered lines when dropped;
/// keep it alive for the life of the process.
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let (writer, guard) = match (config.async_logging, config.stderr) {
        (true, true) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        (true, false) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        (false, true) => (BoxMakeWriter::new(std::io::stderr), None),
        (false, false) => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
