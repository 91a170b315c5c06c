//! Logging setup for applications embedding the binding.
//!
//! The library itself only emits `tracing` events; nothing is printed until
//! the application installs a subscriber, for example with [`init`]:
//!
//! ```no_run
//! use mmcore::logging::{self, LoggingConfig, OutputFormat};
//!
//! # fn main() -> mmcore::Result<()> {
//! logging::init(&LoggingConfig {
//!     level: "debug".into(),
//!     format: OutputFormat::Compact,
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! `RUST_LOG` takes precedence over the configured level.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{Error, Result};

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Multi-line, coloured. For development.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per event, for log aggregation.
    Json,
}

/// The `[logging]` section of a session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,
    /// Output format.
    pub format: OutputFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: OutputFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// The configured level, parsed.
    pub fn parsed_level(&self) -> Result<Level> {
        parse_log_level(&self.level)
    }
}

/// Install a global subscriber.
///
/// Calling this when a subscriber is already installed (in tests, or when the
/// host application set one up) is not an error.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = config.parsed_level()?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let layer = match config.format {
        OutputFormat::Pretty => fmt::layer().pretty().with_thread_names(true).boxed(),
        OutputFormat::Compact => fmt::layer().compact().with_ansi(false).with_target(true).boxed(),
        OutputFormat::Json => fmt::layer().json().with_thread_names(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            // Only fails when a global subscriber or `log` logger is already set.
            tracing::debug!(error = %e, "Logging already initialized");
            Ok(())
        })
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::Config(format!(
            "invalid log level '{}', expected one of trace, debug, info, warn, error",
            level
        ))),
    }
}
