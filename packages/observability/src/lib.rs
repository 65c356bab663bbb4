//! # Observability
//!
//! Tracing bootstrap for the Pulse realtime crates.
//!
//! Library crates only ever use `tracing` macros. Binaries call
//! [`init`] or [`init_with_config`] once at startup to decide where the
//! events go:
//!
//! - compact human-readable lines on stderr (default), or
//! - structured JSONL appended to a file, optionally mirrored to stderr.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("pulse-smoke");
//!     tracing::info!("service started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "pulse-smoke".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/tmp/pulse.jsonl".into()),
//!     also_stderr: true,
//! });
//! ```

mod file;

use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file::FileLogWriter;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded once at startup.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Write JSONL to this file instead of stderr.
    pub log_path: Option<PathBuf>,

    /// Mirror events to stderr when writing to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Errors raised while installing the global subscriber.
#[derive(Error, Debug)]
pub enum InitError {
    /// The log file could not be opened.
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    /// A global subscriber is already installed.
    #[error("subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Initialize logging with default settings for `service_name`.
///
/// Silently keeps an existing subscriber if one is already installed.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with a custom configuration.
///
/// Failures are reported on stderr rather than aborting the process.
pub fn init_with_config(config: LogConfig) {
    if let Err(e) = try_init_with_config(config) {
        eprintln!("observability: {e}");
    }
}

/// Fallible variant of [`init_with_config`].
pub fn try_init_with_config(config: LogConfig) -> Result<(), InitError> {
    let filter = env_filter(&config.default_level);

    match &config.log_path {
        Some(path) => {
            let writer = FileLogWriter::new(path)?;

            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(writer)
                .with_filter(filter);

            let stderr_layer = config.also_stderr.then(|| {
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter(&config.default_level))
            });

            tracing_subscriber::registry()
                .with(json_layer)
                .with(stderr_layer)
                .try_init()
                .map_err(|e| InitError::AlreadyInitialized(e.to_string()))?;

            tracing::info!(
                service = %config.service_name,
                log_path = %path.display(),
                "observability initialized"
            );
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .compact()
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| InitError::AlreadyInitialized(e.to_string()))?;

            tracing::debug!(service = %config.service_name, "observability initialized");
        }
    }

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
