//! Configuration, paths and logging bootstrap for the Pulse realtime layer.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, OutboxSettings, DEFAULT_ACK_TIMEOUT_MS, DEFAULT_BASE_BACKOFF_MS, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_ATTEMPTS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_to_file};
pub use paths::Paths;
