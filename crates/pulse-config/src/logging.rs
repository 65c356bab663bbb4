//! Logging initialization.
//!
//! Thin wrappers over the observability crate so binaries get the same
//! subscriber setup.

use observability::LogConfig;
use std::path::Path;

const SERVICE_NAME: &str = "pulse";

/// Initialize compact stderr logging.
///
/// `RUST_LOG` overrides `level` when set.
pub fn init_logging(level: &str) {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        ..Default::default()
    });
}

/// Initialize JSONL logging to `path`, mirrored to stderr.
pub fn init_logging_to_file(level: &str, path: &Path) {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: Some(path.to_path_buf()),
        also_stderr: true,
    });
}
