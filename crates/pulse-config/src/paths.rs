//! File system paths.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Resolves where Pulse keeps its files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.pulse)
    base_dir: PathBuf,
}

impl Paths {
    /// Paths rooted at `~/.pulse`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".pulse"),
        })
    }

    /// Paths rooted at a custom directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Config file path (~/.pulse/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Logs directory (~/.pulse/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// JSONL log file (~/.pulse/logs/pulse.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("pulse.jsonl")
    }

    /// Create the base and logs directories.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
