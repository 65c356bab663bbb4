//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// The outbox defaults below mirror `pulse_outbox::DEFAULT_*`. The
// `pulse-service` tests fail if the two sets drift apart.

/// Default backoff unit in milliseconds.
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1000;

/// Default attempt bound per queued request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default acknowledgment timeout in milliseconds.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 10_000;

const ENV_LOG_LEVEL: &str = "PULSE_LOG_LEVEL";
const ENV_BASE_BACKOFF_MS: &str = "PULSE_BASE_BACKOFF_MS";
const ENV_MAX_ATTEMPTS: &str = "PULSE_MAX_ATTEMPTS";
const ENV_ACK_TIMEOUT_MS: &str = "PULSE_ACK_TIMEOUT_MS";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Outbound queue tuning.
    #[serde(default)]
    pub outbox: OutboxSettings,
}

/// Outbound queue tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxSettings {
    /// Retry `n` waits `base_backoff_ms * n`.
    pub base_backoff_ms: u64,
    /// Attempts before a queued request fails for good.
    pub max_attempts: u32,
    /// How long to wait for an acknowledgment.
    pub ack_timeout_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            outbox: OutboxSettings::default(),
        }
    }
}

impl Config {
    /// Load `~/.pulse/config.json` if present, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            debug!(path = %config_path.display(), "Loading config file");
            Self::load_from_file(&config_path)?
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            log_level = %config.log_level,
            base_backoff_ms = config.outbox.base_backoff_ms,
            max_attempts = config.outbox.max_attempts,
            ack_timeout_ms = config.outbox.ack_timeout_ms,
            "Config loaded"
        );
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply `PULSE_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            debug!(key = ENV_LOG_LEVEL, value = %level, "Applied environment override");
            self.log_level = level;
        }
        if let Some(value) = lookup(ENV_BASE_BACKOFF_MS) {
            self.outbox.base_backoff_ms = parse_var(ENV_BASE_BACKOFF_MS, &value)?;
            debug!(key = ENV_BASE_BACKOFF_MS, value = self.outbox.base_backoff_ms, "Applied environment override");
        }
        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            self.outbox.max_attempts = parse_var(ENV_MAX_ATTEMPTS, &value)?;
            debug!(key = ENV_MAX_ATTEMPTS, value = self.outbox.max_attempts, "Applied environment override");
        }
        if let Some(value) = lookup(ENV_ACK_TIMEOUT_MS) {
            self.outbox.ack_timeout_ms = parse_var(ENV_ACK_TIMEOUT_MS, &value)?;
            debug!(key = ENV_ACK_TIMEOUT_MS, value = self.outbox.ack_timeout_ms, "Applied environment override");
        }
        Ok(())
    }

    /// Reject settings the outbox cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.outbox.max_attempts == 0 {
            return Err(CoreError::Config("outbox.max_attempts must be at least 1".into()));
        }
        if self.outbox.ack_timeout_ms == 0 {
            return Err(CoreError::Config("outbox.ack_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("{key} has invalid value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.outbox.base_backoff_ms, 1000);
        assert_eq!(config.outbox.max_attempts, 3);
        assert_eq!(config.outbox.ack_timeout_ms, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "log_level": "debug",
            "outbox": { "base_backoff_ms": 250 }
        }"#;
        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.outbox.base_backoff_ms, 250);
        assert_eq!(config.outbox.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.outbox.ack_timeout_ms, DEFAULT_ACK_TIMEOUT_MS);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{}").unwrap();

        assert_eq!(Config::load_from_file(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            Config::load_from_file(&config_path),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.outbox.max_attempts = 5;
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.outbox, OutboxSettings::default());
    }

    #[test]
    fn test_load_reads_config_file() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        std::fs::write(
            paths.config_file(),
            r#"{ "outbox": { "max_attempts": 6, "ack_timeout_ms": 2500 } }"#,
        )
        .unwrap();

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.outbox.max_attempts, 6);
        assert_eq!(config.outbox.ack_timeout_ms, 2500);
        assert_eq!(config.outbox.base_backoff_ms, DEFAULT_BASE_BACKOFF_MS);
    }

    #[test]
    fn test_load_rejects_invalid_file_settings() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        std::fs::write(paths.config_file(), r#"{ "outbox": { "max_attempts": 0 } }"#).unwrap();

        assert!(matches!(Config::load(&paths), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("PULSE_LOG_LEVEL", "trace"),
                ("PULSE_BASE_BACKOFF_MS", "50"),
                ("PULSE_MAX_ATTEMPTS", " 7 "),
                ("PULSE_ACK_TIMEOUT_MS", "1500"),
            ]))
            .unwrap();

        assert_eq!(config.log_level, "trace");
        assert_eq!(config.outbox.base_backoff_ms, 50);
        assert_eq!(config.outbox.max_attempts, 7);
        assert_eq!(config.outbox.ack_timeout_ms, 1500);
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("PULSE_MAX_ATTEMPTS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("PULSE_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.outbox.max_attempts = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }
}
