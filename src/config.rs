/// Service configuration.
///
/// Read from `tankmon.toml` (or the file named by `TANKMON_CONFIG`). Every
/// field has a default, so a missing file runs the service against the
/// stock backend. `.env` is loaded first so the environment overrides can
/// live there.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ingest::api::{normalize_base, DEFAULT_API_BASE};
use crate::logging::LogLevel;

pub const DEFAULT_CONFIG_PATH: &str = "tankmon.toml";
pub const CONFIG_PATH_ENV: &str = "TANKMON_CONFIG";
pub const API_BASE_ENV: &str = "TANKMON_API_BASE";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse { path: String, message: String },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => write!(f, "Cannot read {}: {}", path, message),
            ConfigError::Parse { path, message } => write!(f, "Invalid TOML in {}: {}", path, message),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base: String,
    /// Tank list refresh. The control-room build runs at 600.
    pub tank_poll_secs: u64,
    pub issues_poll_secs: u64,
    pub request_timeout_secs: u64,
    /// Card health: a reading older than this needs attention.
    pub stale_after_minutes: u64,
    pub log_level: String,
    pub log_file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            tank_poll_secs: 15,
            issues_poll_secs: 15,
            request_timeout_secs: 30,
            stale_after_minutes: 60,
            log_level: "info".to_string(),
            log_file: None,
            console_timestamps: true,
        }
    }
}

impl DashboardConfig {
    /// Parses and validates TOML text. `origin` only labels errors.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut config: DashboardConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.api_base = normalize_base(&config.api_base);
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`; a file that does not exist yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text, &label),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io { path: label, message: e.to_string() }),
        }
    }

    /// `.env`, then the config file, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(base) = lookup(API_BASE_ENV).filter(|b| !b.trim().is_empty()) {
            self.api_base = normalize_base(&base);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.is_empty() {
            return Err(ConfigError::Invalid("api_base must not be empty".to_string()));
        }
        if self.tank_poll_secs == 0 || self.issues_poll_secs == 0 {
            return Err(ConfigError::Invalid("poll intervals must be at least 1 second".to_string()));
        }
        self.log_level
            .parse::<LogLevel>()
            .map(|_| ())
            .map_err(ConfigError::Invalid)
    }

    pub fn min_log_level(&self) -> LogLevel {
        self.log_level.parse().unwrap_or(LogLevel::Info)
    }

    pub fn tank_interval(&self) -> Duration {
        Duration::from_secs(self.tank_poll_secs)
    }

    pub fn issues_interval(&self) -> Duration {
        Duration::from_secs(self.issues_poll_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
