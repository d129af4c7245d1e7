use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub mpd: MpdConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            logging: LoggingConfig::default(),
            mpd: MpdConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log output to stderr. Stdout is reserved for reported events.
    #[serde(default = "default_stderr_enabled")]
    pub stderr: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stderr: default_stderr_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Settings of the music daemon connection, as written in the `[mpd]` table.
///
/// Durations are seconds. A negative `timeout` (or none at all) disables
/// idle timeout reporting; a negative `retry_in` makes any connection
/// failure fatal.
#[derive(Debug, Clone, Deserialize)]
pub struct MpdConfig {
    /// Host name, or an absolute path to a Unix-domain socket.
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<Password>,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default = "default_retry_in")]
    pub retry_in: f64,
    /// FIFO that interrupts the retry wait when written to.
    #[serde(default)]
    pub retry_fifo: Option<PathBuf>,
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            port: default_port(),
            password: None,
            timeout: None,
            retry_in: default_retry_in(),
            retry_fifo: None,
        }
    }
}

impl MpdConfig {
    /// Idle response timeout, `None` when disabled.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.and_then(seconds_to_duration)
    }

    /// Delay before reconnecting, `None` when retrying is disabled.
    pub fn retry_interval(&self) -> Option<Duration> {
        seconds_to_duration(self.retry_in)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(password) = &self.password {
            if password.expose().contains(['\n', '\r']) {
                return Err(ValidationError::PasswordLineBreak);
            }
        }
        if let Some(timeout) = self.timeout {
            check_seconds("timeout", timeout)?;
        }
        check_seconds("retry_in", self.retry_in)
    }
}

/// A secret that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("password contains a line break")]
    PasswordLineBreak,
    #[error("'{field}' is invalid: {value}")]
    InvalidDuration { field: &'static str, value: f64 },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        self.mpd.validate()
    }
}

fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

// Negative values mean "disabled"; anything else must fit a Duration.
fn check_seconds(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 || Duration::try_from_secs_f64(value).is_ok() {
        return Ok(());
    }
    Err(ValidationError::InvalidDuration { field, value })
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_stderr_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    6600
}

fn default_retry_in() -> f64 {
    10.0
}
