//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/storepulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/storepulse/` (~/.config/storepulse/)
//! - Data: `$XDG_DATA_HOME/storepulse/` (~/.local/share/storepulse/)
//! - State/Logs: `$XDG_STATE_HOME/storepulse/` (~/.local/state/storepulse/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Recommendation defaults
    #[serde(default)]
    pub recommend: RecommendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend base URL (e.g., `http://localhost:5000`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

/// Defaults for the recommendation panels
#[derive(Debug, Deserialize, Clone)]
pub struct RecommendConfig {
    /// Number of supplier recommendations to request
    #[serde(default = "default_recommend_count")]
    pub suppliers: usize,

    /// Number of product pairs to request
    #[serde(default = "default_recommend_count")]
    pub product_pairs: usize,

    /// Preferred supplier country
    #[serde(default = "default_preferred_country")]
    pub preferred_country: String,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            suppliers: default_recommend_count(),
            product_pairs: default_recommend_count(),
            preferred_country: default_preferred_country(),
        }
    }
}

fn default_recommend_count() -> usize {
    5
}

fn default_preferred_country() -> String {
    "France".to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/storepulse/config.toml` (~/.config/storepulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("storepulse").join("config.toml")
    }

    /// Returns the data directory path (for the durable token)
    ///
    /// `$XDG_DATA_HOME/storepulse/` (~/.local/share/storepulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("storepulse")
    }

    /// Returns the state directory path (for logs and the session token)
    ///
    /// `$XDG_STATE_HOME/storepulse/` (~/.local/state/storepulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("storepulse")
    }

    /// Returns the durable token file path
    ///
    /// Survives machine restarts; written by a remember-me login.
    pub fn durable_token_path() -> PathBuf {
        Self::data_dir().join("access_token")
    }

    /// Returns the session-scoped token file path
    ///
    /// Written by a plain login; removed on logout together with the
    /// durable one.
    pub fn session_token_path() -> PathBuf {
        Self::state_dir().join("session_token")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/storepulse/storepulse.log` (~/.local/state/storepulse/storepulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("storepulse.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
