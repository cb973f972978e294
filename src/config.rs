use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Configuration for the version-gate engine and CLI
///
/// The engine itself only needs the running app version and a place to keep
/// the cached policy; everything else here is for the CLI surface.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path (default: `.version-gate/` in current directory)
    pub data_dir: PathBuf,

    /// Version string of the running app, as reported by the host
    pub app_version: Option<String>,

    /// Output format: "human" (default) or "json"
    pub output_format: String,

    /// Log level: "info", "debug", "warn", "error" (default: "info")
    pub log_level: String,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        let data_dir = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".version-gate");

        Config {
            data_dir,
            app_version: None,
            output_format: "human".to_string(),
            log_level: "info".to_string(),
        }
    }

    /// Create config with custom data directory
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            ..Config::new()
        }
    }

    /// Get the data directory path
    pub fn get_data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Set data directory
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.data_dir = dir;
    }

    /// Set the running app version
    pub fn set_app_version(&mut self, version: String) {
        self.app_version = Some(version);
    }

    /// Running app version, or a config error if the host never supplied one
    pub fn require_app_version(&self) -> Result<&str> {
        self.app_version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("app version is not set".to_string()))
    }

    /// Get output format
    pub fn get_output_format(&self) -> &str {
        &self.output_format
    }

    /// Set output format ("human" or "json")
    pub fn set_output_format(&mut self, format: String) {
        self.output_format = format;
    }

    /// Get log level
    pub fn get_log_level(&self) -> &str {
        &self.log_level
    }

    /// Set log level
    pub fn set_log_level(&mut self, level: String) {
        self.log_level = level;
    }

    /// Path of the cached policy blob
    pub fn policy_cache_path(&self) -> PathBuf {
        self.data_dir.join("policy.json")
    }

    /// Path of the first-launch marker file
    pub fn launch_marker_path(&self) -> PathBuf {
        self.data_dir.join("launched")
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `VERSION_GATE_DATA_DIR`: override data directory
    /// - `VERSION_GATE_APP_VERSION`: running app version
    /// - `VERSION_GATE_OUTPUT_FORMAT`: "human" or "json"
    /// - `VERSION_GATE_LOG_LEVEL`: log level
    pub fn from_env() -> Self {
        let mut config = Config::new();

        if let Ok(dir) = env::var("VERSION_GATE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(version) = env::var("VERSION_GATE_APP_VERSION") {
            config.app_version = Some(version);
        }

        if let Ok(format) = env::var("VERSION_GATE_OUTPUT_FORMAT") {
            config.output_format = format;
        }

        if let Ok(level) = env::var("VERSION_GATE_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
