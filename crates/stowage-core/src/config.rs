//! Manager configuration types

use crate::{LogLevel, StowageError, StowageResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Package name used when a request does not name one
pub const DEFAULT_PACKAGE: &str = "Default";

/// How much of the manager's own logging reaches the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    /// Everything at or above the configured level
    #[default]
    All,
    /// Only errors, regardless of the configured level
    JustErrors,
}

impl LogMode {
    /// Combine the mode with a configured level into the level that applies
    pub fn effective_level(&self, configured: LogLevel) -> LogLevel {
        match self {
            LogMode::All => configured,
            LogMode::JustErrors => configured.max(LogLevel::Error),
        }
    }
}

/// Configuration for a bundle manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StowageConfig {
    /// Size of one download buffer slot in KiB
    #[serde(default = "default_download_buffer_kb")]
    pub download_buffer_kb: usize,

    /// Maximum concurrent downloads; also the number of buffer slots
    #[serde(default = "default_max_parallel")]
    pub max_parallel_downloads: usize,

    /// Maximum concurrent opens from local storage
    #[serde(default = "default_max_parallel")]
    pub max_parallel_opens: usize,

    /// Base URL of the bundle server; `None` or empty disables downloads
    #[serde(default)]
    pub server_url: Option<String>,

    /// Folder that contains the bundle directory
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Name of the bundle directory under `root_path`
    #[serde(default = "default_directory_name")]
    pub directory_name: String,

    /// Platform folder name (None = host platform)
    #[serde(default)]
    pub platform: Option<String>,

    /// Resolve assets from development sources instead of bundles
    #[serde(default)]
    pub simulate: bool,

    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log filtering mode
    #[serde(default)]
    pub log_mode: LogMode,

    /// Interval between scheduling ticks for self-driven loops
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Package used by requests that do not name one
    #[serde(default = "default_package")]
    pub default_package: String,
}

fn default_download_buffer_kb() -> usize {
    512
}

fn default_max_parallel() -> usize {
    4
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_directory_name() -> String {
    "AssetBundles".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval() -> u64 {
    16
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            download_buffer_kb: default_download_buffer_kb(),
            max_parallel_downloads: default_max_parallel(),
            max_parallel_opens: default_max_parallel(),
            server_url: None,
            root_path: default_root_path(),
            directory_name: default_directory_name(),
            platform: None,
            simulate: false,
            log_level: default_log_level(),
            log_mode: LogMode::default(),
            tick_interval_ms: default_tick_interval(),
            default_package: default_package(),
        }
    }
}

impl StowageConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> StowageResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a TOML document
    pub fn from_toml_str(text: &str) -> StowageResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values can drive a manager
    pub fn validate(&self) -> StowageResult<()> {
        if self.max_parallel_downloads == 0 {
            return Err(StowageError::ConfigError(
                "max_parallel_downloads must be at least 1".to_string(),
            ));
        }
        if self.max_parallel_opens == 0 {
            return Err(StowageError::ConfigError(
                "max_parallel_opens must be at least 1".to_string(),
            ));
        }
        if self.download_buffer_kb == 0 {
            return Err(StowageError::ConfigError(
                "download_buffer_kb must be at least 1".to_string(),
            ));
        }
        if self.directory_name.is_empty() {
            return Err(StowageError::ConfigError(
                "directory_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether bundles may be fetched from a server
    pub fn uses_server(&self) -> bool {
        self.server_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Download buffer slot size in bytes
    pub fn download_buffer_bytes(&self) -> usize {
        self.download_buffer_kb * 1024
    }

    /// The level that applies after the log mode is taken into account
    pub fn effective_log_level(&self) -> LogLevel {
        self.log_mode
            .effective_level(LogLevel::parse(&self.log_level))
    }

    /// Set the server URL
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the root folder
    pub fn with_root_path(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_path = root.into();
        self
    }

    /// Set the platform folder name
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Set both concurrency limits
    pub fn with_parallelism(mut self, downloads: usize, opens: usize) -> Self {
        self.max_parallel_downloads = downloads;
        self.max_parallel_opens = opens;
        self
    }

    /// Enable or disable simulate mode
    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;

#[cfg(test)]
#[path = "config/config_parameterized_tests.rs"]
mod config_parameterized_tests;
