//! `stowage.toml` parsing and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stowage_core::StowageConfig;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "stowage.toml";

/// stowage.toml structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Settings handed to the bundle manager
    #[serde(default)]
    pub manager: StowageConfig,

    #[serde(default)]
    pub cli: CliSection,
}

/// Defaults for command arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliSection {
    /// Package used when `--package` is omitted (falls back to the manager's
    /// default package)
    #[serde(default)]
    pub package: Option<String>,

    /// Group that `load` pins bundles for
    #[serde(default = "default_group")]
    pub group: String,

    /// How long `load` waits for a request to finish
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_group() -> String {
    "cli".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for CliSection {
    fn default() -> Self {
        Self {
            package: None,
            group: default_group(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Values given on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub platform: Option<String>,
    pub server: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config: {:?}", path.as_ref()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a string
    pub fn from_str(content: &str) -> Result<Self> {
        let file: Self = toml::from_str(content).context("Failed to parse config")?;
        file.validate()?;
        Ok(file)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.manager.validate()?;

        if self.cli.group.is_empty() {
            anyhow::bail!("cli.group must not be empty");
        }
        if self.cli.timeout_ms == 0 {
            anyhow::bail!("cli.timeout_ms must be at least 1");
        }
        if let Some(package) = &self.cli.package
            && package.is_empty()
        {
            anyhow::bail!("cli.package must not be empty when set");
        }

        Ok(())
    }

    /// Apply command-line overrides on top of the file
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(root) = &overrides.root {
            self.manager = self.manager.with_root_path(root.clone());
        }
        if let Some(platform) = &overrides.platform {
            self.manager = self.manager.with_platform(platform.clone());
        }
        if let Some(server) = &overrides.server {
            self.manager = self.manager.with_server_url(server.clone());
        }
        self
    }

    /// Package to use when a command does not name one
    pub fn package(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .or_else(|| self.cli.package.clone())
            .unwrap_or_else(|| self.manager.default_package.clone())
    }
}

/// Resolve the configuration for a command
///
/// An explicit path must exist. Without one, `stowage.toml` in the working
/// directory is used when present and defaults otherwise.
pub fn resolve(path: Option<&str>, overrides: &Overrides) -> Result<ConfigFile> {
    let file = match path {
        Some(path) => ConfigFile::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            ConfigFile::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => ConfigFile::default(),
    };
    let file = file.with_overrides(overrides);
    file.validate()?;
    Ok(file)
}

/// Check a configuration file and print what it resolves to
pub fn check(path: Option<String>) -> Result<()> {
    let path = path.unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    println!("Checking config: {}", path);

    let file = ConfigFile::from_file(&path)?;

    let manager = &file.manager;
    println!(
        "✓ Bundle directory: {}",
        manager.root_path.join(&manager.directory_name).display()
    );
    println!(
        "✓ Platform: {}",
        manager.platform.as_deref().unwrap_or("(host)")
    );
    println!(
        "✓ Server: {}",
        manager.server_url.as_deref().unwrap_or("(none)")
    );
    println!(
        "✓ Parallelism: {} downloads, {} opens",
        manager.max_parallel_downloads, manager.max_parallel_opens
    );
    println!("✓ Package: {}", file.package(None));
    println!("\nConfig is valid!");

    Ok(())
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;
