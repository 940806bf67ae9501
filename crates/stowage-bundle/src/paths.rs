//! Local storage layout and server URLs.

use crate::{BundleError, BundleResult, Catalog, MANIFEST_SUFFIX, Platform};
use std::path::{Path, PathBuf};
use stowage_core::StowageConfig;

/// Where bundles, manifests and catalogs live on disk and on the server.
///
/// Bundles sit at `<root>/<directory>/<platform>/<bundle>` locally and at
/// `<server>/<platform>/<bundle>` remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    platform_dir: PathBuf,
    platform: String,
    server_url: Option<String>,
}

impl StoragePaths {
    /// Create paths rooted at `bundle_dir` (the `<root>/<directory>` folder).
    #[must_use]
    pub fn new(bundle_dir: impl Into<PathBuf>, platform: &str) -> Self {
        let platform_dir = bundle_dir.into().join(platform);
        Self {
            platform_dir,
            platform: platform.to_string(),
            server_url: None,
        }
    }

    /// Derive paths from a manager configuration. Without an explicit
    /// platform the host platform is used.
    pub fn from_config(config: &StowageConfig) -> BundleResult<Self> {
        let platform = match &config.platform {
            Some(name) => name.clone(),
            None => Platform::current()
                .map(|p| p.as_str().to_string())
                .ok_or_else(|| BundleError::UnsupportedPlatform(std::env::consts::OS.to_string()))?,
        };

        let paths = Self::new(config.root_path.join(&config.directory_name), &platform);
        Ok(match config.server_url.as_deref() {
            Some(url) if !url.is_empty() => paths.with_server(url),
            _ => paths,
        })
    }

    /// Set the server base URL.
    #[must_use]
    pub fn with_server(mut self, url: &str) -> Self {
        self.server_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Folder holding this platform's bundles.
    #[must_use]
    pub fn platform_dir(&self) -> &Path {
        &self.platform_dir
    }

    /// Platform folder name.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Local file of a bundle.
    #[must_use]
    pub fn bundle_path(&self, bundle: &str) -> PathBuf {
        self.platform_dir.join(bundle)
    }

    /// Local manifest file of a package.
    #[must_use]
    pub fn manifest_path(&self, package: &str) -> PathBuf {
        self.platform_dir.join(format!("{package}{MANIFEST_SUFFIX}"))
    }

    /// Local catalog file of a package.
    #[must_use]
    pub fn catalog_path(&self, package: &str) -> PathBuf {
        self.platform_dir.join(Catalog::file_name(package))
    }

    /// Server URL of a bundle, if a server is configured.
    #[must_use]
    pub fn download_url(&self, bundle: &str) -> Option<String> {
        self.server_url
            .as_ref()
            .map(|base| format!("{base}/{}/{bundle}", self.platform))
    }

    /// Server URL of a package manifest, if a server is configured.
    #[must_use]
    pub fn manifest_url(&self, package: &str) -> Option<String> {
        self.download_url(&format!("{package}{MANIFEST_SUFFIX}"))
    }

    /// Whether downloads are possible.
    #[must_use]
    pub fn has_server(&self) -> bool {
        self.server_url.is_some()
    }
}
