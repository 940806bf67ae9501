//! Asset catalogs: opaque asset ids mapped to bundle and asset names.
//!
//! Each package has one `<package>_Catalog.json` file:
//!
//! ```json
//! {
//!   "assetInfoTable": [
//!     { "assetId": "0123456789abcdef0123456789abcdef",
//!       "bundleName": "characters",
//!       "assetName": "hero" }
//!   ]
//! }
//! ```

use crate::{BundleError, BundleResult, CATALOG_SUFFIX};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use stowage_core::AssetId;

/// On-disk form of one package catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    #[serde(default)]
    pub asset_info_table: Vec<CatalogRecord>,
}

/// One row of a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub asset_id: AssetId,
    pub bundle_name: String,
    pub asset_name: String,
}

/// Where an asset lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetLocation {
    pub package: String,
    pub bundle: String,
    pub asset: String,
}

/// In-memory index over every loaded package catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<AssetId, AssetLocation>,
    packages: Vec<String>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File name of a package catalog.
    #[must_use]
    pub fn file_name(package: &str) -> String {
        format!("{package}{CATALOG_SUFFIX}")
    }

    /// Package name encoded in a catalog file name, if it is one.
    #[must_use]
    pub fn package_from_path(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        let package = name.strip_suffix(CATALOG_SUFFIX)?;
        (!package.is_empty()).then(|| package.to_string())
    }

    /// Index the records of one package, replacing earlier records with the
    /// same id. Returns the number of records added.
    pub fn insert_file(&mut self, package: &str, file: CatalogFile) -> usize {
        let count = file.asset_info_table.len();
        for record in file.asset_info_table {
            self.entries.insert(
                record.asset_id,
                AssetLocation {
                    package: package.to_string(),
                    bundle: record.bundle_name,
                    asset: record.asset_name,
                },
            );
        }
        if !self.packages.iter().any(|p| p == package) {
            self.packages.push(package.to_string());
        }
        count
    }

    /// Load one catalog file; the package name comes from the file name.
    pub fn load_file(&mut self, path: &Path) -> BundleResult<usize> {
        let package = Self::package_from_path(path).ok_or_else(|| {
            BundleError::InvalidCatalog(format!(
                "'{}' is not a *{CATALOG_SUFFIX} file",
                path.display()
            ))
        })?;
        let json = fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&json)?;
        Ok(self.insert_file(&package, file))
    }

    /// Load `<dir>/<package>_Catalog.json`.
    pub fn load_package(&mut self, dir: &Path, package: &str) -> BundleResult<usize> {
        self.load_file(&dir.join(Self::file_name(package)))
    }

    /// Load every catalog file in a directory. A missing directory loads
    /// nothing.
    pub fn load_dir(&mut self, dir: &Path) -> BundleResult<usize> {
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| Self::package_from_path(p).is_some())
            .collect();
        paths.sort();

        let mut total = 0;
        for path in paths {
            total += self.load_file(&path)?;
        }
        Ok(total)
    }

    /// Records of one package, sorted by id.
    #[must_use]
    pub fn records_for(&self, package: &str) -> CatalogFile {
        let mut rows: Vec<CatalogRecord> = self
            .entries
            .iter()
            .filter(|(_, loc)| loc.package == package)
            .map(|(id, loc)| CatalogRecord {
                asset_id: *id,
                bundle_name: loc.bundle.clone(),
                asset_name: loc.asset.clone(),
            })
            .collect();
        rows.sort_by_key(|r| r.asset_id);
        CatalogFile {
            asset_info_table: rows,
        }
    }

    /// Write one package's records to `<dir>/<package>_Catalog.json`.
    pub fn write_package(&self, dir: &Path, package: &str) -> BundleResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(package));
        let json = serde_json::to_string_pretty(&self.records_for(package))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Find where an asset lives.
    #[must_use]
    pub fn resolve(&self, id: &AssetId) -> Option<&AssetLocation> {
        self.entries.get(id)
    }

    /// Packages loaded so far, in load order.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Iterate over every entry.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &AssetLocation)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
