//! Reading bundle archives.
//!
//! [`ArchiveBundle`] keeps the whole archive in memory so assets can be read
//! repeatedly without reopening the file.

use crate::builder::verify_sha256;
use crate::{ARCHIVE_HEADER_FILE, BundleError, BundleResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// Table of contents stored as `bundle.json` inside each archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveHeader {
    pub format_version: String,
    pub name: String,
    #[serde(default)]
    pub assets: Vec<ArchiveEntry>,
}

/// One asset in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub type_tag: String,
    pub path: String,
    pub checksum: String,
}

impl ArchiveEntry {
    /// Whether the entry satisfies a requested type. `None` and `"*"` match
    /// any type.
    #[must_use]
    pub fn matches_type(&self, type_tag: Option<&str>) -> bool {
        match type_tag {
            None | Some("*") | Some("") => true,
            Some(tag) => self.type_tag == tag,
        }
    }
}

/// An opened bundle archive.
///
/// # Example
///
/// ```no_run
/// use stowage_bundle::ArchiveBundle;
///
/// let mut bundle = ArchiveBundle::open("AssetBundles/Linux/characters")?;
/// for entry in bundle.entries() {
///     println!("{} ({})", entry.name, entry.type_tag);
/// }
/// let bytes = bundle.read_asset("hero", None)?;
/// # Ok::<(), stowage_bundle::BundleError>(())
/// ```
#[derive(Debug)]
pub struct ArchiveBundle {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    header: ArchiveHeader,
}

impl ArchiveBundle {
    /// Open an archive file.
    pub fn open<P: AsRef<Path>>(path: P) -> BundleResult<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Read an archive from memory.
    pub fn from_bytes(bytes: Vec<u8>) -> BundleResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let header = {
            let mut header_file = archive.by_name(ARCHIVE_HEADER_FILE).map_err(|_| {
                BundleError::MissingFile(format!("{ARCHIVE_HEADER_FILE} not found in archive"))
            })?;
            let mut json = String::new();
            header_file.read_to_string(&mut json)?;
            serde_json::from_str::<ArchiveHeader>(&json)?
        };

        if header.name.is_empty() {
            return Err(BundleError::InvalidManifest(
                "archive header has no bundle name".to_string(),
            ));
        }

        Ok(Self { archive, header })
    }

    /// Bundle name recorded in the header.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    #[must_use]
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Every asset in the archive.
    #[must_use]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.header.assets
    }

    /// Find an asset by name and optional type.
    #[must_use]
    pub fn find(&self, asset: &str, type_tag: Option<&str>) -> Option<&ArchiveEntry> {
        self.header
            .assets
            .iter()
            .find(|e| e.name == asset && e.matches_type(type_tag))
    }

    /// Check whether an asset with that name exists, whatever its type.
    #[must_use]
    pub fn contains(&self, asset: &str) -> bool {
        self.find(asset, None).is_some()
    }

    /// Read an asset and verify its checksum.
    pub fn read_asset(&mut self, asset: &str, type_tag: Option<&str>) -> BundleResult<Vec<u8>> {
        let entry = self
            .find(asset, type_tag)
            .cloned()
            .ok_or_else(|| BundleError::AssetNotFound {
                bundle: self.header.name.clone(),
                asset: asset.to_string(),
            })?;

        let mut file = self
            .archive
            .by_name(&entry.path)
            .map_err(|_| BundleError::MissingFile(entry.path.clone()))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        if !verify_sha256(&contents, &entry.checksum) {
            return Err(BundleError::ChecksumMismatch {
                path: entry.path,
                expected: entry.checksum,
                actual: crate::compute_sha256(&contents),
            });
        }

        Ok(contents)
    }

    /// List all raw file paths in the archive.
    #[must_use]
    pub fn list_files(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i).map(String::from))
            .collect()
    }
}
