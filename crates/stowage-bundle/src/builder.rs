//! Archive creation utilities.
//!
//! The [`ArchiveBuilder`] provides a fluent API for writing bundle archives.

use crate::archive::{ArchiveEntry, ArchiveHeader};
use crate::{ARCHIVE_ASSET_DIR, ARCHIVE_HEADER_FILE, BundleError, BundleResult, FORMAT_VERSION};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builder for bundle archives.
///
/// # Example
///
/// ```no_run
/// use stowage_bundle::ArchiveBuilder;
///
/// let hash = ArchiveBuilder::new("characters")
///     .add_asset("hero", "prefab", b"...".to_vec())
///     .add_file("villain", "prefab", "art/villain.prefab")?
///     .write("AssetBundles/Linux/characters")?;
/// println!("content hash: {hash}");
/// # Ok::<(), stowage_bundle::BundleError>(())
/// ```
pub struct ArchiveBuilder {
    name: String,
    assets: Vec<(ArchiveEntry, Vec<u8>)>,
}

impl ArchiveBuilder {
    /// Create a builder for the named bundle.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            assets: Vec::new(),
        }
    }

    /// Add an asset from memory. A later asset with the same name replaces an
    /// earlier one.
    #[must_use]
    pub fn add_asset(mut self, name: &str, type_tag: &str, contents: Vec<u8>) -> Self {
        self.assets.retain(|(entry, _)| entry.name != name);
        let entry = ArchiveEntry {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            path: format!("{ARCHIVE_ASSET_DIR}/{name}"),
            checksum: compute_sha256(&contents),
        };
        self.assets.push((entry, contents));
        self
    }

    /// Add an asset read from a file.
    pub fn add_file<P: AsRef<Path>>(
        self,
        name: &str,
        type_tag: &str,
        source_path: P,
    ) -> BundleResult<Self> {
        let source_path = source_path.as_ref();
        let contents = fs::read(source_path).map_err(|e| {
            BundleError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read asset file {}: {}", source_path.display(), e),
            ))
        })?;
        Ok(self.add_asset(name, type_tag, contents))
    }

    /// Number of assets added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Produce the archive bytes.
    pub fn to_bytes(&self) -> BundleResult<Vec<u8>> {
        let header = ArchiveHeader {
            format_version: FORMAT_VERSION.to_string(),
            name: self.name.clone(),
            assets: self.assets.iter().map(|(entry, _)| entry.clone()).collect(),
        };

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file(ARCHIVE_HEADER_FILE, options)?;
        zip.write_all(serde_json::to_string_pretty(&header)?.as_bytes())?;

        for (entry, contents) in &self.assets {
            zip.start_file(&entry.path, options)?;
            zip.write_all(contents)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the archive to a file, creating parent directories, and return
    /// its content hash for the package manifest.
    pub fn write<P: AsRef<Path>>(&self, output_path: P) -> BundleResult<String> {
        let output_path = output_path.as_ref();
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes()?;
        fs::write(output_path, &bytes)?;
        Ok(compute_sha256(&bytes))
    }
}

/// Compute the SHA256 checksum of data, formatted as "sha256:<hex>".
#[must_use]
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Verify data against a checksum in either "sha256:<hex>" or raw hex form.
#[must_use]
pub fn verify_sha256(data: &[u8], expected: &str) -> bool {
    let actual = compute_sha256(data);
    let actual_hex = actual.strip_prefix("sha256:").unwrap_or(&actual);
    let expected_hex = expected.strip_prefix("sha256:").unwrap_or(expected);
    actual_hex.eq_ignore_ascii_case(expected_hex)
}
