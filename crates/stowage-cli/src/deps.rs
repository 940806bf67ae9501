//! Dependency closure command.

use crate::config::ConfigFile;
use anyhow::{Context, Result};
use std::path::Path;
use stowage_bundle::{BundleManifest, StoragePaths};
use stowage_core::StowageError;

/// One line of the closure listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureEntry {
    pub bundle: String,
    pub dependencies: Vec<String>,
    pub hash: Option<String>,
}

/// The transitive closure of `bundle`, root first.
pub fn closure(manifest: &BundleManifest, bundle: &str) -> Result<Vec<ClosureEntry>> {
    if manifest.entry(bundle).is_none() {
        return Err(StowageError::UnknownBundle {
            package: manifest.package.clone(),
            bundle: bundle.to_string(),
        }
        .into());
    }

    let names = manifest
        .dependency_closure(bundle)
        .map_err(StowageError::from)?;

    Ok(names
        .into_iter()
        .map(|name| {
            let entry = manifest.entry(&name);
            ClosureEntry {
                dependencies: entry.map(|e| e.dependencies.clone()).unwrap_or_default(),
                hash: entry.and_then(|e| e.hash.clone()),
                bundle: name,
            }
        })
        .collect())
}

/// Read the manifest named on the command line, or the package manifest
/// under the configured bundle directory.
pub fn read_manifest(
    config: &ConfigFile,
    package: &str,
    manifest_path: Option<&str>,
) -> Result<BundleManifest> {
    let path = match manifest_path {
        Some(path) => Path::new(path).to_path_buf(),
        None => StoragePaths::from_config(&config.manager)
            .map_err(StowageError::from)?
            .manifest_path(package),
    };

    if !path.is_file() {
        return Err(anyhow::Error::new(StowageError::ManifestUnavailable {
            package: package.to_string(),
        })
        .context(format!("No manifest at {}", path.display())));
    }

    BundleManifest::load(&path)
        .map_err(StowageError::from)
        .with_context(|| format!("Failed to read manifest {}", path.display()))
}

/// Run the deps command.
pub fn run(
    config: &ConfigFile,
    bundle: &str,
    package: Option<String>,
    manifest_path: Option<String>,
) -> Result<()> {
    let package = config.package(package.as_deref());
    let manifest = read_manifest(config, &package, manifest_path.as_deref())?;

    println!("Dependencies of {bundle} ({})", manifest.package);

    for entry in closure(&manifest, bundle)? {
        let hash = entry.hash.as_deref().unwrap_or("-");
        if entry.dependencies.is_empty() {
            println!("  {}  {}", entry.bundle, hash);
        } else {
            println!(
                "  {}  {}  -> {}",
                entry.bundle,
                hash,
                entry.dependencies.join(", ")
            );
        }
    }

    Ok(())
}
