//! Bundle creation command.
//!
//! Packs asset files into an archive and optionally records the bundle in
//! its package manifest and catalog.

use crate::config::ConfigFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stowage_bundle::{
    ArchiveBuilder, ArchiveBundle, BundleManifest, Catalog, CatalogFile, CatalogRecord,
    StoragePaths,
};
use stowage_core::{AssetId, StowageError};

/// One `NAME:TYPE:PATH` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub name: String,
    pub type_tag: String,
    pub path: PathBuf,
}

impl AssetSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.splitn(3, ':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            anyhow::bail!("Invalid asset format: {spec}. Expected NAME:TYPE:PATH");
        }
        Ok(Self {
            name: parts[0].to_string(),
            type_tag: parts[1].to_string(),
            path: PathBuf::from(parts[2]),
        })
    }
}

/// Options of the pack command.
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Archive path; defaults to the bundle's place in the bundle directory
    pub output: Option<String>,
    /// Package whose manifest receives the bundle
    pub package: Option<String>,
    /// Direct dependencies recorded in the manifest
    pub depends: Vec<String>,
    /// Give every asset a catalog id
    pub catalog: bool,
}

/// Add `bundle` to the package manifest, creating the manifest if needed.
/// The result must still validate.
pub fn record_in_manifest(
    path: &Path,
    package: &str,
    bundle: &str,
    depends: &[String],
    hash: &str,
) -> Result<BundleManifest> {
    let mut manifest = if path.is_file() {
        BundleManifest::load(path)
            .map_err(StowageError::from)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?
    } else {
        BundleManifest::new(package)
    };

    let depends: Vec<&str> = depends.iter().map(String::as_str).collect();
    manifest.insert_bundle(bundle, &depends, Some(hash));
    manifest
        .validate()
        .map_err(StowageError::from)
        .with_context(|| format!("Manifest invalid after adding {bundle}"))?;

    manifest
        .write(path)
        .map_err(StowageError::from)
        .with_context(|| format!("Failed to write manifest {}", path.display()))?;
    Ok(manifest)
}

/// Make sure every asset of `bundle` has a catalog id, keeping ids that
/// already exist. Returns the ids handed out by this call.
pub fn record_in_catalog(
    dir: &Path,
    package: &str,
    bundle: &str,
    assets: &[AssetSpec],
) -> Result<Vec<(AssetId, String)>> {
    let mut catalog = Catalog::new();
    if dir.join(Catalog::file_name(package)).is_file() {
        catalog.load_package(dir, package).map_err(StowageError::from)?;
    }

    let existing = catalog.records_for(package);
    let mut added = Vec::new();
    let mut records = Vec::new();
    for spec in assets {
        let known = existing
            .asset_info_table
            .iter()
            .any(|r| r.bundle_name == bundle && r.asset_name == spec.name);
        if known {
            continue;
        }
        let id = AssetId::generate();
        records.push(CatalogRecord {
            asset_id: id,
            bundle_name: bundle.to_string(),
            asset_name: spec.name.clone(),
        });
        added.push((id, spec.name.clone()));
    }

    catalog.insert_file(
        package,
        CatalogFile {
            asset_info_table: records,
        },
    );
    catalog.write_package(dir, package).map_err(StowageError::from)?;
    Ok(added)
}

/// Run the pack command.
pub fn run(
    config: &ConfigFile,
    name: &str,
    assets: &[String],
    options: PackOptions,
) -> Result<()> {
    if assets.is_empty() {
        anyhow::bail!("At least one --asset is required");
    }
    let specs = assets
        .iter()
        .map(String::as_str)
        .map(AssetSpec::parse)
        .collect::<Result<Vec<_>>>()?;

    println!("Packing bundle: {name}");

    let mut builder = ArchiveBuilder::new(name);
    for spec in &specs {
        println!(
            "  Adding asset: {} ({}) <- {}",
            spec.name,
            spec.type_tag,
            spec.path.display()
        );
        builder = builder
            .add_file(&spec.name, &spec.type_tag, &spec.path)
            .map_err(StowageError::from)
            .with_context(|| format!("Failed to add asset: {}", spec.path.display()))?;
    }

    let paths = StoragePaths::from_config(&config.manager).map_err(StowageError::from)?;
    let output_path = match &options.output {
        Some(output) => PathBuf::from(output),
        None => paths.bundle_path(name),
    };

    let hash = builder
        .write(&output_path)
        .map_err(StowageError::from)
        .with_context(|| format!("Failed to write bundle: {}", output_path.display()))?;

    println!("Bundle created: {}", output_path.display());
    println!("  Hash: {hash}");

    if options.package.is_some() || !options.depends.is_empty() || options.catalog {
        let package = config.package(options.package.as_deref());

        let manifest_path = paths.manifest_path(&package);
        let manifest =
            record_in_manifest(&manifest_path, &package, name, &options.depends, &hash)?;
        println!(
            "  Manifest updated: {} ({} bundles)",
            manifest_path.display(),
            manifest.bundles.len()
        );

        if options.catalog {
            for (id, asset) in record_in_catalog(paths.platform_dir(), &package, name, &specs)? {
                println!("  Catalog: {id} -> {asset}");
            }
        }
    }

    Ok(())
}

/// List contents of a bundle archive.
pub fn list(bundle_path: &str) -> Result<()> {
    let bundle = ArchiveBundle::open(bundle_path)
        .map_err(StowageError::from)
        .with_context(|| format!("Failed to open: {bundle_path}"))?;

    let header = bundle.header();
    println!("Bundle: {} (format {})", header.name, header.format_version);
    println!("Assets:");
    for entry in bundle.entries() {
        println!("  {} ({})  {}", entry.name, entry.type_tag, entry.checksum);
    }

    Ok(())
}

#[cfg(test)]
#[path = "pack/pack_tests.rs"]
mod pack_tests;
