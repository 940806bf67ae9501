//! Asset load command.
//!
//! Builds a bundle manager from the configuration, requests one asset and
//! ticks until it is available, then releases the group it was pinned for.

use crate::config::ConfigFile;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use stowage_core::{AssetId, StowageError};
use stowage_runtime::{BundleManager, LoadHandle};

/// What to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Named { bundle: String, asset: String },
    Id(AssetId),
}

impl AssetRef {
    /// Build from the command arguments; an id wins over names.
    pub fn from_args(
        bundle: Option<String>,
        asset: Option<String>,
        id: Option<String>,
    ) -> Result<Self> {
        match (id, bundle, asset) {
            (Some(id), _, _) => Ok(AssetRef::Id(
                id.parse().with_context(|| format!("Invalid asset id: {id}"))?,
            )),
            (None, Some(bundle), Some(asset)) => Ok(AssetRef::Named { bundle, asset }),
            _ => anyhow::bail!("Either --id or both BUNDLE and ASSET are required"),
        }
    }
}

/// Result of one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub asset: String,
    pub type_tag: String,
    pub size: Option<usize>,
    /// `None` in simulate mode
    pub bundle: Option<String>,
    pub dependencies: Vec<String>,
}

/// Make sure the package manifest is available, downloading it when it is
/// missing locally and a server is configured.
pub fn prepare(manager: &mut BundleManager, package: &str, timeout: Duration) -> Result<()> {
    if manager.config().simulate {
        manager.load_manifest(package)?;
        return Ok(());
    }

    let local = manager.paths().manifest_path(package);
    if !local.is_file() && manager.paths().has_server() {
        println!("Fetching manifest for {package}");
        manager.fetch_manifest(package)?;

        let interval = Duration::from_millis(manager.config().tick_interval_ms);
        let deadline = Instant::now() + timeout;
        while manager.any_downloading() {
            if Instant::now() >= deadline {
                anyhow::bail!("Timed out fetching the manifest for {package}");
            }
            manager.tick();
            std::thread::sleep(interval);
        }
        if manager.manifest(package).is_some() {
            return Ok(());
        }
    }

    manager
        .load_manifest(package)
        .with_context(|| format!("Failed to load manifest {}", local.display()))
}

/// Request `target`, wait for it and release the group again.
pub fn load_once(
    manager: &mut BundleManager,
    target: &AssetRef,
    package: &str,
    group: &str,
    type_tag: Option<&str>,
    timeout: Duration,
) -> Result<LoadSummary> {
    let handle: LoadHandle = match target {
        AssetRef::Named { bundle, asset } => {
            manager.load_asset(package, bundle, group, asset, type_tag)?
        }
        AssetRef::Id(id) => manager.load_asset_by_id(id, group, type_tag)?,
    };

    let extracted = manager.wait(&handle, timeout)?;
    let asset = extracted
        .into_asset()
        .ok_or_else(|| StowageError::Internal("asset request produced a scene".to_string()))?;

    let bundle = handle.bundle().map(str::to_string);
    let dependencies = bundle
        .as_deref()
        .and_then(|name| manager.bundle(name))
        .map(|snapshot| snapshot.dependencies)
        .unwrap_or_default();

    Ok(LoadSummary {
        asset: asset.name().to_string(),
        type_tag: asset.type_tag().to_string(),
        size: asset.as_bytes().map(<[u8]>::len),
        bundle,
        dependencies,
    })
}

/// Run the load command.
pub fn run(
    config: &ConfigFile,
    target: AssetRef,
    package: Option<String>,
    group: Option<String>,
    type_tag: Option<String>,
    timeout_ms: Option<u64>,
    keep: bool,
) -> Result<()> {
    stowage_logging::init_logging(&config.manager);

    let package = config.package(package.as_deref());
    let group = group.unwrap_or_else(|| config.cli.group.clone());
    let timeout = Duration::from_millis(timeout_ms.unwrap_or(config.cli.timeout_ms));

    let mut manager = BundleManager::builder(config.manager.clone())
        .build()
        .context("Failed to create bundle manager")?;

    prepare(&mut manager, &package, timeout)?;

    let started = Instant::now();
    let summary = load_once(
        &mut manager,
        &target,
        &package,
        &group,
        type_tag.as_deref(),
        timeout,
    )?;

    println!(
        "Loaded {} ({}) from {} in {:.1?}",
        summary.asset,
        summary.type_tag,
        summary.bundle.as_deref().unwrap_or("simulation"),
        started.elapsed()
    );
    if let Some(size) = summary.size {
        println!("  Size: {size} bytes");
    }
    if !summary.dependencies.is_empty() {
        println!("  Dependencies: {}", summary.dependencies.join(", "));
    }

    if !keep {
        let release = manager.release_group(&group, true);
        println!("  Released group {group}: {} bundles unloaded", release.unloaded.len());
    }

    Ok(())
}
