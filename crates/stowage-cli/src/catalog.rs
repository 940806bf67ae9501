//! Catalog listing command.

use crate::config::ConfigFile;
use anyhow::{Context, Result};
use stowage_bundle::{Catalog, CatalogRecord, StoragePaths};
use stowage_core::StowageError;

/// Load the catalog of one package, or every catalog in the bundle
/// directory when no package is given.
pub fn load(config: &ConfigFile, package: Option<&str>) -> Result<Catalog> {
    let paths = StoragePaths::from_config(&config.manager).map_err(StowageError::from)?;
    let dir = paths.platform_dir();
    let mut catalog = Catalog::new();

    match package {
        Some(package) => {
            catalog
                .load_package(dir, package)
                .map_err(StowageError::from)
                .with_context(|| format!("Failed to load catalog of {package}"))?;
        }
        None => {
            catalog
                .load_dir(dir)
                .map_err(StowageError::from)
                .with_context(|| format!("Failed to load catalogs from {}", dir.display()))?;
        }
    }

    Ok(catalog)
}

/// Rows of the listing, ordered by package then asset id.
pub fn rows(catalog: &Catalog) -> Vec<(String, CatalogRecord)> {
    let mut rows: Vec<(String, CatalogRecord)> = catalog
        .packages()
        .iter()
        .flat_map(|package| {
            catalog
                .records_for(package)
                .asset_info_table
                .into_iter()
                .map(move |record| (package.clone(), record))
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.asset_id.cmp(&b.1.asset_id)));
    rows
}

/// Run the catalog command.
pub fn run(config: &ConfigFile, package: Option<String>, json: bool) -> Result<()> {
    let catalog = load(config, package.as_deref())?;

    if json {
        let table: Vec<serde_json::Value> = rows(&catalog)
            .into_iter()
            .map(|(package, record)| {
                serde_json::json!({
                    "asset_id": record.asset_id,
                    "package": package,
                    "bundle": record.bundle_name,
                    "asset": record.asset_name,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No catalog entries");
        return Ok(());
    }

    for (package, record) in rows(&catalog) {
        println!(
            "{}  {}/{}/{}",
            record.asset_id, package, record.bundle_name, record.asset_name
        );
    }
    println!("\n{} entries", catalog.len());

    Ok(())
}
