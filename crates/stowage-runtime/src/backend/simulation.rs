//! Development assets read straight from disk

use super::{SimulationSource, type_matches};
use crate::asset::Asset;
use crate::pending::Pending;
use std::fs;
use std::path::{Path, PathBuf};
use stowage_core::{SceneLoadMode, StowageError, StowageResult};

/// Resolves `<root>/<bundle>/<asset>[.<type>]` without building bundles
///
/// An asset's type is its file extension. A scene "loads" when its source
/// file exists.
#[derive(Debug, Clone)]
pub struct DirectorySimulation {
    root: PathBuf,
}

impl DirectorySimulation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn type_of(path: &Path) -> String {
        path.extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl SimulationSource for DirectorySimulation {
    fn asset_paths(&self, bundle: &str, asset: &str) -> Vec<PathBuf> {
        let dir = self.root.join(bundle);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut exact = Vec::new();
        let mut by_stem = Vec::new();
        for path in entries.filter_map(|e| e.ok().map(|e| e.path())) {
            if !path.is_file() {
                continue;
            }
            if path.file_name().is_some_and(|n| n == asset) {
                exact.push(path);
            } else if path.file_stem().is_some_and(|s| s == asset) {
                by_stem.push(path);
            }
        }
        by_stem.sort();
        exact.extend(by_stem);
        exact
    }

    fn load_main_asset(&self, path: &Path, type_tag: Option<&str>) -> StowageResult<Asset> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let actual = Self::type_of(path);
        if !type_matches(&actual, type_tag) {
            return Err(StowageError::AssetNotFound {
                bundle: path
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                asset: name,
            });
        }
        let bytes = fs::read(path)?;
        Ok(Asset::from_bytes(&name, &actual, bytes))
    }

    fn begin_load_scene(
        &self,
        path: &Path,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> Pending<()> {
        tracing::debug!(
            "Simulated scene load {} ({:?}, activate: {})",
            path.display(),
            mode,
            allow_activation
        );
        Pending::ready(if path.is_file() {
            Ok(())
        } else {
            Err(StowageError::AssetNotFound {
                bundle: String::new(),
                asset: path.display().to_string(),
            })
        })
    }
}
