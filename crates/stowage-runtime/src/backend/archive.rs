//! Zip archive bundles from local storage

use super::{BundleHandle, BundleOpener, OpenedBundle};
use crate::asset::Asset;
use crate::pending::Pending;
use crate::runtime::IoRuntime;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use stowage_bundle::ArchiveBundle;
use stowage_core::StowageError;

/// Opens bundles written by [`stowage_bundle::ArchiveBuilder`]
#[derive(Clone)]
pub struct ArchiveOpener {
    runtime: IoRuntime,
}

impl ArchiveOpener {
    pub fn new(runtime: IoRuntime) -> Self {
        Self { runtime }
    }
}

impl BundleOpener for ArchiveOpener {
    fn is_present(&self, _bundle: &str, path: &Path) -> bool {
        path.is_file()
    }

    fn begin_open(&self, bundle: &str, path: &Path) -> Pending<BundleHandle> {
        let bundle = bundle.to_string();
        let path = path.to_path_buf();
        let runtime = self.runtime.clone();

        self.runtime.spawn_blocking(move || {
            let archive = ArchiveBundle::open(&path).map_err(|e| StowageError::OpenFailed {
                bundle: bundle.clone(),
                reason: e.to_string(),
            })?;
            tracing::debug!(
                "Opened archive {} with {} assets",
                bundle,
                archive.entries().len()
            );
            let handle: BundleHandle = Arc::new(ArchiveHandle {
                name: bundle,
                archive: Arc::new(Mutex::new(Some(archive))),
                runtime,
            });
            Ok(handle)
        })
    }
}

/// Assets are copied out of the archive, so `unload` only drops the archive
/// itself whatever `unload_all` says.
struct ArchiveHandle {
    name: String,
    archive: Arc<Mutex<Option<ArchiveBundle>>>,
    runtime: IoRuntime,
}

impl OpenedBundle for ArchiveHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_load_asset(&self, asset: &str, type_tag: Option<&str>) -> Pending<Asset> {
        let archive = Arc::clone(&self.archive);
        let bundle = self.name.clone();
        let asset = asset.to_string();
        let type_tag = type_tag.map(str::to_string);

        self.runtime.spawn_blocking(move || {
            let mut guard = archive.lock();
            let archive = guard
                .as_mut()
                .ok_or_else(|| StowageError::BundleReleased(bundle.clone()))?;
            let actual_tag = archive
                .find(&asset, type_tag.as_deref())
                .map(|entry| entry.type_tag.clone())
                .unwrap_or_default();
            let bytes = archive.read_asset(&asset, type_tag.as_deref())?;
            Ok(Asset::from_bytes(&asset, &actual_tag, bytes))
        })
    }

    fn unload(&self, _unload_all: bool) {
        self.archive.lock().take();
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::task::Poll;
    use std::time::{Duration, Instant};
    use stowage_bundle::ArchiveBuilder;
    use stowage_core::StowageResult;
    use tempfile::TempDir;

    fn wait<T>(mut pending: Pending<T>) -> StowageResult<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Poll::Ready(result) = pending.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "request never finished");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn opener_with_archive(temp_dir: &TempDir) -> (ArchiveOpener, std::path::PathBuf) {
        let path = temp_dir.path().join("characters");
        ArchiveBuilder::new("characters")
            .add_asset("hero", "prefab", b"hero bytes".to_vec())
            .write(&path)
            .unwrap();
        (ArchiveOpener::new(IoRuntime::with_defaults().unwrap()), path)
    }

    #[test]
    fn ArchiveOpener___is_present___checks_file() {
        let temp_dir = TempDir::new().unwrap();
        let (opener, path) = opener_with_archive(&temp_dir);

        assert!(opener.is_present("characters", &path));
        assert!(!opener.is_present("other", &temp_dir.path().join("other")));
    }

    #[test]
    fn ArchiveOpener___begin_open___loads_assets() {
        let temp_dir = TempDir::new().unwrap();
        let (opener, path) = opener_with_archive(&temp_dir);

        let handle = wait(opener.begin_open("characters", &path)).unwrap();
        let asset = wait(handle.begin_load_asset("hero", Some("prefab"))).unwrap();

        assert_eq!(handle.name(), "characters");
        assert_eq!(asset.type_tag(), "prefab");
        assert_eq!(asset.as_bytes(), Some(&b"hero bytes"[..]));
    }

    #[test]
    fn ArchiveOpener___begin_open___missing_file___open_failed() {
        let temp_dir = TempDir::new().unwrap();
        let (opener, _) = opener_with_archive(&temp_dir);

        let result = wait(opener.begin_open("ghost", &temp_dir.path().join("ghost")));

        assert!(matches!(result, Err(StowageError::OpenFailed { .. })));
    }

    #[test]
    fn ArchiveHandle___unknown_asset___asset_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let (opener, path) = opener_with_archive(&temp_dir);
        let handle = wait(opener.begin_open("characters", &path)).unwrap();

        let result = wait(handle.begin_load_asset("villain", None));

        assert!(matches!(result, Err(StowageError::AssetNotFound { .. })));
    }

    #[test]
    fn ArchiveHandle___after_unload___bundle_released() {
        let temp_dir = TempDir::new().unwrap();
        let (opener, path) = opener_with_archive(&temp_dir);
        let handle = wait(opener.begin_open("characters", &path)).unwrap();

        handle.unload(false);
        let result = wait(handle.begin_load_asset("hero", None));

        assert_eq!(
            result.unwrap_err(),
            StowageError::BundleReleased("characters".to_string())
        );
    }
}
