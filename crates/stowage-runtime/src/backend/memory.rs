//! In-memory backend for tests, tools and benchmarks

use super::{
    BundleFetcher, BundleHandle, BundleOpener, FetchRequest, OpenedBundle, SceneHost,
    SimulationSource, type_matches,
};
use crate::asset::Asset;
use crate::pending::{Completer, Pending};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stowage_core::{SceneLoadMode, StowageError, StowageResult};

/// Contents of one in-memory bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBundle {
    assets: BTreeMap<String, (String, Vec<u8>)>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset
    pub fn with_asset(mut self, name: &str, type_tag: &str, bytes: &[u8]) -> Self {
        self.assets
            .insert(name.to_string(), (type_tag.to_string(), bytes.to_vec()));
        self
    }

    fn size(&self) -> u64 {
        self.assets.values().map(|(_, b)| b.len() as u64).sum()
    }

    fn load(&self, bundle: &str, asset: &str, type_tag: Option<&str>) -> StowageResult<Asset> {
        match self.assets.get(asset) {
            Some((tag, bytes)) if type_matches(tag, type_tag) => {
                Ok(Asset::from_bytes(asset, tag, bytes.clone()))
            }
            _ => Err(StowageError::AssetNotFound {
                bundle: bundle.to_string(),
                asset: asset.to_string(),
            }),
        }
    }
}

/// A scene request seen by the backend's [`SceneHost`] implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLoad {
    pub bundle: String,
    pub scene: String,
    pub mode: SceneLoadMode,
    pub allow_activation: bool,
}

#[derive(Default)]
struct MemoryState {
    manual: bool,
    local: HashMap<String, MemoryBundle>,
    remote: HashMap<String, MemoryBundle>,
    failing_fetches: HashSet<String>,
    failing_opens: HashSet<String>,
    pending_fetches: Vec<(String, Completer<u64>)>,
    pending_opens: Vec<(String, Completer<BundleHandle>)>,
    fetch_counts: HashMap<String, usize>,
    open_counts: HashMap<String, usize>,
    unloads: Vec<(String, bool)>,
    scenes: Vec<SceneLoad>,
}

/// Fetcher, opener, scene host and simulation source backed by maps
///
/// "Local" bundles are opened directly; "remote" bundles become local when
/// fetched. In manual mode every fetch and open stays pending until
/// [`finish_fetch`](Self::finish_fetch) or [`finish_open`](Self::finish_open)
/// is called, which lets tests observe each intermediate tick. Outcomes are
/// decided when the request finishes, not when it begins.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// A backend whose requests complete immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose requests complete only when told to
    pub fn manual() -> Self {
        let backend = Self::default();
        backend.state.lock().manual = true;
        backend
    }

    /// Make a bundle available on local storage
    pub fn add_local(&self, name: &str, bundle: MemoryBundle) -> &Self {
        self.state.lock().local.insert(name.to_string(), bundle);
        self
    }

    /// Make a bundle available on the server only
    pub fn add_remote(&self, name: &str, bundle: MemoryBundle) -> &Self {
        self.state.lock().remote.insert(name.to_string(), bundle);
        self
    }

    /// Remove a bundle from local storage
    pub fn remove_local(&self, name: &str) {
        self.state.lock().local.remove(name);
    }

    /// Make downloads of `name` fail (or succeed again)
    pub fn set_fetch_failure(&self, name: &str, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing_fetches.insert(name.to_string());
        } else {
            state.failing_fetches.remove(name);
        }
    }

    /// Make opens of `name` fail (or succeed again)
    pub fn set_open_failure(&self, name: &str, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing_opens.insert(name.to_string());
        } else {
            state.failing_opens.remove(name);
        }
    }

    /// Complete the oldest pending fetch of `name`
    pub fn finish_fetch(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.pending_fetches.iter().position(|(n, _)| n == name) else {
            return false;
        };
        let (name, completer) = state.pending_fetches.remove(index);
        let result = state.fetch_result(&name);
        completer.complete(result);
        true
    }

    /// Complete the oldest pending open of `name`
    pub fn finish_open(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.pending_opens.iter().position(|(n, _)| n == name) else {
            return false;
        };
        let (name, completer) = state.pending_opens.remove(index);
        let result = state.open_result(&name, &self.state);
        completer.complete(result);
        true
    }

    /// Complete every pending request, fetches first. Returns how many
    /// completed.
    pub fn finish_all(&self) -> usize {
        let mut count = 0;
        for name in self.pending_fetches() {
            count += usize::from(self.finish_fetch(&name));
        }
        for name in self.pending_opens() {
            count += usize::from(self.finish_open(&name));
        }
        count
    }

    /// Names with a fetch waiting to be finished
    pub fn pending_fetches(&self) -> Vec<String> {
        self.state
            .lock()
            .pending_fetches
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Names with an open waiting to be finished
    pub fn pending_opens(&self) -> Vec<String> {
        self.state
            .lock()
            .pending_opens
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// How many fetches of `name` were started
    pub fn fetch_count(&self, name: &str) -> usize {
        self.state.lock().fetch_counts.get(name).copied().unwrap_or(0)
    }

    /// How many opens of `name` were started
    pub fn open_count(&self, name: &str) -> usize {
        self.state.lock().open_counts.get(name).copied().unwrap_or(0)
    }

    /// Every unload seen so far, as `(bundle, unload_all)`
    pub fn unloads(&self) -> Vec<(String, bool)> {
        self.state.lock().unloads.clone()
    }

    /// Every scene request seen so far
    pub fn scene_loads(&self) -> Vec<SceneLoad> {
        self.state.lock().scenes.clone()
    }

    /// Whether `name` is on local storage
    pub fn has_local(&self, name: &str) -> bool {
        self.state.lock().local.contains_key(name)
    }
}

impl MemoryState {
    fn fetch_result(&mut self, name: &str) -> StowageResult<u64> {
        if self.failing_fetches.contains(name) {
            return Err(StowageError::DownloadFailed {
                bundle: name.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        match self.remote.get(name) {
            Some(bundle) => {
                let size = bundle.size();
                self.local.insert(name.to_string(), bundle.clone());
                Ok(size)
            }
            None => Err(StowageError::DownloadFailed {
                bundle: name.to_string(),
                reason: "HTTP 404".to_string(),
            }),
        }
    }

    fn open_result(
        &self,
        name: &str,
        shared: &Arc<Mutex<MemoryState>>,
    ) -> StowageResult<BundleHandle> {
        if self.failing_opens.contains(name) {
            return Err(StowageError::OpenFailed {
                bundle: name.to_string(),
                reason: "corrupt bundle".to_string(),
            });
        }
        match self.local.get(name) {
            Some(bundle) => {
                let handle: BundleHandle = Arc::new(MemoryHandle {
                    name: name.to_string(),
                    bundle: bundle.clone(),
                    state: Arc::clone(shared),
                });
                Ok(handle)
            }
            None => Err(StowageError::OpenFailed {
                bundle: name.to_string(),
                reason: "file not found".to_string(),
            }),
        }
    }
}

impl BundleFetcher for MemoryBackend {
    fn begin_fetch(&self, request: FetchRequest) -> Pending<u64> {
        let mut state = self.state.lock();
        *state.fetch_counts.entry(request.bundle.clone()).or_default() += 1;
        if state.manual {
            let (completer, pending) = Pending::channel();
            state.pending_fetches.push((request.bundle, completer));
            pending
        } else {
            Pending::ready(state.fetch_result(&request.bundle))
        }
    }
}

impl BundleOpener for MemoryBackend {
    fn is_present(&self, bundle: &str, _path: &Path) -> bool {
        self.has_local(bundle)
    }

    fn begin_open(&self, bundle: &str, _path: &Path) -> Pending<BundleHandle> {
        let mut state = self.state.lock();
        *state.open_counts.entry(bundle.to_string()).or_default() += 1;
        if state.manual {
            let (completer, pending) = Pending::channel();
            state.pending_opens.push((bundle.to_string(), completer));
            pending
        } else {
            Pending::ready(state.open_result(bundle, &self.state))
        }
    }
}

impl SceneHost for MemoryBackend {
    fn begin_load_scene(
        &self,
        bundle: &BundleHandle,
        scene: &str,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> Pending<()> {
        let mut state = self.state.lock();
        state.scenes.push(SceneLoad {
            bundle: bundle.name().to_string(),
            scene: scene.to_string(),
            mode,
            allow_activation,
        });
        let found = state
            .local
            .get(bundle.name())
            .is_some_and(|b| b.assets.contains_key(scene));
        Pending::ready(if found {
            Ok(())
        } else {
            Err(StowageError::AssetNotFound {
                bundle: bundle.name().to_string(),
                asset: scene.to_string(),
            })
        })
    }
}

impl SimulationSource for MemoryBackend {
    fn asset_paths(&self, bundle: &str, asset: &str) -> Vec<PathBuf> {
        let state = self.state.lock();
        let known = state
            .local
            .get(bundle)
            .or_else(|| state.remote.get(bundle))
            .is_some_and(|b| b.assets.contains_key(asset));
        if known {
            vec![Path::new(bundle).join(asset)]
        } else {
            Vec::new()
        }
    }

    fn load_main_asset(&self, path: &Path, type_tag: Option<&str>) -> StowageResult<Asset> {
        let not_found = || StowageError::AssetNotFound {
            bundle: String::new(),
            asset: path.display().to_string(),
        };
        let bundle = path
            .parent()
            .and_then(Path::to_str)
            .ok_or_else(not_found)?;
        let asset = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(not_found)?;
        let state = self.state.lock();
        state
            .local
            .get(bundle)
            .or_else(|| state.remote.get(bundle))
            .ok_or_else(not_found)?
            .load(bundle, asset, type_tag)
    }

    fn begin_load_scene(
        &self,
        path: &Path,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> Pending<()> {
        let bundle = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let scene = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.state.lock().scenes.push(SceneLoad {
            bundle,
            scene,
            mode,
            allow_activation,
        });
        Pending::ready(Ok(()))
    }
}

struct MemoryHandle {
    name: String,
    bundle: MemoryBundle,
    state: Arc<Mutex<MemoryState>>,
}

impl OpenedBundle for MemoryHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_load_asset(&self, asset: &str, type_tag: Option<&str>) -> Pending<Asset> {
        Pending::ready(self.bundle.load(&self.name, asset, type_tag))
    }

    fn unload(&self, unload_all: bool) {
        self.state
            .lock()
            .unloads
            .push((self.name.clone(), unload_all));
    }
}
