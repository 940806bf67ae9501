//! The bundle manager: one context object driven by [`BundleManager::tick`]
//!
//! ```text
//! load_asset ─→ pin ─→ DownloadScheduler ─→ OpenScheduler ─→ LoadOperation
//!                        (tick step 1)        (tick step 2)    (tick step 3)
//! ```

use crate::backend::{
    ArchiveOpener, BundleFetcher, BundleHandle, BundleOpener, DirectorySimulation, HttpFetcher,
    MemoryBackend, SceneHost, SimulationSource,
};
use crate::download::{DownloadEvent, DownloadKind, DownloadScheduler};
use crate::groups::{self, GroupRelease};
use crate::open::{OpenEvent, OpenScheduler};
use crate::operation::{Extracted, Extraction, LoadHandle, LoadOperation, LoadTarget};
use crate::pending::Pending;
use crate::registry::{BundleId, BundleRegistry};
use crate::resolver;
use crate::runtime::IoRuntime;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stowage_bundle::{BundleManifest, Catalog, DependencyLookup, MANIFEST_SUFFIX, StoragePaths};
use stowage_core::{AssetId, SceneLoadMode, StowageConfig, StowageError, StowageResult};

/// Outcome of [`BundleManager::release_bundle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The pin was dropped; these bundles were unloaded
    Released(Vec<String>),
    /// The bundle is not pinned by a client
    NotPinned,
    /// The bundle, or a dependency the release would unload, is still
    /// downloading or opening; try again later
    InFlight,
}

/// Point-in-time view of one bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSnapshot {
    pub name: String,
    pub package: String,
    pub open: bool,
    pub pinned_by_self: bool,
    pub dependencies_ready: bool,
    pub reference_count: usize,
    pub groups: Vec<String>,
    pub dependencies: Vec<String>,
    pub fault: Option<StowageError>,
    pub downloading: bool,
    pub opening: bool,
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub downloads_completed: usize,
    pub downloads_failed: usize,
    pub opens_completed: usize,
    pub opens_failed: usize,
    pub operations_completed: usize,
    pub operations_live: usize,
}

impl TickReport {
    /// Whether anything completed
    pub fn made_progress(&self) -> bool {
        self.downloads_completed + self.opens_completed + self.operations_completed > 0
    }
}

struct ManifestSlot {
    current: BundleManifest,
    previous: Option<BundleManifest>,
}

/// Builder for [`BundleManager`]
///
/// Backends that are not set default to [`HttpFetcher`] and
/// [`ArchiveOpener`] on an [`IoRuntime`], and in simulate mode to a
/// [`DirectorySimulation`] rooted at the configured root path.
///
/// # Example
///
/// ```
/// use stowage_core::StowageConfig;
/// use stowage_runtime::{BundleManager, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// let manager = BundleManager::builder(StowageConfig::default())
///     .memory_backend(&backend)
///     .build()?;
/// assert_eq!(manager.live_operations(), 0);
/// # Ok::<(), stowage_core::StowageError>(())
/// ```
pub struct BundleManagerBuilder {
    config: StowageConfig,
    fetcher: Option<Arc<dyn BundleFetcher>>,
    opener: Option<Arc<dyn BundleOpener>>,
    scenes: Option<Arc<dyn SceneHost>>,
    simulation: Option<Arc<dyn SimulationSource>>,
    runtime: Option<IoRuntime>,
}

impl BundleManagerBuilder {
    pub fn new(config: StowageConfig) -> Self {
        Self {
            config,
            fetcher: None,
            opener: None,
            scenes: None,
            simulation: None,
            runtime: None,
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn BundleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn opener(mut self, opener: Arc<dyn BundleOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn scene_host(mut self, scenes: Arc<dyn SceneHost>) -> Self {
        self.scenes = Some(scenes);
        self
    }

    pub fn simulation(mut self, simulation: Arc<dyn SimulationSource>) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Runtime for the default backends
    pub fn runtime(mut self, runtime: IoRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Use one in-memory backend for every seam
    pub fn memory_backend(self, backend: &MemoryBackend) -> Self {
        self.fetcher(Arc::new(backend.clone()))
            .opener(Arc::new(backend.clone()))
            .scene_host(Arc::new(backend.clone()))
            .simulation(Arc::new(backend.clone()))
    }

    pub fn build(self) -> StowageResult<BundleManager> {
        self.config.validate()?;
        let paths = StoragePaths::from_config(&self.config)?;

        let mut runtime = self.runtime;
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(ensure_runtime(&mut runtime)?)),
        };
        let opener = match self.opener {
            Some(opener) => opener,
            None => Arc::new(ArchiveOpener::new(ensure_runtime(&mut runtime)?)),
        };
        let simulation = match self.simulation {
            Some(simulation) => Some(simulation),
            None if self.config.simulate => {
                let source: Arc<dyn SimulationSource> =
                    Arc::new(DirectorySimulation::new(self.config.root_path.clone()));
                Some(source)
            }
            None => None,
        };

        tracing::info!(
            "Bundle manager using {} (simulate: {}, server: {})",
            paths.platform_dir().display(),
            self.config.simulate,
            paths.has_server()
        );

        Ok(BundleManager {
            downloads: DownloadScheduler::new(
                fetcher,
                self.config.max_parallel_downloads,
                self.config.download_buffer_bytes(),
            ),
            opens: OpenScheduler::new(Arc::clone(&opener), self.config.max_parallel_opens),
            registry: BundleRegistry::new(),
            operations: Vec::new(),
            manifests: HashMap::new(),
            catalog: Catalog::new(),
            opener,
            scenes: self.scenes,
            simulation,
            active_groups: BTreeSet::new(),
            runtime,
            paths,
            config: self.config,
        })
    }
}

fn ensure_runtime(slot: &mut Option<IoRuntime>) -> StowageResult<IoRuntime> {
    if let Some(runtime) = slot {
        return Ok(runtime.clone());
    }
    let runtime = IoRuntime::with_defaults()?;
    *slot = Some(runtime.clone());
    Ok(runtime)
}

/// Loads bundles on demand and keeps them alive while anything needs them
///
/// All state lives here; nothing is global. Call [`tick`](Self::tick) once
/// per frame (or on a timer) from a single thread. Real I/O runs on the
/// [`IoRuntime`] and is picked up by later ticks.
pub struct BundleManager {
    config: StowageConfig,
    paths: StoragePaths,
    registry: BundleRegistry,
    downloads: DownloadScheduler,
    opens: OpenScheduler,
    operations: Vec<LoadOperation>,
    manifests: HashMap<String, ManifestSlot>,
    catalog: Catalog,
    opener: Arc<dyn BundleOpener>,
    scenes: Option<Arc<dyn SceneHost>>,
    simulation: Option<Arc<dyn SimulationSource>>,
    active_groups: BTreeSet<String>,
    runtime: Option<IoRuntime>,
}

impl BundleManager {
    pub fn builder(config: StowageConfig) -> BundleManagerBuilder {
        BundleManagerBuilder::new(config)
    }

    // ------------------------------------------------------------------
    // Manifests and catalogs
    // ------------------------------------------------------------------

    /// Read the package manifest and catalog from local storage
    ///
    /// The manifest loaded before becomes the package's previous manifest,
    /// which [`update_if_needed`](Self::update_if_needed) compares against.
    /// In simulate mode only the catalog is read.
    pub fn load_manifest(&mut self, package: &str) -> StowageResult<()> {
        if !self.config.simulate {
            let path = self.paths.manifest_path(package);
            let manifest = BundleManifest::load(&path).map_err(|e| {
                tracing::error!("Failed to load manifest {}: {}", path.display(), e);
                StowageError::ManifestUnavailable {
                    package: package.to_string(),
                }
            })?;
            if manifest.package != package {
                tracing::error!(
                    "Manifest {} describes package {}, expected {}",
                    path.display(),
                    manifest.package,
                    package
                );
                return Err(StowageError::ManifestUnavailable {
                    package: package.to_string(),
                });
            }
            self.store_manifest(manifest);
        }

        let catalog_path = self.paths.catalog_path(package);
        if catalog_path.is_file() {
            let count = self.catalog.load_file(&catalog_path)?;
            tracing::info!("Loaded {} catalog entries for {}", count, package);
        }
        Ok(())
    }

    /// Use `manifest` for its package without reading any file
    pub fn install_manifest(&mut self, manifest: BundleManifest) -> StowageResult<()> {
        manifest.validate()?;
        self.store_manifest(manifest);
        Ok(())
    }

    fn store_manifest(&mut self, manifest: BundleManifest) {
        let package = manifest.package.clone();
        let previous = self.manifests.remove(&package).map(|slot| slot.current);
        tracing::info!(
            "Manifest for {} has {} bundles",
            package,
            manifest.bundles.len()
        );
        self.manifests.insert(
            package,
            ManifestSlot {
                current: manifest,
                previous,
            },
        );
    }

    /// Download the package manifest; it is loaded when the download
    /// completes. Returns `false` if the download is already queued.
    pub fn fetch_manifest(&mut self, package: &str) -> StowageResult<bool> {
        let url = self
            .paths
            .manifest_url(package)
            .ok_or_else(|| StowageError::ConfigError("no server_url configured".to_string()))?;
        let name = format!("{package}{MANIFEST_SUFFIX}");
        Ok(self.downloads.enqueue(
            &name,
            DownloadKind::Manifest {
                package: package.to_string(),
            },
            url,
            self.paths.manifest_path(package),
            None,
        ))
    }

    pub fn manifest(&self, package: &str) -> Option<&BundleManifest> {
        self.manifests.get(package).map(|slot| &slot.current)
    }

    pub fn previous_manifest(&self, package: &str) -> Option<&BundleManifest> {
        self.manifests
            .get(package)
            .and_then(|slot| slot.previous.as_ref())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    // ------------------------------------------------------------------
    // Pinning and loading
    // ------------------------------------------------------------------

    /// Pin `bundle` and its dependencies for `group` and schedule whatever
    /// is not open yet
    pub fn pin(&mut self, package: &str, bundle: &str, group: &str) -> StowageResult<BundleId> {
        let manifest = self
            .manifests
            .get(package)
            .map(|slot| &slot.current)
            .ok_or_else(|| StowageError::ManifestUnavailable {
                package: package.to_string(),
            })?;
        let outcome = resolver::pin(&mut self.registry, manifest, package, group, bundle)?;

        self.active_groups.insert(group.to_string());
        for id in &outcome.closure {
            self.schedule_open(*id);
        }
        Ok(outcome.id)
    }

    fn schedule_open(&mut self, id: BundleId) {
        let Some(state) = self.registry.get(id) else {
            return;
        };
        if state.is_open() || state.fault().is_some() || self.opens.is_opening(state.name()) {
            return;
        }
        let name = state.name().to_string();
        let package = state.package().to_string();
        let path = self.paths.bundle_path(&name);

        if let Some(url) = self.paths.download_url(&name)
            && !self.opener.is_present(&name, &path)
            && !self.downloads.is_downloading(&name)
        {
            let hash = self
                .manifests
                .get(&package)
                .and_then(|slot| slot.current.content_hash(&name));
            self.downloads
                .enqueue(&name, DownloadKind::Bundle, url, path.clone(), hash);
        }
        self.opens.enqueue(&name, path);
    }

    /// Request an asset from `bundle`
    ///
    /// In simulate mode the asset comes from the simulation source, and a
    /// name the source does not know fails immediately with `AssetNotFound`.
    pub fn load_asset(
        &mut self,
        package: &str,
        bundle: &str,
        group: &str,
        asset: &str,
        type_tag: Option<&str>,
    ) -> StowageResult<LoadHandle> {
        let target = LoadTarget::asset(asset, type_tag);
        if self.config.simulate {
            return self.simulate(bundle, target);
        }
        self.pin(package, bundle, group)?;
        Ok(self.push_operation(bundle, target))
    }

    /// Request a scene from `bundle`. Needs a scene host unless simulating.
    pub fn load_scene(
        &mut self,
        package: &str,
        bundle: &str,
        group: &str,
        scene: &str,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> StowageResult<LoadHandle> {
        let target = LoadTarget::scene(scene, mode, allow_activation);
        if self.config.simulate {
            return self.simulate(bundle, target);
        }
        if self.scenes.is_none() {
            return Err(StowageError::SceneHostUnavailable);
        }
        self.pin(package, bundle, group)?;
        Ok(self.push_operation(bundle, target))
    }

    /// [`load_asset`](Self::load_asset) by catalog id
    pub fn load_asset_by_id(
        &mut self,
        id: &AssetId,
        group: &str,
        type_tag: Option<&str>,
    ) -> StowageResult<LoadHandle> {
        let location = self.resolve_id(id)?;
        self.load_asset(
            &location.package,
            &location.bundle,
            group,
            &location.asset,
            type_tag,
        )
    }

    /// [`load_scene`](Self::load_scene) by catalog id
    pub fn load_scene_by_id(
        &mut self,
        id: &AssetId,
        group: &str,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> StowageResult<LoadHandle> {
        let location = self.resolve_id(id)?;
        self.load_scene(
            &location.package,
            &location.bundle,
            group,
            &location.asset,
            mode,
            allow_activation,
        )
    }

    fn resolve_id(&self, id: &AssetId) -> StowageResult<stowage_bundle::AssetLocation> {
        self.catalog
            .resolve(id)
            .cloned()
            .ok_or_else(|| StowageError::AssetNotFound {
                bundle: String::new(),
                asset: id.to_string(),
            })
    }

    fn push_operation(&mut self, bundle: &str, target: LoadTarget) -> LoadHandle {
        let (operation, handle) = LoadOperation::new(bundle, target);
        self.operations.push(operation);
        handle
    }

    fn simulate(&mut self, bundle: &str, target: LoadTarget) -> StowageResult<LoadHandle> {
        let source = self.simulation.as_ref().ok_or_else(|| {
            StowageError::ConfigError("simulate mode without a simulation source".to_string())
        })?;
        let path = source
            .asset_paths(bundle, target.name())
            .into_iter()
            .next()
            .ok_or_else(|| StowageError::AssetNotFound {
                bundle: bundle.to_string(),
                asset: target.name().to_string(),
            })?;

        let extraction = match &target {
            LoadTarget::Asset { type_tag, .. } => Extraction::Asset(Pending::ready(
                source.load_main_asset(&path, type_tag.as_deref()),
            )),
            LoadTarget::Scene {
                mode,
                allow_activation,
                ..
            } => Extraction::Scene(source.begin_load_scene(&path, *mode, *allow_activation)),
        };
        tracing::debug!("Simulating {} from {}", target.name(), path.display());
        let (operation, handle) = LoadOperation::simulated(target, extraction);
        self.operations.push(operation);
        Ok(handle)
    }

    // ------------------------------------------------------------------
    // Releasing
    // ------------------------------------------------------------------

    /// Drop the client pin on `bundle`
    pub fn release_bundle(&mut self, bundle: &str, unload_all: bool) -> ReleaseOutcome {
        if self.config.simulate {
            return ReleaseOutcome::NotPinned;
        }
        let Some(id) = self.registry.find(bundle) else {
            return ReleaseOutcome::NotPinned;
        };
        let Some(state) = self.registry.get(id) else {
            return ReleaseOutcome::NotPinned;
        };
        if !state.pinned_by_self() {
            return ReleaseOutcome::NotPinned;
        }
        if let Some(blocker) = resolver::release_blocker(&self.registry, id) {
            tracing::debug!("Release of {} waits for {} to settle", bundle, blocker);
            return ReleaseOutcome::InFlight;
        }
        let unloaded = resolver::release(&mut self.registry, id, unload_all);
        tracing::info!("Released {} ({} bundles unloaded)", bundle, unloaded.len());
        ReleaseOutcome::Released(unloaded)
    }

    /// Release every bundle `group` alone holds. The group stays active
    /// until a release completes.
    pub fn release_group(&mut self, group: &str, unload_all: bool) -> GroupRelease {
        if self.config.simulate {
            return GroupRelease {
                complete: true,
                unloaded: Vec::new(),
            };
        }
        let result = groups::release_group(&mut self.registry, group, unload_all);
        if result.complete {
            self.active_groups.remove(group);
        }
        result
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Download `bundle` if it is missing locally or its hash changed since
    /// the previous manifest. Returns whether a download was queued.
    pub fn update_if_needed(&mut self, package: &str, bundle: &str) -> StowageResult<bool> {
        let slot = self
            .manifests
            .get(package)
            .ok_or_else(|| StowageError::ManifestUnavailable {
                package: package.to_string(),
            })?;
        if slot.current.entry(bundle).is_none() {
            return Err(StowageError::UnknownBundle {
                package: package.to_string(),
                bundle: bundle.to_string(),
            });
        }
        if self.registry.by_name(bundle).is_some_and(|s| s.is_open()) {
            return Err(StowageError::UpdateRefused {
                bundle: bundle.to_string(),
                reason: "bundle is open".to_string(),
            });
        }
        if self.opens.is_opening(bundle) {
            return Err(StowageError::UpdateRefused {
                bundle: bundle.to_string(),
                reason: "bundle is being opened".to_string(),
            });
        }
        if self.downloads.is_downloading(bundle) {
            return Ok(false);
        }
        let url = self
            .paths
            .download_url(bundle)
            .ok_or_else(|| StowageError::ConfigError("no server_url configured".to_string()))?;

        let path = self.paths.bundle_path(bundle);
        let hash = slot.current.content_hash(bundle);
        let missing = !self.opener.is_present(bundle, &path);
        let changed = slot
            .previous
            .as_ref()
            .is_some_and(|previous| previous.content_hash(bundle) != hash);
        if !missing && !changed {
            return Ok(false);
        }

        tracing::info!(
            "Updating {} ({})",
            bundle,
            if missing { "missing" } else { "hash changed" }
        );
        Ok(self
            .downloads
            .enqueue(bundle, DownloadKind::Bundle, url, path, hash))
    }

    /// [`update_if_needed`](Self::update_if_needed) for every bundle of the
    /// package, skipping bundles that are in use. Returns the queued names.
    pub fn update_all(&mut self, package: &str) -> StowageResult<Vec<String>> {
        let names = self
            .manifest(package)
            .ok_or_else(|| StowageError::ManifestUnavailable {
                package: package.to_string(),
            })?
            .bundle_names();

        let mut queued = Vec::new();
        for name in names {
            match self.update_if_needed(package, &name) {
                Ok(true) => queued.push(name),
                Ok(false) => {}
                Err(StowageError::UpdateRefused { reason, .. }) => {
                    tracing::debug!("Skipping update of {}: {}", name, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(queued)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance downloads, then opens, then load operations
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for event in self.downloads.advance() {
            report.downloads_completed += 1;
            if event.result.is_err() {
                report.downloads_failed += 1;
            }
            self.on_download(event);
        }

        for event in self.opens.advance(&mut self.registry, &self.downloads) {
            report.opens_completed += 1;
            if matches!(event, OpenEvent::Failed { .. }) {
                report.opens_failed += 1;
            }
        }

        let registry = &self.registry;
        let scenes = self.scenes.as_deref();
        let before = self.operations.len();
        self.operations
            .retain_mut(|operation| !operation.poll(registry, scenes));
        report.operations_completed = before - self.operations.len();
        report.operations_live = self.operations.len();

        report
    }

    fn on_download(&mut self, event: DownloadEvent) {
        let DownloadEvent { name, kind, result } = event;
        match (kind, result) {
            (DownloadKind::Manifest { package }, Ok(_)) => {
                if let Err(e) = self.load_manifest(&package) {
                    tracing::error!("Downloaded manifest for {} is unusable: {}", package, e);
                }
            }
            (DownloadKind::Manifest { package }, Err(e)) => {
                tracing::error!("Manifest download for {} failed: {}", package, e);
            }
            (DownloadKind::Bundle, Ok(_)) => {}
            (DownloadKind::Bundle, Err(e)) => {
                if let Some(id) = self.registry.find(&name) {
                    self.registry.set_fault(id, e);
                    self.registry.propagate_readiness(id);
                }
                if self.opens.cancel(&name) {
                    tracing::warn!("Withdrew open of {} after failed download", name);
                }
            }
        }
    }

    /// Tick until `handle` finishes, at most `max_ticks` times
    pub fn tick_until(
        &mut self,
        handle: &LoadHandle,
        max_ticks: usize,
    ) -> StowageResult<Extracted> {
        for _ in 0..max_ticks {
            self.tick();
            if let Some(result) = handle.result() {
                return result;
            }
        }
        Err(StowageError::InvalidState {
            expected: "finished operation".to_string(),
            actual: handle.state().to_string(),
        })
    }

    /// Tick every `tick_interval_ms` until `handle` finishes or `timeout`
    /// passes
    pub fn wait(&mut self, handle: &LoadHandle, timeout: Duration) -> StowageResult<Extracted> {
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        let deadline = Instant::now() + timeout;
        loop {
            self.tick();
            if let Some(result) = handle.result() {
                return result;
            }
            if Instant::now() >= deadline {
                return Err(StowageError::InvalidState {
                    expected: "finished operation".to_string(),
                    actual: handle.state().to_string(),
                });
            }
            std::thread::sleep(interval);
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// A manifest is loaded, or the manager simulates
    pub fn is_ready(&self) -> bool {
        self.config.simulate || !self.manifests.is_empty()
    }

    pub fn any_downloading(&self) -> bool {
        !self.downloads.is_empty()
    }

    pub fn any_opening(&self) -> bool {
        !self.opens.is_empty()
    }

    pub fn bundle(&self, name: &str) -> Option<BundleSnapshot> {
        let state = self.registry.by_name(name)?;
        Some(BundleSnapshot {
            name: state.name().to_string(),
            package: state.package().to_string(),
            open: state.is_open(),
            pinned_by_self: state.pinned_by_self(),
            dependencies_ready: state.dependencies_ready(),
            reference_count: state.reference_count(),
            groups: state.groups().iter().cloned().collect(),
            dependencies: state.dependency_names().to_vec(),
            fault: state.fault().cloned(),
            downloading: self.downloads.is_downloading(name),
            opening: self.opens.is_opening(name),
        })
    }

    /// The opened bundle, if a client pinned it and it is ready
    pub fn loaded_bundle(&self, name: &str) -> Option<BundleHandle> {
        self.registry
            .by_name(name)
            .filter(|s| s.pinned_by_self() && s.is_ready())
            .and_then(|s| s.handle().cloned())
    }

    pub fn active_groups(&self) -> &BTreeSet<String> {
        &self.active_groups
    }

    pub fn live_operations(&self) -> usize {
        self.operations.len()
    }

    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &StowageConfig {
        &self.config
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Runtime of the default backends, if any were created
    pub fn runtime(&self) -> Option<&IoRuntime> {
        self.runtime.as_ref()
    }
}
