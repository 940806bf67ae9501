//! Seams between the scheduling core and the outside world
//!
//! The core never touches the network, the filesystem or a bundle's binary
//! format directly. It asks these traits to begin a request and polls the
//! returned [`Pending`] on later ticks.

mod archive;
mod http;
mod memory;
mod simulation;

pub use archive::ArchiveOpener;
pub use http::HttpFetcher;
pub use memory::{MemoryBackend, MemoryBundle, SceneLoad};
pub use simulation::DirectorySimulation;

use crate::asset::Asset;
use crate::download::SharedBuffer;
use crate::pending::Pending;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stowage_core::{SceneLoadMode, StowageResult};

/// An opened bundle shared between the registry and in-flight extractions
pub type BundleHandle = Arc<dyn OpenedBundle>;

/// Everything a fetcher needs for one download
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Bundle (or manifest file) being fetched
    pub bundle: String,
    pub url: String,
    /// Final local path; written atomically
    pub destination: PathBuf,
    /// Buffer slot lent for the duration of the download
    pub buffer: SharedBuffer,
    /// "sha256:<hex>" the downloaded bytes must match
    pub expected_hash: Option<String>,
}

/// Fetches remote files to local storage
pub trait BundleFetcher: Send + Sync {
    /// Start a download. Resolves to the number of bytes written.
    fn begin_fetch(&self, request: FetchRequest) -> Pending<u64>;
}

/// Opens bundles from local storage
pub trait BundleOpener: Send + Sync {
    /// Whether the bundle file exists locally
    fn is_present(&self, bundle: &str, path: &Path) -> bool;

    /// Start opening a bundle
    fn begin_open(&self, bundle: &str, path: &Path) -> Pending<BundleHandle>;
}

/// A bundle that is open in memory
pub trait OpenedBundle: Send + Sync {
    fn name(&self) -> &str;

    /// Start extracting an asset. `type_tag` of `None` or `"*"` matches any
    /// type.
    fn begin_load_asset(&self, asset: &str, type_tag: Option<&str>) -> Pending<Asset>;

    /// Release the bundle's memory. With `unload_all`, objects already
    /// extracted from it are released as well, where the backend can.
    fn unload(&self, _unload_all: bool) {}
}

/// Instantiates scenes stored in opened bundles
pub trait SceneHost: Send + Sync {
    fn begin_load_scene(
        &self,
        bundle: &BundleHandle,
        scene: &str,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> Pending<()>;
}

/// Development-time asset source used in simulate mode
pub trait SimulationSource: Send + Sync {
    /// Candidate source files for an asset of a bundle, best match first
    fn asset_paths(&self, bundle: &str, asset: &str) -> Vec<PathBuf>;

    /// Load the main object of a source file
    fn load_main_asset(&self, path: &Path, type_tag: Option<&str>) -> StowageResult<Asset>;

    /// Load a scene directly from its source file
    fn begin_load_scene(
        &self,
        path: &Path,
        mode: SceneLoadMode,
        allow_activation: bool,
    ) -> Pending<()>;
}

/// Whether an asset's type satisfies a requested type
pub(crate) fn type_matches(actual: &str, requested: Option<&str>) -> bool {
    match requested {
        None | Some("") | Some("*") => true,
        Some(tag) => actual == tag,
    }
}
