//! # stowage
//!
//! Lazily fetched, reference-counted content bundles.
//!
//! stowage loads named assets and scenes out of bundles that may live on a
//! remote server, providing:
//! - On-demand download and open of a bundle and its whole dependency closure
//! - Reference counting so shared dependencies stay loaded while needed
//! - Ownership groups that release everything a scene or level pinned
//! - A single-threaded `tick()` that drives all I/O without blocking
//! - Logging callbacks to a host application
//!
//! ## Quick Start
//!
//! ```no_run
//! use stowage::prelude::*;
//! use std::time::Duration;
//!
//! let config = StowageConfig::default().with_server_url("https://cdn.example.com/bundles");
//! init_logging(&config);
//!
//! let mut manager = BundleManager::builder(config).build()?;
//! manager.load_manifest("Default")?;
//!
//! let hero = manager.load_asset("Default", "characters", "level1", "hero", Some("prefab"))?;
//! let asset = manager.wait(&hero, Duration::from_secs(30))?;
//! tracing::info!("loaded {:?}", asset);
//!
//! manager.release_group("level1", false);
//! # Ok::<(), stowage::StowageError>(())
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`stowage_core`] - Errors, configuration and shared types
//! - [`stowage_bundle`] - Manifests, catalogs and the archive bundle format
//! - [`stowage_runtime`] - The bundle manager, schedulers and backends
//! - [`stowage_logging`] - Tracing setup and host log callbacks

// Re-export core types
pub use stowage_core::{
    AssetId, DEFAULT_PACKAGE, LogLevel, LogMode, OperationState, SceneLoadMode, StowageConfig,
    StowageError, StowageResult,
};

// Re-export bundle formats
pub use stowage_bundle::{
    ArchiveBuilder, ArchiveBundle, AssetLocation, BundleError, BundleManifest, Catalog,
    DependencyLookup, StoragePaths,
};

// Re-export the runtime
pub use stowage_runtime::{
    Asset, BundleHandle, BundleManager, BundleManagerBuilder, BundleSnapshot, Extracted,
    GroupRelease, IoRuntime, LoadHandle, MemoryBackend, MemoryBundle, ReleaseOutcome,
    RuntimeConfig, TickReport,
};

// Re-export logging
pub use stowage_logging::{LogCallbackManager, init_logging, set_log_level};

/// Backend traits and the shipped implementations.
pub mod backend {
    pub use stowage_runtime::{
        ArchiveOpener, BundleFetcher, BundleOpener, DirectorySimulation, FetchRequest,
        HttpFetcher, OpenedBundle, Pending, SceneHost, SimulationSource,
    };
}

// Re-export common dependencies that hosts need
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use stowage::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        AssetId, BundleManager, Extracted, LoadHandle, OperationState, ReleaseOutcome,
        SceneLoadMode, StowageConfig, StowageError, StowageResult, init_logging,
    };
}
