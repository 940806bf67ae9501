//! stowage-runtime - Tick-driven bundle loading
//!
//! This crate provides:
//! - [`BundleManager`], the context object clients talk to
//! - [`BundleRegistry`] and the [`resolver`] that pins and releases bundles
//!   with their dependency closures
//! - [`DownloadScheduler`] and [`OpenScheduler`], the bounded I/O queues
//! - [`LoadOperation`] and [`LoadHandle`] for asset and scene requests
//! - [`IoRuntime`], the tokio runtime that real I/O runs on
//! - Backend traits plus HTTP, zip archive, in-memory and directory backends
//!
//! # Tick Order
//!
//! ```text
//! tick()
//!  ├── DownloadScheduler::advance   fetch results fault or free bundles
//!  ├── OpenScheduler::advance       handles land in the registry
//!  └── LoadOperation::poll          same-tick readiness is visible here
//! ```

mod asset;
mod backend;
mod download;
pub mod groups;
mod manager;
mod open;
mod operation;
mod pending;
mod registry;
pub mod resolver;
mod runtime;

pub use asset::Asset;
pub use backend::{
    ArchiveOpener, BundleFetcher, BundleHandle, BundleOpener, DirectorySimulation, FetchRequest,
    HttpFetcher, MemoryBackend, MemoryBundle, OpenedBundle, SceneHost, SceneLoad, SimulationSource,
};
pub use download::{BufferPool, DownloadEvent, DownloadKind, DownloadScheduler, SharedBuffer};
pub use groups::GroupRelease;
pub use manager::{BundleManager, BundleManagerBuilder, BundleSnapshot, ReleaseOutcome, TickReport};
pub use open::{OpenEvent, OpenScheduler};
pub use operation::{Extracted, LoadHandle, LoadOperation, LoadTarget};
pub use pending::{Completer, Pending};
pub use registry::{BundleId, BundleRegistry, BundleState};
pub use resolver::PinOutcome;
pub use runtime::{IoRuntime, RuntimeConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Asset, BundleManager, BundleManagerBuilder, Extracted, GroupRelease, IoRuntime,
        LoadHandle, MemoryBackend, MemoryBundle, ReleaseOutcome, TickReport,
    };
}
