//! Bundle archives, dependency manifests and asset catalogs
//!
//! This crate owns everything stowage reads from or writes to disk:
//! - [`BundleManifest`] describes the bundles of a package, their direct
//!   dependencies and content hashes, and serves as the [`DependencyLookup`]
//!   used when pinning bundles
//! - [`Catalog`] maps opaque [`AssetId`](stowage_core::AssetId)s to a
//!   package, bundle and asset name
//! - [`ArchiveBundle`] and [`ArchiveBuilder`] read and write the default
//!   zip-based bundle format
//! - [`StoragePaths`] lays out the local bundle directory and server URLs
//!
//! # Storage Layout
//!
//! ```text
//! <root>/<directory>/<platform>/
//! ├── Default.manifest.json
//! ├── Default_Catalog.json
//! ├── characters
//! ├── shared-materials
//! └── ...
//! ```
//!
//! # Archive Structure
//!
//! ```text
//! characters
//! ├── bundle.json               # name plus asset table
//! └── assets/
//!     ├── hero.prefab
//!     └── villain.prefab
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stowage_bundle::{ArchiveBuilder, ArchiveBundle};
//!
//! ArchiveBuilder::new("characters")
//!     .add_asset("hero", "prefab", b"hero bytes".to_vec())
//!     .write("AssetBundles/Linux/characters")?;
//!
//! let mut bundle = ArchiveBundle::open("AssetBundles/Linux/characters")?;
//! let hero = bundle.read_asset("hero", Some("prefab"))?;
//! # Ok::<(), stowage_bundle::BundleError>(())
//! ```

mod error;
mod platform;

pub mod archive;
pub mod builder;
pub mod catalog;
pub mod manifest;
pub mod paths;

pub use archive::{ArchiveBundle, ArchiveEntry, ArchiveHeader};
pub use builder::{ArchiveBuilder, compute_sha256, verify_sha256};
pub use catalog::{AssetLocation, Catalog, CatalogFile, CatalogRecord};
pub use error::BundleError;
pub use manifest::{BundleEntry, BundleManifest, DependencyLookup};
pub use paths::StoragePaths;
pub use platform::Platform;

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;

/// Current archive and manifest format version.
pub const FORMAT_VERSION: &str = "1.0";

/// Header file name within an archive.
pub const ARCHIVE_HEADER_FILE: &str = "bundle.json";

/// Directory holding asset payloads within an archive.
pub const ARCHIVE_ASSET_DIR: &str = "assets";

/// Suffix of package manifest files.
pub const MANIFEST_SUFFIX: &str = ".manifest.json";

/// Suffix of package catalog files.
pub const CATALOG_SUFFIX: &str = "_Catalog.json";
