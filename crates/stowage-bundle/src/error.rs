//! Error types for bundle operations.

use stowage_core::StowageError;
use thiserror::Error;

/// Errors that can occur while reading or writing bundle files.
#[derive(Debug, Error)]
pub enum BundleError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP archive error.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Manifest validation error.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// The manifest lists a dependency cycle.
    #[error("Dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// The manifest does not list the bundle.
    #[error("Unknown bundle: {0}")]
    UnknownBundle(String),

    /// Catalog file name or content error.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Checksum mismatch.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Platform name not recognized.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),

    /// Missing required file in an archive.
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// The archive has no asset with that name and type.
    #[error("Asset '{asset}' not found in bundle '{bundle}'")]
    AssetNotFound { bundle: String, asset: String },
}

impl From<BundleError> for StowageError {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::Io(e) => StowageError::Io(e.to_string()),
            BundleError::Json(e) => StowageError::SerializationError(e.to_string()),
            BundleError::DependencyCycle(chain) => StowageError::DependencyCycle { chain },
            BundleError::AssetNotFound { bundle, asset } => {
                StowageError::AssetNotFound { bundle, asset }
            }
            BundleError::ChecksumMismatch {
                path,
                expected,
                actual,
            } => StowageError::ChecksumMismatch {
                bundle: path,
                expected,
                actual,
            },
            BundleError::UnsupportedPlatform(name) => {
                StowageError::ConfigError(format!("unsupported platform '{name}'"))
            }
            other => StowageError::SerializationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn BundleError___io___displays_message() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BundleError = io_err.into();

        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn BundleError___invalid_manifest___displays_message() {
        let err = BundleError::InvalidManifest("missing package".to_string());

        assert_eq!(err.to_string(), "Invalid manifest: missing package");
    }

    #[test]
    fn BundleError___dependency_cycle___joins_chain() {
        let err = BundleError::DependencyCycle(vec!["a".into(), "b".into(), "a".into()]);

        assert_eq!(err.to_string(), "Dependency cycle: a -> b -> a");
    }

    #[test]
    fn BundleError___checksum_mismatch___displays_all_fields() {
        let err = BundleError::ChecksumMismatch {
            path: "assets/hero".to_string(),
            expected: "sha256:expected".to_string(),
            actual: "sha256:actual".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("assets/hero"));
        assert!(msg.contains("sha256:expected"));
        assert!(msg.contains("sha256:actual"));
    }

    #[test]
    fn BundleError___into_stowage___keeps_asset_not_found() {
        let err = BundleError::AssetNotFound {
            bundle: "characters".to_string(),
            asset: "hero".to_string(),
        };

        let converted: StowageError = err.into();

        assert_eq!(
            converted,
            StowageError::AssetNotFound {
                bundle: "characters".to_string(),
                asset: "hero".to_string(),
            }
        );
    }

    #[test]
    fn BundleError___into_stowage___io_becomes_io() {
        let err: BundleError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied").into();

        let converted: StowageError = err.into();

        assert!(matches!(converted, StowageError::Io(_)));
    }

    #[test]
    fn BundleError___into_stowage___cycle_keeps_chain() {
        let err = BundleError::DependencyCycle(vec!["x".into(), "x".into()]);

        let converted: StowageError = err.into();

        assert_eq!(
            converted,
            StowageError::DependencyCycle {
                chain: vec!["x".into(), "x".into()]
            }
        );
    }
}
