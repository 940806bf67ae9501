//! Error types for stowage

use thiserror::Error;

/// Result type alias for stowage operations
pub type StowageResult<T> = Result<T, StowageError>;

/// Error type for stowage operations
///
/// Every variant carries owned strings so the error can be cloned into the
/// shared state of a load handle and observed by several waiters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StowageError {
    /// No manifest is loaded for the package
    #[error("manifest unavailable for package '{package}'")]
    ManifestUnavailable { package: String },

    /// The package manifest does not know the bundle
    #[error("unknown bundle '{bundle}' in package '{package}'")]
    UnknownBundle { package: String, bundle: String },

    /// The manifest describes a dependency cycle
    #[error("dependency cycle: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// The asset does not exist in the bundle
    #[error("asset '{asset}' not found in bundle '{bundle}'")]
    AssetNotFound { bundle: String, asset: String },

    /// Fetching a bundle or manifest from the server failed
    #[error("download of '{bundle}' failed: {reason}")]
    DownloadFailed { bundle: String, reason: String },

    /// Opening a bundle from local storage failed
    #[error("open of '{bundle}' failed: {reason}")]
    OpenFailed { bundle: String, reason: String },

    /// The asset or scene extraction request failed
    #[error("extraction of '{target}' failed: {reason}")]
    ExtractionFailed { target: String, reason: String },

    /// Downloaded content does not match the manifest hash
    #[error("checksum mismatch for {bundle}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        bundle: String,
        expected: String,
        actual: String,
    },

    /// A bundle in the dependency closure is faulted
    #[error("bundle '{bundle}' cannot become ready: {cause}")]
    DependencyFailed { bundle: String, cause: String },

    /// The bundle was released while an operation was waiting on it
    #[error("bundle '{0}' was released before the operation completed")]
    BundleReleased(String),

    /// The bundle cannot be updated right now
    #[error("update of '{bundle}' refused: {reason}")]
    UpdateRefused { bundle: String, reason: String },

    /// A scene was requested but no scene host is configured
    #[error("no scene host configured")]
    SceneHostUnavailable,

    /// Operation is not in a valid state for the requested transition
    #[error("invalid operation state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl StowageError {
    /// Returns a stable numeric code for the error kind
    pub fn error_code(&self) -> u32 {
        match self {
            StowageError::ManifestUnavailable { .. } => 1,
            StowageError::UnknownBundle { .. } => 2,
            StowageError::DependencyCycle { .. } => 3,
            StowageError::AssetNotFound { .. } => 4,
            StowageError::DownloadFailed { .. } => 5,
            StowageError::OpenFailed { .. } => 6,
            StowageError::ExtractionFailed { .. } => 7,
            StowageError::ChecksumMismatch { .. } => 8,
            StowageError::DependencyFailed { .. } => 9,
            StowageError::BundleReleased(_) => 10,
            StowageError::UpdateRefused { .. } => 11,
            StowageError::SceneHostUnavailable => 12,
            StowageError::InvalidState { .. } => 13,
            StowageError::ConfigError(_) => 14,
            StowageError::Io(_) => 15,
            StowageError::SerializationError(_) => 16,
            StowageError::Internal(_) => 17,
        }
    }

    /// Whether the error comes from network or disk rather than from a caller mistake
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            StowageError::DownloadFailed { .. }
                | StowageError::OpenFailed { .. }
                | StowageError::ChecksumMismatch { .. }
                | StowageError::Io(_)
        )
    }
}

impl From<std::io::Error> for StowageError {
    fn from(err: std::io::Error) -> Self {
        StowageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StowageError {
    fn from(err: serde_json::Error) -> Self {
        StowageError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for StowageError {
    fn from(err: toml::de::Error) -> Self {
        StowageError::ConfigError(err.to_string())
    }
}
