//! stowage-core - Core types, configuration and errors
//!
//! This crate provides the foundational types shared by every stowage crate:
//! - [`StowageError`] for error handling
//! - [`StowageConfig`] for manager configuration
//! - [`OperationState`] for the load operation state machine
//! - [`AssetId`] for opaque asset identifiers

mod asset_id;
mod config;
mod error;
mod state;

pub use asset_id::AssetId;
pub use config::{DEFAULT_PACKAGE, LogMode, StowageConfig};
pub use error::{StowageError, StowageResult};
pub use state::{OperationState, SceneLoadMode};

/// Log levels understood by host log callbacks
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }

    /// Parse a level name as written in configuration files
    ///
    /// Unrecognized names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "off" => LogLevel::Off,
            _ => LogLevel::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AssetId, LogLevel, LogMode, OperationState, SceneLoadMode, StowageConfig, StowageError,
        StowageResult,
    };
}
