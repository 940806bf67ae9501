//! stowage-logging - Tracing setup and host log forwarding
//!
//! This crate provides:
//! - [`CallbackLayer`] tracing layer that forwards events to a host log sink
//! - [`LogSink`] type for the host callback
//! - [`ReloadHandle`] for changing the level at runtime
//! - [`init_logging`] which wires all of it from a [`StowageConfig`](stowage_core::StowageConfig)

mod callback;
mod layer;
mod reload;

pub use callback::{LogCallbackManager, LogSink};
pub use layer::{CallbackLayer, init_logging, set_log_level};
pub use reload::ReloadHandle;
pub use stowage_core::{LogLevel, LogMode};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{CallbackLayer, LogCallbackManager, LogLevel, LogSink, init_logging};
}
