//! Tracing layer that forwards to the host log sink, and subscriber setup

use crate::callback::LogCallbackManager;
use crate::reload::{ReloadHandle, level_to_filter};
use std::fmt::Write as _;
use stowage_core::{LogLevel, LogMode, StowageConfig, StowageResult};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable read for the stderr output filter
pub const LOG_ENV: &str = "STOWAGE_LOG";

/// Tracing layer that forwards log events to a [`LogCallbackManager`]
pub struct CallbackLayer {
    manager: &'static LogCallbackManager,
}

impl CallbackLayer {
    /// Create a layer using the global callback manager
    pub fn new() -> Self {
        Self {
            manager: LogCallbackManager::global(),
        }
    }

    /// Create a layer with a specific callback manager
    pub fn with_manager(manager: &'static LogCallbackManager) -> Self {
        Self { manager }
    }

    fn convert_level(level: &Level) -> LogLevel {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl Default for CallbackLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for CallbackLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Self::convert_level(metadata.level());

        if !self.manager.is_enabled(level) || !self.manager.has_sink() {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.manager
            .log(level, metadata.target(), &visitor.finish());
    }
}

/// Collects the message plus `key=value` pairs for every other field
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

/// Install the global subscriber for a manager configuration
///
/// Events pass a reloadable level filter set from the configured level and
/// log mode, then go to stderr (further filtered by `STOWAGE_LOG`) and to the
/// host sink, if one is installed. Returns `false` when a global subscriber
/// was already set.
pub fn init_logging(config: &StowageConfig) -> bool {
    use tracing_subscriber::prelude::*;

    let level = config.effective_log_level();
    LogCallbackManager::global().set_level(level);

    let (level_layer, handle) = tracing_subscriber::reload::Layer::new(level_to_filter(level));
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("trace"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let subscriber = tracing_subscriber::registry()
        .with(level_layer)
        .with(fmt_layer)
        .with(CallbackLayer::new());

    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if installed {
        ReloadHandle::global().set_handle(handle, level);
    }
    installed
}

/// Change the level at runtime, applying the log mode
pub fn set_log_level(level: LogLevel, mode: LogMode) -> StowageResult<()> {
    let effective = mode.effective_level(level);
    LogCallbackManager::global().set_level(effective);
    ReloadHandle::global().reload_level(effective)
}
