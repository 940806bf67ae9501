//! Host log sink management

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use stowage_core::LogLevel;

/// Host callback receiving `(level, target, message)` for every forwarded
/// event.
pub type LogSink = Arc<dyn Fn(LogLevel, &str, &str) + Send + Sync>;

/// Global log callback manager
static CALLBACK_MANAGER: OnceCell<LogCallbackManager> = OnceCell::new();

/// Holds the host sink and the level below which events are dropped
pub struct LogCallbackManager {
    sink: RwLock<Option<LogSink>>,
    level: AtomicU8,
}

impl LogCallbackManager {
    /// Create a new callback manager
    pub fn new() -> Self {
        Self {
            sink: RwLock::new(None),
            level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Get the global callback manager instance
    pub fn global() -> &'static LogCallbackManager {
        CALLBACK_MANAGER.get_or_init(LogCallbackManager::new)
    }

    /// Set or clear the host sink
    pub fn set_sink(&self, sink: Option<LogSink>) {
        *self.sink.write() = sink;
    }

    /// Whether a host sink is installed
    pub fn has_sink(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Set the log level
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Get the current log level
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::SeqCst))
    }

    /// Check if a log level is enabled
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Forward one event to the sink if it is set and the level is enabled
    pub fn log(&self, level: LogLevel, target: &str, message: &str) {
        if !self.is_enabled(level) {
            return;
        }

        // Clone out of the lock so a sink that logs again cannot deadlock.
        let sink = match self.sink.read().as_ref() {
            Some(sink) => Arc::clone(sink),
            None => return,
        };

        sink(level, target, message);
    }
}

impl Default for LogCallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "callback/callback_tests.rs"]
mod callback_tests;
