//! Runtime log level changes

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use stowage_core::{LogLevel, StowageError, StowageResult};
use tracing_subscriber::Registry;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::reload;

type LevelHandle = reload::Handle<LevelFilter, Registry>;

/// Holds the reloadable level filter installed by
/// [`init_logging`](crate::init_logging) and the level it was last set to.
#[derive(Default)]
pub struct ReloadHandle {
    slot: Mutex<Option<(LevelHandle, LogLevel)>>,
}

impl ReloadHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide handle used by [`set_log_level`](crate::set_log_level)
    pub fn global() -> &'static ReloadHandle {
        static INSTANCE: OnceCell<ReloadHandle> = OnceCell::new();
        INSTANCE.get_or_init(ReloadHandle::new)
    }

    /// Adopt the filter handle; `level` is what the filter currently passes
    pub fn set_handle(&self, handle: LevelHandle, level: LogLevel) {
        *self.slot.lock() = Some((handle, level));
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Level the filter passes, if a filter is installed
    pub fn current_level(&self) -> Option<LogLevel> {
        self.slot.lock().as_ref().map(|(_, level)| *level)
    }

    /// Swap the filter for one passing `level` and above
    pub fn reload_level(&self, level: LogLevel) -> StowageResult<()> {
        let mut slot = self.slot.lock();
        let (handle, current) = slot.as_mut().ok_or_else(|| {
            StowageError::ConfigError("log level changed before init_logging".to_string())
        })?;
        handle
            .reload(level_to_filter(level))
            .map_err(|e| StowageError::Internal(format!("log filter reload failed: {e}")))?;
        *current = level;
        Ok(())
    }
}

pub(crate) fn level_to_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}
