//! Tokio runtime that carries blocking bundle I/O

use crate::pending::Pending;
use std::future::Future;
use std::sync::Arc;
use stowage_core::{StowageError, StowageResult};
use tokio::runtime::{Builder, Handle, Runtime};

/// Configuration for the I/O runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads (None = number of CPU cores)
    pub worker_threads: Option<usize>,
    /// Name prefix for worker threads
    pub thread_name: String,
    /// Maximum blocking threads
    pub max_blocking_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: Some(2),
            thread_name: "stowage-io".to_string(),
            max_blocking_threads: 64,
        }
    }
}

impl RuntimeConfig {
    /// Create a new runtime configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the thread name prefix
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the blocking thread limit
    pub fn with_max_blocking_threads(mut self, threads: usize) -> Self {
        self.max_blocking_threads = threads;
        self
    }
}

struct OwnedRuntime {
    runtime: Option<Runtime>,
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        // shutdown_background is the only shutdown allowed inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Runs blocking downloads, opens and extractions off the tick thread
///
/// Cloning is cheap; the owned runtime shuts down when the last clone drops.
#[derive(Clone)]
pub struct IoRuntime {
    handle: Handle,
    _owned: Option<Arc<OwnedRuntime>>,
    config: RuntimeConfig,
}

impl IoRuntime {
    /// Create a new runtime with the given configuration
    pub fn new(config: RuntimeConfig) -> StowageResult<Self> {
        let mut builder = Builder::new_multi_thread();

        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }

        builder
            .thread_name(&config.thread_name)
            .max_blocking_threads(config.max_blocking_threads)
            .enable_all();

        let runtime = builder
            .build()
            .map_err(|e| StowageError::Internal(format!("Failed to create runtime: {}", e)))?;

        Ok(Self {
            handle: runtime.handle().clone(),
            _owned: Some(Arc::new(OwnedRuntime {
                runtime: Some(runtime),
            })),
            config,
        })
    }

    /// Create a runtime with default configuration
    pub fn with_defaults() -> StowageResult<Self> {
        Self::new(RuntimeConfig::default())
    }

    /// Borrow an existing runtime instead of owning one
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            _owned: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Get the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get a handle to the underlying Tokio runtime
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Block on a future from a sync context
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    /// Spawn a task on the runtime
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Run blocking work and hand back a [`Pending`] for its result
    ///
    /// A panic in `func` surfaces as an `Internal` error when polled.
    pub fn spawn_blocking<F, T>(&self, func: F) -> Pending<T>
    where
        F: FnOnce() -> StowageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (completer, pending) = Pending::channel();
        self.handle.spawn_blocking(move || {
            completer.complete(func());
        });
        pending
    }
}
