//! Open scheduling
//!
//! Opens wait in FIFO order and at most `max_parallel` advance per tick. A
//! bundle whose download is still in flight is skipped without using up the
//! tick's budget.

use crate::backend::{BundleHandle, BundleOpener};
use crate::download::DownloadScheduler;
use crate::pending::Pending;
use crate::registry::BundleRegistry;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::Poll;
use stowage_core::{StowageError, StowageResult};

/// An open that finished during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenEvent {
    /// The handle was stored in the bundle's state
    Opened(String),
    /// The open failed and the bundle's state was faulted
    Failed { bundle: String, error: StowageError },
    /// The bundle was released while opening; the result was thrown away
    Discarded(String),
}

struct OpenTask {
    bundle: String,
    path: PathBuf,
    pending: Option<Pending<BundleHandle>>,
}

/// Bounded FIFO of opens, one per bundle name
pub struct OpenScheduler {
    queue: VecDeque<OpenTask>,
    max_parallel: usize,
    opener: Arc<dyn BundleOpener>,
}

impl OpenScheduler {
    pub fn new(opener: Arc<dyn BundleOpener>, max_parallel: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_parallel: max_parallel.max(1),
            opener,
        }
    }

    /// Queue an open. Returns `false` if `bundle` is already queued.
    pub fn enqueue(&mut self, bundle: &str, path: PathBuf) -> bool {
        if self.is_opening(bundle) {
            return false;
        }
        tracing::debug!("Queued open of {}", bundle);
        self.queue.push_back(OpenTask {
            bundle: bundle.to_string(),
            path,
            pending: None,
        });
        true
    }

    pub fn is_opening(&self, bundle: &str) -> bool {
        self.queue.iter().any(|t| t.bundle == bundle)
    }

    /// Withdraw the open of `bundle`, started or not
    pub fn cancel(&mut self, bundle: &str) -> bool {
        let before = self.queue.len();
        self.queue.retain(|t| t.bundle != bundle);
        before != self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Bundle names in queue order
    pub fn queued(&self) -> Vec<String> {
        self.queue.iter().map(|t| t.bundle.clone()).collect()
    }

    /// Advance the first `max_parallel` eligible tasks by one step and apply
    /// finished opens to the registry
    pub fn advance(
        &mut self,
        registry: &mut BundleRegistry,
        downloads: &DownloadScheduler,
    ) -> Vec<OpenEvent> {
        let mut events = Vec::new();
        let mut index = 0;
        let mut advanced = 0;

        while index < self.queue.len() && advanced < self.max_parallel {
            if downloads.is_downloading(&self.queue[index].bundle) {
                index += 1;
                continue;
            }
            advanced += 1;
            match self.step(index) {
                Some(result) => {
                    if let Some(task) = self.queue.remove(index) {
                        events.push(apply(registry, task.bundle, result));
                    }
                }
                None => index += 1,
            }
        }
        events
    }

    fn step(&mut self, index: usize) -> Option<StowageResult<BundleHandle>> {
        let task = self.queue.get_mut(index)?;
        if task.pending.is_none() {
            task.pending = Some(self.opener.begin_open(&task.bundle, &task.path));
        }
        match task.pending.as_mut()?.poll() {
            Poll::Ready(result) => Some(result),
            Poll::Pending => None,
        }
    }
}

fn apply(
    registry: &mut BundleRegistry,
    bundle: String,
    result: StowageResult<BundleHandle>,
) -> OpenEvent {
    let Some(id) = registry.find(&bundle) else {
        if let Ok(handle) = result {
            handle.unload(false);
        }
        tracing::debug!("Discarded open of released bundle {}", bundle);
        return OpenEvent::Discarded(bundle);
    };

    match result {
        Ok(handle) => {
            registry.set_handle(id, handle);
            registry.propagate_readiness(id);
            tracing::info!("Opened bundle {}", bundle);
            OpenEvent::Opened(bundle)
        }
        Err(error) => {
            tracing::error!("Failed to open bundle {}: {}", bundle, error);
            registry.set_fault(id, error.clone());
            registry.propagate_readiness(id);
            OpenEvent::Failed { bundle, error }
        }
    }
}
