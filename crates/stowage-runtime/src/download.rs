//! Download scheduling
//!
//! Tasks wait in FIFO order. Each tick advances at most `max_parallel` of
//! them; a task borrows a buffer slot from the [`BufferPool`] when it starts
//! and returns it when it completes, whatever the outcome.

use crate::backend::{BundleFetcher, FetchRequest};
use crate::pending::Pending;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::Poll;
use stowage_core::StowageResult;

/// A reusable download buffer
pub type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Fixed set of download buffers handed out round-robin
pub struct BufferPool {
    slots: Vec<SharedBuffer>,
    in_use: Vec<bool>,
    next: usize,
}

impl BufferPool {
    /// `count` slots of `slot_size` bytes each
    pub fn new(count: usize, slot_size: usize) -> Self {
        let count = count.max(1);
        Self {
            slots: (0..count)
                .map(|_| Arc::new(Mutex::new(vec![0u8; slot_size])))
                .collect(),
            in_use: vec![false; count],
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }

    pub fn slot_size(&self) -> usize {
        self.slots.first().map(|s| s.lock().len()).unwrap_or(0)
    }

    /// Take the next free slot after the last one handed out
    pub fn acquire(&mut self) -> Option<(usize, SharedBuffer)> {
        let count = self.slots.len();
        for offset in 0..count {
            let index = (self.next + offset) % count;
            if !self.in_use[index] {
                self.in_use[index] = true;
                self.next = (index + 1) % count;
                return Some((index, Arc::clone(&self.slots[index])));
            }
        }
        None
    }

    pub fn release(&mut self, index: usize) {
        if let Some(used) = self.in_use.get_mut(index) {
            *used = false;
        }
    }
}

/// What a download produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadKind {
    /// A bundle file
    Bundle,
    /// The manifest of a package
    Manifest { package: String },
}

/// A download that finished during a tick
#[derive(Debug)]
pub struct DownloadEvent {
    /// Bundle name, or the manifest file name for manifests
    pub name: String,
    pub kind: DownloadKind,
    /// Bytes written, or why the download failed
    pub result: StowageResult<u64>,
}

struct DownloadTask {
    name: String,
    kind: DownloadKind,
    url: String,
    destination: PathBuf,
    expected_hash: Option<String>,
    running: Option<Running>,
}

struct Running {
    slot: usize,
    pending: Pending<u64>,
}

/// Bounded FIFO of downloads, one per name
pub struct DownloadScheduler {
    queue: VecDeque<DownloadTask>,
    max_parallel: usize,
    pool: BufferPool,
    fetcher: Arc<dyn BundleFetcher>,
}

impl DownloadScheduler {
    pub fn new(fetcher: Arc<dyn BundleFetcher>, max_parallel: usize, buffer_size: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            queue: VecDeque::new(),
            max_parallel,
            pool: BufferPool::new(max_parallel, buffer_size),
            fetcher,
        }
    }

    /// Queue a download. Returns `false` if `name` is already queued.
    pub fn enqueue(
        &mut self,
        name: &str,
        kind: DownloadKind,
        url: String,
        destination: PathBuf,
        expected_hash: Option<String>,
    ) -> bool {
        if self.is_downloading(name) {
            return false;
        }
        tracing::debug!("Queued download of {} from {}", name, url);
        self.queue.push_back(DownloadTask {
            name: name.to_string(),
            kind,
            url,
            destination,
            expected_hash,
            running: None,
        });
        true
    }

    /// Whether a download for `name` is queued or running
    pub fn is_downloading(&self, name: &str) -> bool {
        self.queue.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Names in queue order
    pub fn queued(&self) -> Vec<String> {
        self.queue.iter().map(|t| t.name.clone()).collect()
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Advance the first `max_parallel` tasks by one step
    pub fn advance(&mut self) -> Vec<DownloadEvent> {
        let mut events = Vec::new();
        let mut index = 0;
        let mut advanced = 0;

        while index < self.queue.len() && advanced < self.max_parallel {
            advanced += 1;
            match self.step(index) {
                Some(result) => {
                    if let Some(task) = self.queue.remove(index) {
                        events.push(Self::finish(task, result));
                    }
                }
                None => index += 1,
            }
        }
        events
    }

    /// Start or poll the task at `index`, returning its result once complete
    fn step(&mut self, index: usize) -> Option<StowageResult<u64>> {
        let task = self.queue.get_mut(index)?;

        if task.running.is_none() {
            let (slot, buffer) = self.pool.acquire()?;
            let pending = self.fetcher.begin_fetch(FetchRequest {
                bundle: task.name.clone(),
                url: task.url.clone(),
                destination: task.destination.clone(),
                buffer,
                expected_hash: task.expected_hash.clone(),
            });
            task.running = Some(Running { slot, pending });
        }

        let running = task.running.as_mut()?;
        match running.pending.poll() {
            Poll::Ready(result) => {
                self.pool.release(running.slot);
                Some(result)
            }
            Poll::Pending => None,
        }
    }

    fn finish(task: DownloadTask, result: StowageResult<u64>) -> DownloadEvent {
        match &result {
            Ok(bytes) => tracing::info!("Downloaded {} ({} bytes)", task.name, bytes),
            Err(e) => tracing::error!("Download of {} failed: {}", task.name, e),
        }
        DownloadEvent {
            name: task.name,
            kind: task.kind,
            result,
        }
    }
}

#[cfg(test)]
#[path = "download/download_tests.rs"]
mod download_tests;
