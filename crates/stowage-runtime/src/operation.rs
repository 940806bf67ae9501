//! Load operations and the handles clients hold on them

use crate::asset::Asset;
use crate::backend::SceneHost;
use crate::pending::Pending;
use crate::registry::BundleRegistry;
use crate::resolver;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use stowage_core::{OperationState, SceneLoadMode, StowageError, StowageResult};

/// What an operation loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    Asset {
        name: String,
        /// `None` accepts any type
        type_tag: Option<String>,
    },
    Scene {
        name: String,
        mode: SceneLoadMode,
        allow_activation: bool,
    },
}

impl LoadTarget {
    pub fn asset(name: &str, type_tag: Option<&str>) -> Self {
        LoadTarget::Asset {
            name: name.to_string(),
            type_tag: type_tag.map(str::to_string),
        }
    }

    pub fn scene(name: &str, mode: SceneLoadMode, allow_activation: bool) -> Self {
        LoadTarget::Scene {
            name: name.to_string(),
            mode,
            allow_activation,
        }
    }

    /// Asset or scene name
    pub fn name(&self) -> &str {
        match self {
            LoadTarget::Asset { name, .. } | LoadTarget::Scene { name, .. } => name,
        }
    }

    pub fn is_scene(&self) -> bool {
        matches!(self, LoadTarget::Scene { .. })
    }
}

/// Successful result of an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Asset(Asset),
    /// The scene was loaded by the scene host
    Scene,
}

impl Extracted {
    pub fn asset(&self) -> Option<&Asset> {
        match self {
            Extracted::Asset(asset) => Some(asset),
            Extracted::Scene => None,
        }
    }

    pub fn into_asset(self) -> Option<Asset> {
        match self {
            Extracted::Asset(asset) => Some(asset),
            Extracted::Scene => None,
        }
    }
}

/// An extraction request in flight
pub(crate) enum Extraction {
    Asset(Pending<Asset>),
    Scene(Pending<()>),
}

impl Extraction {
    fn poll(&mut self) -> Poll<StowageResult<Extracted>> {
        match self {
            Extraction::Asset(pending) => pending.poll().map(|r| r.map(Extracted::Asset)),
            Extraction::Scene(pending) => pending.poll().map(|r| r.map(|()| Extracted::Scene)),
        }
    }
}

#[derive(Default)]
struct Shared {
    state: OperationState,
    outcome: Option<StowageResult<Extracted>>,
    waker: Option<Waker>,
}

/// Client view of a [`LoadOperation`]
///
/// Cloning is cheap; every clone observes the same operation. The handle can
/// be polled from the tick's thread through [`state`](Self::state) and
/// [`result`](Self::result), or awaited from any task while something else
/// drives the manager's tick.
#[derive(Clone)]
pub struct LoadHandle {
    bundle: Option<String>,
    target: String,
    shared: Arc<Mutex<Shared>>,
}

impl LoadHandle {
    pub fn state(&self) -> OperationState {
        self.shared.lock().state
    }

    /// Finished, successfully or not
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn progress(&self) -> f32 {
        self.state().progress()
    }

    /// The outcome, once finished
    pub fn result(&self) -> Option<StowageResult<Extracted>> {
        self.shared.lock().outcome.clone()
    }

    /// Bundle the operation loads from; `None` when simulated
    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    /// Asset or scene name
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl std::fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadHandle")
            .field("bundle", &self.bundle)
            .field("target", &self.target)
            .field("state", &self.state())
            .finish()
    }
}

impl Future for LoadHandle {
    type Output = StowageResult<Extracted>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.lock();
        match &shared.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// One asset or scene request, advanced once per tick
///
/// Operations are polled after the download and open schedulers, so readiness
/// produced by an open in tick N is observed in tick N: the operation issues
/// its extraction and moves to `Extracting` in the same tick the last
/// dependency becomes ready, not in the tick after.
pub struct LoadOperation {
    bundle: Option<String>,
    target: LoadTarget,
    extraction: Option<Extraction>,
    shared: Arc<Mutex<Shared>>,
}

impl LoadOperation {
    /// An operation that waits for `bundle` and its dependencies
    pub fn new(bundle: &str, target: LoadTarget) -> (Self, LoadHandle) {
        Self::build(Some(bundle.to_string()), target, None, OperationState::Created)
    }

    /// An operation whose extraction is already issued, used in simulate mode
    pub(crate) fn simulated(target: LoadTarget, extraction: Extraction) -> (Self, LoadHandle) {
        Self::build(None, target, Some(extraction), OperationState::Extracting)
    }

    fn build(
        bundle: Option<String>,
        target: LoadTarget,
        extraction: Option<Extraction>,
        state: OperationState,
    ) -> (Self, LoadHandle) {
        let shared = Arc::new(Mutex::new(Shared {
            state,
            ..Default::default()
        }));
        let handle = LoadHandle {
            bundle: bundle.clone(),
            target: target.name().to_string(),
            shared: Arc::clone(&shared),
        };
        (
            Self {
                bundle,
                target,
                extraction,
                shared,
            },
            handle,
        )
    }

    pub fn state(&self) -> OperationState {
        self.shared.lock().state
    }

    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    pub fn target(&self) -> &LoadTarget {
        &self.target
    }

    pub fn is_simulated(&self) -> bool {
        self.bundle.is_none()
    }

    /// Advance the operation by one step. Returns `true` once it finished.
    pub fn poll(&mut self, registry: &BundleRegistry, scenes: Option<&dyn SceneHost>) -> bool {
        let mut state = self.state();
        if state.is_terminal() {
            return true;
        }

        if state == OperationState::Created {
            self.transition(OperationState::WaitingOnDependencies);
            state = OperationState::WaitingOnDependencies;
        }

        if state == OperationState::WaitingOnDependencies {
            return match self.issue(registry, scenes) {
                Ok(true) => {
                    self.transition(OperationState::Extracting);
                    false
                }
                Ok(false) => false,
                Err(e) => {
                    self.finish(Err(e));
                    true
                }
            };
        }

        let Some(extraction) = self.extraction.as_mut() else {
            self.finish(Err(StowageError::InvalidState {
                expected: "extraction in flight".to_string(),
                actual: state.to_string(),
            }));
            return true;
        };
        match extraction.poll() {
            Poll::Ready(result) => {
                self.finish(result);
                true
            }
            Poll::Pending => false,
        }
    }

    /// Start the extraction once the bundle is ready. `Ok(false)` means keep
    /// waiting.
    fn issue(
        &mut self,
        registry: &BundleRegistry,
        scenes: Option<&dyn SceneHost>,
    ) -> StowageResult<bool> {
        let Some(bundle) = self.bundle.as_deref() else {
            return Err(StowageError::Internal(
                "simulated operation waiting on a bundle".to_string(),
            ));
        };
        let id = registry
            .find(bundle)
            .ok_or_else(|| StowageError::BundleReleased(bundle.to_string()))?;

        for member in resolver::closure(registry, id) {
            if let Some(state) = registry.get(member)
                && let Some(fault) = state.fault()
            {
                return Err(StowageError::DependencyFailed {
                    bundle: state.name().to_string(),
                    cause: fault.to_string(),
                });
            }
        }

        let Some(handle) = registry
            .get(id)
            .filter(|s| s.is_ready())
            .and_then(|s| s.handle())
        else {
            return Ok(false);
        };

        let extraction = match &self.target {
            LoadTarget::Asset { name, type_tag } => {
                Extraction::Asset(handle.begin_load_asset(name, type_tag.as_deref()))
            }
            LoadTarget::Scene {
                name,
                mode,
                allow_activation,
            } => {
                let host = scenes.ok_or(StowageError::SceneHostUnavailable)?;
                Extraction::Scene(host.begin_load_scene(handle, name, *mode, *allow_activation))
            }
        };
        tracing::debug!("Extracting {} from {}", self.target.name(), bundle);
        self.extraction = Some(extraction);
        Ok(true)
    }

    fn transition(&self, next: OperationState) {
        self.shared.lock().state = next;
    }

    fn finish(&mut self, outcome: StowageResult<Extracted>) {
        match &outcome {
            Ok(_) => tracing::debug!("Loaded {}", self.target.name()),
            Err(e) => tracing::warn!("Load of {} failed: {}", self.target.name(), e),
        }
        self.extraction = None;
        let waker = {
            let mut shared = self.shared.lock();
            shared.state = if outcome.is_ok() {
                OperationState::Done
            } else {
                OperationState::Failed
            };
            shared.outcome = Some(outcome);
            shared.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

#[cfg(test)]
#[path = "operation/operation_tests.rs"]
mod operation_tests;
