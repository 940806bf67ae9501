//! Bundle state arena
//!
//! Every distinct bundle name that is pinned, directly or as a dependency,
//! has exactly one [`BundleState`]. States live in an arena indexed by
//! [`BundleId`]; dependency edges are stored as ids in both directions.

use crate::backend::BundleHandle;
use std::collections::{BTreeSet, HashMap, VecDeque};
use stowage_core::StowageError;

/// Stable index of a state in the registry
///
/// Ids are reused after a state is removed, so an id held across a release
/// may later name a different bundle. Look bundles up by name when in doubt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleId(usize);

impl BundleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BundleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracking data for one bundle
pub struct BundleState {
    pub(crate) name: String,
    pub(crate) package: String,
    pub(crate) handle: Option<BundleHandle>,
    pub(crate) pinned_by_self: bool,
    pub(crate) dependencies_ready: bool,
    pub(crate) reference_count: usize,
    pub(crate) groups: BTreeSet<String>,
    pub(crate) dependency_names: Vec<String>,
    pub(crate) dependencies: Vec<BundleId>,
    pub(crate) dependents: BTreeSet<BundleId>,
    pub(crate) fault: Option<StowageError>,
}

impl BundleState {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn handle(&self) -> Option<&BundleHandle> {
        self.handle.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// A client requested this bundle itself, not only as a dependency
    pub fn pinned_by_self(&self) -> bool {
        self.pinned_by_self
    }

    /// Every direct dependency is open, healthy and itself dependency-ready
    pub fn dependencies_ready(&self) -> bool {
        self.dependencies_ready
    }

    pub fn reference_count(&self) -> usize {
        self.reference_count
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn dependency_names(&self) -> &[String] {
        &self.dependency_names
    }

    pub fn dependencies(&self) -> &[BundleId] {
        &self.dependencies
    }

    pub fn dependents(&self) -> &BTreeSet<BundleId> {
        &self.dependents
    }

    pub fn fault(&self) -> Option<&StowageError> {
        self.fault.as_ref()
    }

    /// Open, healthy and with every dependency ready
    pub fn is_ready(&self) -> bool {
        self.handle.is_some() && self.dependencies_ready && self.fault.is_none()
    }

    /// No longer waiting on I/O: either open or failed
    pub fn is_settled(&self) -> bool {
        self.handle.is_some() || self.fault.is_some()
    }
}

/// Arena of bundle states with a name index
#[derive(Default)]
pub struct BundleRegistry {
    slots: Vec<Option<BundleState>>,
    free: Vec<usize>,
    by_name: HashMap<String, BundleId>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live states
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<BundleId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: BundleId) -> Option<&BundleState> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: BundleId) -> Option<&mut BundleState> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn by_name(&self, name: &str) -> Option<&BundleState> {
        self.find(name).and_then(|id| self.get(id))
    }

    /// Live states in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (BundleId, &BundleState)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (BundleId(i), s)))
    }

    /// Create an unwired state with a zero count
    pub(crate) fn insert(
        &mut self,
        name: &str,
        package: &str,
        dependency_names: Vec<String>,
        dependencies: Vec<BundleId>,
    ) -> BundleId {
        let state = BundleState {
            name: name.to_string(),
            package: package.to_string(),
            handle: None,
            pinned_by_self: false,
            dependencies_ready: dependencies.is_empty(),
            reference_count: 0,
            groups: BTreeSet::new(),
            dependency_names,
            dependencies,
            dependents: BTreeSet::new(),
            fault: None,
        };

        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(state);
                BundleId(index)
            }
            None => {
                self.slots.push(Some(state));
                BundleId(self.slots.len() - 1)
            }
        };
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub(crate) fn remove(&mut self, id: BundleId) -> Option<BundleState> {
        let state = self.slots.get_mut(id.0)?.take()?;
        self.by_name.remove(&state.name);
        self.free.push(id.0);
        Some(state)
    }

    /// Store an opened handle and clear any earlier fault
    pub(crate) fn set_handle(&mut self, id: BundleId, handle: BundleHandle) {
        if let Some(state) = self.get_mut(id) {
            state.handle = Some(handle);
            state.fault = None;
        }
    }

    pub(crate) fn set_fault(&mut self, id: BundleId, fault: StowageError) {
        if let Some(state) = self.get_mut(id) {
            state.fault = Some(fault);
        }
    }

    /// Readiness of `id`'s direct dependencies as the graph stands now
    pub fn compute_dependencies_ready(&self, id: BundleId) -> bool {
        let Some(state) = self.get(id) else {
            return false;
        };
        state
            .dependencies
            .iter()
            .all(|dep| self.get(*dep).is_some_and(BundleState::is_ready))
    }

    /// Recompute readiness for `id` and every dependent whose input changed
    ///
    /// Walks dependents breadth-first in ascending id order. The starting
    /// node always notifies its dependents, since the caller changed its
    /// handle or fault directly.
    pub(crate) fn propagate_readiness(&mut self, id: BundleId) {
        let mut queue = VecDeque::from([id]);
        let mut first = true;

        while let Some(current) = queue.pop_front() {
            let ready = self.compute_dependencies_ready(current);
            let Some(state) = self.get_mut(current) else {
                first = false;
                continue;
            };

            let was_ready = state.is_ready();
            state.dependencies_ready = ready;
            let changed = state.is_ready() != was_ready;

            if first || changed {
                queue.extend(state.dependents.iter().copied());
            }
            first = false;
        }
    }
}

#[cfg(test)]
#[path = "registry/registry_tests.rs"]
mod registry_tests;
