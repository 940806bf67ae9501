//! Pinning and releasing bundles with their dependency closures
//!
//! A bundle's reference count is one for its own pin plus one for every
//! distinct live bundle that lists it as a direct dependency. Paths through
//! the graph are never counted, so a diamond adds one count per edge.

use crate::registry::{BundleId, BundleRegistry};
use std::collections::{HashMap, HashSet, VecDeque};
use stowage_bundle::DependencyLookup;
use stowage_core::{StowageError, StowageResult};

/// Result of a successful [`pin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinOutcome {
    /// The pinned bundle
    pub id: BundleId,
    /// The bundle and everything it depends on, root first
    pub closure: Vec<BundleId>,
    /// States created by this pin, dependencies before dependents
    pub created: Vec<BundleId>,
}

/// A bundle the commit phase has to create
struct Planned {
    name: String,
    dependencies: Vec<String>,
}

/// Pin `bundle` for `group`, creating states for any missing part of its
/// dependency closure
///
/// Fails with `UnknownBundle` or `DependencyCycle` before touching the
/// registry. Pinning an already pinned bundle only adds the group.
pub fn pin(
    registry: &mut BundleRegistry,
    lookup: &dyn DependencyLookup,
    package: &str,
    group: &str,
    bundle: &str,
) -> StowageResult<PinOutcome> {
    let plan = plan(registry, lookup, package, bundle)?;

    let mut created = Vec::with_capacity(plan.len());
    for planned in plan {
        let dependencies: Vec<BundleId> = planned
            .dependencies
            .iter()
            .filter_map(|name| registry.find(name))
            .collect();
        let id = registry.insert(
            &planned.name,
            package,
            planned.dependencies,
            dependencies.clone(),
        );
        for dependency in &dependencies {
            if let Some(state) = registry.get_mut(*dependency) {
                state.dependents.insert(id);
                state.reference_count += 1;
            }
        }
        let ready = registry.compute_dependencies_ready(id);
        if let Some(state) = registry.get_mut(id) {
            state.dependencies_ready = ready;
        }
        tracing::debug!("Created state {} for bundle {}", id, planned.name);
        created.push(id);
    }

    let id = registry.find(bundle).ok_or_else(|| {
        StowageError::Internal(format!("bundle {bundle} missing after planning"))
    })?;
    if let Some(state) = registry.get_mut(id)
        && !state.pinned_by_self
    {
        state.pinned_by_self = true;
        state.reference_count += 1;
    }

    let closure = closure(registry, id);
    for member in &closure {
        if let Some(state) = registry.get_mut(*member) {
            state.groups.insert(group.to_string());
        }
    }

    Ok(PinOutcome {
        id,
        closure,
        created,
    })
}

/// Walk every name missing from the registry without mutating anything
///
/// Returns the missing bundles in post-order so that each one comes after
/// all of its dependencies.
fn plan(
    registry: &BundleRegistry,
    lookup: &dyn DependencyLookup,
    package: &str,
    root: &str,
) -> StowageResult<Vec<Planned>> {
    let mut order = Vec::new();
    let mut done: HashSet<String> = HashSet::new();
    // (name, direct dependencies, index of the next dependency to visit)
    let mut stack: Vec<(String, Vec<String>, usize)> = Vec::new();

    let enter = |name: &str, stack: &mut Vec<(String, Vec<String>, usize)>| {
        let dependencies = lookup.direct_dependencies(name).ok_or_else(|| {
            StowageError::UnknownBundle {
                package: package.to_string(),
                bundle: name.to_string(),
            }
        })?;
        let mut seen = HashSet::new();
        let dependencies = dependencies
            .into_iter()
            .filter(|d| seen.insert(d.clone()))
            .collect();
        stack.push((name.to_string(), dependencies, 0));
        Ok::<(), StowageError>(())
    };

    if registry.find(root).is_some() {
        return Ok(order);
    }
    enter(root, &mut stack)?;

    while let Some((_, dependencies, next)) = stack.last_mut() {
        let Some(dependency) = dependencies.get(*next).cloned() else {
            if let Some((name, dependencies, _)) = stack.pop() {
                done.insert(name.clone());
                order.push(Planned { name, dependencies });
            }
            continue;
        };
        *next += 1;

        if registry.find(&dependency).is_some() || done.contains(&dependency) {
            continue;
        }
        if let Some(start) = stack.iter().position(|(n, _, _)| *n == dependency) {
            let mut chain: Vec<String> =
                stack[start..].iter().map(|(n, _, _)| n.clone()).collect();
            chain.push(dependency);
            return Err(StowageError::DependencyCycle { chain });
        }
        enter(&dependency, &mut stack)?;
    }

    Ok(order)
}

/// `id` and every bundle it depends on, in pre-order
pub fn closure(registry: &BundleRegistry, id: BundleId) -> Vec<BundleId> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![id];

    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let Some(state) = registry.get(current) else {
            continue;
        };
        order.push(current);
        stack.extend(state.dependencies().iter().rev().copied());
    }
    order
}

/// The first bundle that releasing the client pin on `id` would unload while
/// it is still downloading or opening
///
/// Counts are replayed on a scratch map, so the registry is untouched. A
/// bundle that keeps a reference after the release never blocks it.
pub fn release_blocker(registry: &BundleRegistry, id: BundleId) -> Option<String> {
    if !registry.get(id)?.pinned_by_self() {
        return None;
    }

    let mut remaining: HashMap<BundleId, usize> = HashMap::new();
    let mut worklist = VecDeque::from([id]);
    while let Some(current) = worklist.pop_front() {
        let Some(state) = registry.get(current) else {
            continue;
        };
        let count = remaining.entry(current).or_insert(state.reference_count());
        if *count == 0 {
            continue;
        }
        *count -= 1;
        if *count > 0 {
            continue;
        }
        if !state.is_settled() {
            return Some(state.name().to_string());
        }
        worklist.extend(state.dependencies().iter().copied());
    }
    None
}

/// Drop the client pin on `id` and unload everything that loses its last
/// reference
///
/// Returns the names of the unloaded bundles in unload order. Releasing a
/// bundle that is not pinned by a client does nothing. This unloads without
/// looking at in-flight work; the manager checks [`release_blocker`] first.
pub fn release(registry: &mut BundleRegistry, id: BundleId, unload_all: bool) -> Vec<String> {
    let mut unloaded = Vec::new();
    match registry.get_mut(id) {
        Some(state) if state.pinned_by_self => state.pinned_by_self = false,
        _ => return unloaded,
    }

    let mut worklist = VecDeque::from([id]);
    while let Some(current) = worklist.pop_front() {
        let Some(state) = registry.get_mut(current) else {
            continue;
        };
        state.reference_count = state.reference_count.saturating_sub(1);
        if state.reference_count > 0 {
            continue;
        }

        let Some(state) = registry.remove(current) else {
            continue;
        };
        if let Some(handle) = &state.handle {
            handle.unload(unload_all);
        }
        for dependency in &state.dependencies {
            if let Some(dep) = registry.get_mut(*dependency) {
                dep.dependents.remove(&current);
            }
            worklist.push_back(*dependency);
        }
        tracing::debug!("Unloaded bundle {}", state.name);
        unloaded.push(state.name);
    }
    unloaded
}

/// Reference counts recomputed from the graph, for consistency checks
pub fn expected_counts(registry: &BundleRegistry) -> HashMap<BundleId, usize> {
    registry
        .iter()
        .map(|(id, state)| {
            let dependents = state
                .dependents()
                .iter()
                .filter(|d| registry.get(**d).is_some())
                .count();
            (id, usize::from(state.pinned_by_self()) + dependents)
        })
        .collect()
}
