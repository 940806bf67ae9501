//! Releasing everything an ownership group holds

use crate::registry::BundleRegistry;
use crate::resolver;

/// Result of [`release_group`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRelease {
    /// `false` when a member was still loading; call again later
    pub complete: bool,
    /// Bundles unloaded by this call
    pub unloaded: Vec<String>,
}

/// Drop `group` from every bundle it holds, releasing bundles it alone owns
///
/// Bundles shared with another group only lose the group tag. A bundle owned
/// by `group` alone keeps the tag and makes the release incomplete while it,
/// or any dependency its release would unload, is still downloading or
/// opening.
pub fn release_group(registry: &mut BundleRegistry, group: &str, unload_all: bool) -> GroupRelease {
    let members: Vec<_> = registry
        .iter()
        .filter(|(_, state)| state.groups().contains(group))
        .map(|(id, _)| id)
        .collect();

    let mut result = GroupRelease {
        complete: true,
        unloaded: Vec::new(),
    };

    for id in members {
        // An earlier release in this loop may have removed or replaced it
        let Some(state) = registry.get_mut(id) else {
            continue;
        };
        if !state.groups.contains(group) {
            continue;
        }

        if state.groups.len() > 1 {
            state.groups.remove(group);
            continue;
        }
        let blocker = if state.is_settled() {
            resolver::release_blocker(registry, id)
        } else {
            Some(state.name.clone())
        };
        if let Some(blocker) = blocker {
            tracing::debug!("Group {} waits for {} to settle", group, blocker);
            result.complete = false;
            continue;
        }

        let Some(state) = registry.get_mut(id) else {
            continue;
        };
        state.groups.remove(group);
        if state.pinned_by_self {
            result
                .unloaded
                .extend(resolver::release(registry, id, unload_all));
        }
    }

    tracing::info!(
        "Released group {} ({} bundles unloaded, complete: {})",
        group,
        result.unloaded.len(),
        result.complete
    );
    result
}
