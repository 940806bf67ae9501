#![allow(non_snake_case)]

use super::*;
use crate::asset::Asset;
use crate::backend::OpenedBundle;
use crate::pending::Pending;
use std::sync::Arc;

struct StubBundle(String);

impl OpenedBundle for StubBundle {
    fn name(&self) -> &str {
        &self.0
    }

    fn begin_load_asset(&self, asset: &str, _type_tag: Option<&str>) -> Pending<Asset> {
        Pending::ready(Ok(Asset::from_bytes(asset, "bytes", Vec::new())))
    }
}

fn handle(name: &str) -> BundleHandle {
    Arc::new(StubBundle(name.to_string()))
}

/// Builds `top -> mid -> leaf` with edges wired both ways
fn chain(registry: &mut BundleRegistry) -> (BundleId, BundleId, BundleId) {
    let leaf = registry.insert("leaf", "Default", Vec::new(), Vec::new());
    let mid = registry.insert("mid", "Default", vec!["leaf".into()], vec![leaf]);
    let top = registry.insert("top", "Default", vec!["mid".into()], vec![mid]);
    registry.get_mut(leaf).unwrap().dependents.insert(mid);
    registry.get_mut(mid).unwrap().dependents.insert(top);
    (top, mid, leaf)
}

#[test]
fn BundleRegistry___insert___indexes_by_name() {
    let mut registry = BundleRegistry::new();

    let id = registry.insert("a", "Default", Vec::new(), Vec::new());

    assert_eq!(registry.find("a"), Some(id));
    assert_eq!(registry.by_name("a").unwrap().name(), "a");
    assert_eq!(registry.len(), 1);
}

#[test]
fn BundleRegistry___insert_without_dependencies___is_dependencies_ready() {
    let mut registry = BundleRegistry::new();

    let id = registry.insert("a", "Default", Vec::new(), Vec::new());
    let state = registry.get(id).unwrap();

    assert!(state.dependencies_ready());
    assert!(!state.is_ready());
    assert!(!state.is_settled());
}

#[test]
fn BundleRegistry___remove___frees_name_and_reuses_slot() {
    let mut registry = BundleRegistry::new();
    let a = registry.insert("a", "Default", Vec::new(), Vec::new());

    let removed = registry.remove(a).unwrap();
    let b = registry.insert("b", "Default", Vec::new(), Vec::new());

    assert_eq!(removed.name(), "a");
    assert_eq!(registry.find("a"), None);
    assert_eq!(a, b);
    assert!(registry.remove(BundleId(42)).is_none());
}

#[test]
fn BundleRegistry___remove_twice___returns_none() {
    let mut registry = BundleRegistry::new();
    let a = registry.insert("a", "Default", Vec::new(), Vec::new());

    registry.remove(a);

    assert!(registry.remove(a).is_none());
    assert!(registry.is_empty());
}

#[test]
fn BundleRegistry___set_handle___clears_fault() {
    let mut registry = BundleRegistry::new();
    let a = registry.insert("a", "Default", Vec::new(), Vec::new());
    registry.set_fault(a, StowageError::Internal("boom".into()));

    registry.set_handle(a, handle("a"));
    let state = registry.get(a).unwrap();

    assert!(state.fault().is_none());
    assert!(state.is_ready());
}

#[test]
fn BundleRegistry___propagate_readiness___waits_for_whole_chain() {
    let mut registry = BundleRegistry::new();
    let (top, mid, leaf) = chain(&mut registry);
    registry.set_handle(top, handle("top"));
    registry.set_handle(mid, handle("mid"));
    registry.propagate_readiness(mid);

    assert!(!registry.get(mid).unwrap().dependencies_ready());
    assert!(!registry.get(top).unwrap().is_ready());

    registry.set_handle(leaf, handle("leaf"));
    registry.propagate_readiness(leaf);

    assert!(registry.get(mid).unwrap().is_ready());
    assert!(registry.get(top).unwrap().is_ready());
}

#[test]
fn BundleRegistry___propagate_readiness___fault_makes_dependents_unready() {
    let mut registry = BundleRegistry::new();
    let (top, mid, leaf) = chain(&mut registry);
    for (id, name) in [(leaf, "leaf"), (mid, "mid"), (top, "top")] {
        registry.set_handle(id, handle(name));
        registry.propagate_readiness(id);
    }
    assert!(registry.get(top).unwrap().is_ready());

    registry.set_fault(leaf, StowageError::Internal("gone".into()));
    registry.propagate_readiness(leaf);

    assert!(!registry.get(mid).unwrap().dependencies_ready());
    assert!(!registry.get(top).unwrap().dependencies_ready());
}

#[test]
fn BundleRegistry___compute_dependencies_ready___unknown_id_is_false() {
    let registry = BundleRegistry::new();

    assert!(!registry.compute_dependencies_ready(BundleId(3)));
}

#[test]
fn BundleRegistry___iter___yields_live_states_in_id_order() {
    let mut registry = BundleRegistry::new();
    let a = registry.insert("a", "Default", Vec::new(), Vec::new());
    registry.insert("b", "Default", Vec::new(), Vec::new());
    registry.insert("c", "Default", Vec::new(), Vec::new());
    registry.remove(a);

    let names: Vec<_> = registry.iter().map(|(_, s)| s.name().to_string()).collect();

    assert_eq!(names, vec!["b", "c"]);
}

#[test]
fn BundleId___display___has_hash_prefix() {
    assert_eq!(BundleId(7).to_string(), "#7");
}
