#![allow(non_snake_case)]

use super::*;
use crate::backend::{BundleOpener, MemoryBackend, MemoryBundle};
use crate::registry::BundleId;
use std::path::Path;
use stowage_bundle::BundleManifest;
use test_case::test_case;

fn manifest() -> BundleManifest {
    BundleManifest::new("Default")
        .with_bundle("base", &[], None)
        .with_bundle("level", &["base"], None)
}

fn backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.add_local("base", MemoryBundle::new().with_asset("shader", "text", b"s"));
    backend.add_local(
        "level",
        MemoryBundle::new()
            .with_asset("hero", "mesh", b"hero")
            .with_asset("Arena", "scene", b""),
    );
    backend
}

fn pinned(bundle: &str) -> BundleRegistry {
    let mut registry = BundleRegistry::new();
    resolver::pin(&mut registry, &manifest(), "Default", "g", bundle).unwrap();
    registry
}

fn open(registry: &mut BundleRegistry, backend: &MemoryBackend, name: &str) -> BundleId {
    let id = registry.find(name).unwrap();
    let handle = match backend.begin_open(name, Path::new(name)).poll() {
        Poll::Ready(result) => result.unwrap(),
        Poll::Pending => panic!("memory backend should complete immediately"),
    };
    registry.set_handle(id, handle);
    registry.propagate_readiness(id);
    id
}

#[test]
fn LoadOperation___first_poll___waits_on_dependencies() {
    let registry = pinned("level");
    let (mut op, handle) = LoadOperation::new("level", LoadTarget::asset("hero", None));

    assert_eq!(handle.state(), OperationState::Created);
    assert!(!op.poll(&registry, None));
    assert_eq!(handle.state(), OperationState::WaitingOnDependencies);
}

#[test]
fn LoadOperation___dependency_not_open___keeps_waiting() {
    let backend = backend();
    let mut registry = pinned("level");
    open(&mut registry, &backend, "level");
    let (mut op, handle) = LoadOperation::new("level", LoadTarget::asset("hero", None));

    op.poll(&registry, None);
    op.poll(&registry, None);

    assert_eq!(handle.state(), OperationState::WaitingOnDependencies);
}

#[test]
fn LoadOperation___ready_bundle___extracts_then_completes() {
    let backend = backend();
    let mut registry = pinned("level");
    open(&mut registry, &backend, "base");
    open(&mut registry, &backend, "level");
    let (mut op, handle) = LoadOperation::new("level", LoadTarget::asset("hero", Some("mesh")));

    let first = op.poll(&registry, None);
    let state_after_first = handle.state();
    let second = op.poll(&registry, None);

    assert!(!first);
    assert_eq!(state_after_first, OperationState::Extracting);
    assert!(second);
    assert_eq!(handle.state(), OperationState::Done);
    let asset = handle.result().unwrap().unwrap().into_asset().unwrap();
    assert_eq!(asset.as_bytes(), Some(&b"hero"[..]));
}

#[test]
fn LoadOperation___missing_asset___fails_with_asset_not_found() {
    let backend = backend();
    let mut registry = pinned("base");
    open(&mut registry, &backend, "base");
    let (mut op, handle) = LoadOperation::new("base", LoadTarget::asset("nope", None));

    op.poll(&registry, None);
    op.poll(&registry, None);

    assert_eq!(handle.state(), OperationState::Failed);
    assert!(matches!(
        handle.result(),
        Some(Err(StowageError::AssetNotFound { .. }))
    ));
}

#[test]
fn LoadOperation___released_bundle___fails_with_bundle_released() {
    let registry = BundleRegistry::new();
    let (mut op, handle) = LoadOperation::new("level", LoadTarget::asset("hero", None));

    assert!(op.poll(&registry, None));
    assert_eq!(
        handle.result(),
        Some(Err(StowageError::BundleReleased("level".into())))
    );
}

#[test]
fn LoadOperation___faulted_dependency___fails_with_dependency_failed() {
    let mut registry = pinned("level");
    let base = registry.find("base").unwrap();
    registry.set_fault(
        base,
        StowageError::DownloadFailed {
            bundle: "base".into(),
            reason: "HTTP 404".into(),
        },
    );
    let (mut op, handle) = LoadOperation::new("level", LoadTarget::asset("hero", None));

    op.poll(&registry, None);

    match handle.result() {
        Some(Err(StowageError::DependencyFailed { bundle, cause })) => {
            assert_eq!(bundle, "base");
            assert!(cause.contains("HTTP 404"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn LoadOperation___scene_without_host___fails() {
    let backend = backend();
    let mut registry = pinned("base");
    open(&mut registry, &backend, "base");
    let target = LoadTarget::scene("Arena", SceneLoadMode::Single, true);
    let (mut op, handle) = LoadOperation::new("base", target);

    op.poll(&registry, None);

    assert_eq!(
        handle.result(),
        Some(Err(StowageError::SceneHostUnavailable))
    );
}

#[test]
fn LoadOperation___scene_with_host___loads_through_host() {
    let backend = backend();
    let mut registry = pinned("level");
    open(&mut registry, &backend, "base");
    open(&mut registry, &backend, "level");
    let target = LoadTarget::scene("Arena", SceneLoadMode::Additive, false);
    let (mut op, handle) = LoadOperation::new("level", target);

    op.poll(&registry, Some(&backend as &dyn SceneHost));
    op.poll(&registry, Some(&backend as &dyn SceneHost));

    assert_eq!(handle.result(), Some(Ok(Extracted::Scene)));
    let loads = backend.scene_loads();
    assert_eq!(loads[0].mode, SceneLoadMode::Additive);
    assert!(!loads[0].allow_activation);
}

#[test]
fn LoadOperation___simulated___completes_on_first_poll() {
    let registry = BundleRegistry::new();
    let asset = Asset::from_bytes("hero", "mesh", vec![1]);
    let (mut op, handle) = LoadOperation::simulated(
        LoadTarget::asset("hero", None),
        Extraction::Asset(Pending::ready(Ok(asset))),
    );

    assert!(op.is_simulated());
    assert_eq!(handle.state(), OperationState::Extracting);
    assert!(op.poll(&registry, None));
    assert_eq!(handle.state(), OperationState::Done);
    assert_eq!(handle.bundle(), None);
}

#[test_case(LoadTarget::asset("hero", Some("prefab")), "hero", false; "typed asset")]
#[test_case(LoadTarget::asset("stone", None), "stone", false; "untyped asset")]
#[test_case(LoadTarget::scene("Arena", SceneLoadMode::Additive, false), "Arena", true; "scene")]
fn LoadTarget___accessors___report_name_and_kind(target: LoadTarget, name: &str, scene: bool) {
    assert_eq!(target.name(), name);
    assert_eq!(target.is_scene(), scene);
}

#[test_case(Ok(()), OperationState::Done; "scene loaded")]
#[test_case(Err(StowageError::Internal("host".into())), OperationState::Failed; "host failed")]
fn LoadOperation___simulated_scene___ends_in_state(
    outcome: StowageResult<()>,
    expected: OperationState,
) {
    let registry = BundleRegistry::new();
    let (mut op, handle) = LoadOperation::simulated(
        LoadTarget::scene("Arena", SceneLoadMode::Single, true),
        Extraction::Scene(Pending::ready(outcome)),
    );

    assert!(op.poll(&registry, None));
    assert_eq!(handle.state(), expected);
}

#[test]
fn LoadOperation___poll_after_done___stays_done() {
    let registry = BundleRegistry::new();
    let (mut op, handle) = LoadOperation::simulated(
        LoadTarget::scene("Arena", SceneLoadMode::Single, true),
        Extraction::Scene(Pending::ready(Ok(()))),
    );

    op.poll(&registry, None);

    assert!(op.poll(&registry, None));
    assert_eq!(handle.result(), Some(Ok(Extracted::Scene)));
}

#[test]
fn LoadHandle___clone___observes_same_operation() {
    let registry = BundleRegistry::new();
    let (mut op, handle) = LoadOperation::new("gone", LoadTarget::asset("x", None));
    let other = handle.clone();

    op.poll(&registry, None);

    assert!(other.is_done());
    assert_eq!(other.target(), "x");
    assert_eq!(other.bundle(), Some("gone"));
}

#[tokio::test]
async fn LoadHandle___await___resolves_when_operation_finishes() {
    let registry = BundleRegistry::new();
    let (mut op, handle) = LoadOperation::new("gone", LoadTarget::asset("x", None));

    let waiter = tokio::spawn(handle.clone());
    tokio::task::yield_now().await;
    op.poll(&registry, None);

    let result = waiter.await.unwrap();
    assert!(matches!(result, Err(StowageError::BundleReleased(_))));
}
