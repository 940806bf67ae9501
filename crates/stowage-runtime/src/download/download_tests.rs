#![allow(non_snake_case)]

use super::*;
use crate::backend::{MemoryBackend, MemoryBundle};
use test_case::test_case;

fn scheduler(backend: &MemoryBackend, parallel: usize) -> DownloadScheduler {
    DownloadScheduler::new(Arc::new(backend.clone()), parallel, 16)
}

fn enqueue(scheduler: &mut DownloadScheduler, name: &str) -> bool {
    scheduler.enqueue(
        name,
        DownloadKind::Bundle,
        format!("http://cdn/Linux/{name}"),
        PathBuf::from(name),
        None,
    )
}

#[test]
fn BufferPool___acquire___hands_out_slots_round_robin() {
    let mut pool = BufferPool::new(3, 8);

    let (a, _) = pool.acquire().unwrap();
    pool.release(a);
    let (b, _) = pool.acquire().unwrap();
    let (c, _) = pool.acquire().unwrap();

    assert_eq!((a, b, c), (0, 1, 2));
    assert_eq!(pool.in_use(), 2);
}

#[test_case(1, &[0, 0, 0]; "single slot")]
#[test_case(2, &[0, 1, 0, 1]; "two slots")]
#[test_case(3, &[0, 1, 2, 0, 1]; "three slots")]
fn BufferPool___acquire_release_cycle___rotates_through_slots(count: usize, expected: &[usize]) {
    let mut pool = BufferPool::new(count, 8);

    let order: Vec<usize> = expected
        .iter()
        .map(|_| {
            let (index, _) = pool.acquire().unwrap();
            pool.release(index);
            index
        })
        .collect();

    assert_eq!(order, expected);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn BufferPool___acquire___skips_slot_still_in_use() {
    let mut pool = BufferPool::new(3, 8);
    let (held, _) = pool.acquire().unwrap();

    let (a, _) = pool.acquire().unwrap();
    pool.release(a);
    let (b, _) = pool.acquire().unwrap();
    pool.release(b);
    let (c, _) = pool.acquire().unwrap();

    assert_eq!((held, a, b, c), (0, 1, 2, 1));
}

#[test]
fn BufferPool___acquire___returns_none_when_exhausted() {
    let mut pool = BufferPool::new(1, 8);

    let first = pool.acquire();
    let second = pool.acquire();

    assert!(first.is_some());
    assert!(second.is_none());
}

#[test]
fn BufferPool___new___allocates_slot_size_bytes() {
    let pool = BufferPool::new(2, 1024);

    assert_eq!(pool.capacity(), 2);
    assert_eq!(pool.slot_size(), 1024);
}

#[test]
fn DownloadScheduler___enqueue_same_name___is_rejected() {
    let backend = MemoryBackend::manual();
    let mut scheduler = scheduler(&backend, 2);

    assert!(enqueue(&mut scheduler, "a"));
    assert!(!enqueue(&mut scheduler, "a"));
    assert_eq!(scheduler.len(), 1);
}

#[test]
fn DownloadScheduler___advance___completes_immediate_fetch_in_one_tick() {
    let backend = MemoryBackend::new();
    backend.add_remote("a", MemoryBundle::new().with_asset("x", "text", b"abc"));
    let mut scheduler = scheduler(&backend, 2);
    enqueue(&mut scheduler, "a");

    let events = scheduler.advance();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "a");
    assert_eq!(events[0].result.as_ref().unwrap(), &3);
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.pool().in_use(), 0);
    assert!(backend.has_local("a"));
}

#[test]
fn DownloadScheduler___advance___starts_at_most_max_parallel() {
    let backend = MemoryBackend::manual();
    let mut scheduler = scheduler(&backend, 2);
    for name in ["a", "b", "c"] {
        enqueue(&mut scheduler, name);
    }

    let events = scheduler.advance();

    assert!(events.is_empty());
    assert_eq!(backend.pending_fetches(), vec!["a", "b"]);
    assert_eq!(scheduler.pool().in_use(), 2);
}

#[test]
fn DownloadScheduler___completion___frees_slot_for_next_task() {
    let backend = MemoryBackend::manual();
    backend.add_remote("a", MemoryBundle::new());
    let mut scheduler = scheduler(&backend, 1);
    enqueue(&mut scheduler, "a");
    enqueue(&mut scheduler, "b");
    scheduler.advance();

    backend.finish_fetch("a");
    let events = scheduler.advance();
    scheduler.advance();

    assert_eq!(events.len(), 1);
    assert_eq!(scheduler.queued(), vec!["b"]);
    assert_eq!(backend.pending_fetches(), vec!["b"]);
}

#[test]
fn DownloadScheduler___failed_fetch___reports_error_and_releases_slot() {
    let backend = MemoryBackend::new();
    let mut scheduler = scheduler(&backend, 1);
    enqueue(&mut scheduler, "missing");

    let events = scheduler.advance();

    assert!(matches!(
        events[0].result,
        Err(stowage_core::StowageError::DownloadFailed { .. })
    ));
    assert_eq!(scheduler.pool().in_use(), 0);
    assert!(!scheduler.is_downloading("missing"));
}

#[test]
fn DownloadScheduler___manifest_kind___is_carried_to_event() {
    let backend = MemoryBackend::new();
    backend.add_remote("Default.manifest.json", MemoryBundle::new());
    let mut scheduler = scheduler(&backend, 1);
    scheduler.enqueue(
        "Default.manifest.json",
        DownloadKind::Manifest {
            package: "Default".into(),
        },
        "http://cdn/Linux/Default.manifest.json".into(),
        PathBuf::from("Default.manifest.json"),
        None,
    );

    let events = scheduler.advance();

    assert_eq!(
        events[0].kind,
        DownloadKind::Manifest {
            package: "Default".into()
        }
    );
}
