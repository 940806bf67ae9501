#![allow(non_snake_case)]

use super::*;
use parking_lot::Mutex;
use std::sync::atomic::AtomicUsize;

fn counting_sink() -> (LogSink, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let sink: LogSink = Arc::new(move |_, _, _| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (sink, count)
}

// LogCallbackManager tests

#[test]
fn LogCallbackManager___new___default_level_is_info() {
    let manager = LogCallbackManager::new();

    assert_eq!(manager.level(), LogLevel::Info);
}

#[test]
fn LogCallbackManager___new___no_sink_set() {
    let manager = LogCallbackManager::new();

    assert!(!manager.has_sink());
}

#[test]
fn LogCallbackManager___set_level___changes_level() {
    let manager = LogCallbackManager::new();

    manager.set_level(LogLevel::Debug);

    assert_eq!(manager.level(), LogLevel::Debug);
}

#[test]
fn LogCallbackManager___is_enabled___respects_level_ordering() {
    let manager = LogCallbackManager::new();
    manager.set_level(LogLevel::Debug);

    assert!(manager.is_enabled(LogLevel::Debug));
    assert!(manager.is_enabled(LogLevel::Info));
    assert!(manager.is_enabled(LogLevel::Warn));
    assert!(manager.is_enabled(LogLevel::Error));
    assert!(!manager.is_enabled(LogLevel::Trace));
}

#[test]
fn LogCallbackManager___is_enabled___off_disables_everything() {
    let manager = LogCallbackManager::new();
    manager.set_level(LogLevel::Off);

    assert!(!manager.is_enabled(LogLevel::Error));
    assert!(!manager.is_enabled(LogLevel::Off));
}

#[test]
fn LogCallbackManager___set_sink_none___clears_sink() {
    let manager = LogCallbackManager::new();
    let (sink, _) = counting_sink();
    manager.set_sink(Some(sink));

    manager.set_sink(None);

    assert!(!manager.has_sink());
}

#[test]
fn LogCallbackManager___log___invokes_sink_when_enabled() {
    let manager = LogCallbackManager::new();
    let (sink, count) = counting_sink();
    manager.set_sink(Some(sink));

    manager.log(LogLevel::Info, "stowage::manager", "Test message");

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn LogCallbackManager___log___skips_sink_when_level_too_low() {
    let manager = LogCallbackManager::new();
    let (sink, count) = counting_sink();
    manager.set_sink(Some(sink));

    manager.log(LogLevel::Debug, "stowage::manager", "Debug message");

    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn LogCallbackManager___log___passes_target_and_message() {
    let manager = LogCallbackManager::new();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::clone(&captured);
    manager.set_sink(Some(Arc::new(move |level, target, message| {
        store
            .lock()
            .push((level, target.to_string(), message.to_string()));
    })));

    manager.log(LogLevel::Error, "stowage::download", "fetch failed");

    let captured = captured.lock();
    assert_eq!(
        captured.as_slice(),
        [(
            LogLevel::Error,
            "stowage::download".to_string(),
            "fetch failed".to_string()
        )]
    );
}

#[test]
fn LogCallbackManager___log___no_panic_without_sink() {
    let manager = LogCallbackManager::new();

    manager.log(LogLevel::Info, "test", "message");
}

#[test]
fn LogCallbackManager___default___same_as_new() {
    let manager = LogCallbackManager::default();

    assert_eq!(manager.level(), LogLevel::Info);
    assert!(!manager.has_sink());
}
