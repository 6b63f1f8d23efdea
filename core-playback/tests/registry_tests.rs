//! Playback registry tests
//!
//! Covers active-id bookkeeping, stop ordering, scoped registrations and
//! panic isolation.

use core_playback::{ItemId, PlaybackRegistry, StopCallback};
use parking_lot::Mutex;
use std::sync::Arc;

fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &str) -> StopCallback {
    let log = log.clone();
    let name = name.to_string();
    Arc::new(move || log.lock().push(format!("stop:{name}")))
}

fn id(s: &str) -> ItemId {
    ItemId::from(s)
}

#[test]
fn test_switching_active_stops_previous_first() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _a = registry.register(id("a"), recorder(&log, "a"));
    let _b = registry.register(id("b"), recorder(&log, "b"));

    registry.set_active(Some(id("a")));
    assert!(log.lock().is_empty());

    registry.set_active(Some(id("b")));
    assert_eq!(*log.lock(), vec!["stop:a".to_string()]);
    assert_eq!(registry.active_id(), Some(id("b")));

    registry.set_active(None);
    assert_eq!(*log.lock(), vec!["stop:a".to_string(), "stop:b".to_string()]);
    assert_eq!(registry.active_id(), None);
}

#[test]
fn test_unknown_previous_id_is_a_no_op() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _b = registry.register(id("b"), recorder(&log, "b"));

    // "ghost" never registered a callback.
    registry.set_active(Some(id("ghost")));
    registry.set_active(Some(id("b")));

    assert!(log.lock().is_empty());
    assert!(registry.is_active(&id("b")));
}

#[test]
fn test_unregister_keeps_active_id() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _a = registry.register(id("a"), recorder(&log, "a"));

    registry.set_active(Some(id("a")));
    registry.unregister(&id("a"));

    assert!(!registry.is_registered(&id("a")));
    assert_eq!(registry.active_id(), Some(id("a")));

    registry.set_active(None);
    assert!(log.lock().is_empty());
}

#[test]
fn test_register_is_an_upsert() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _first = registry.register(id("a"), recorder(&log, "first"));
    let _second = registry.register(id("a"), recorder(&log, "second"));
    assert_eq!(registry.len(), 1);

    registry.set_active(Some(id("a")));
    registry.set_active(None);
    assert_eq!(*log.lock(), vec!["stop:second".to_string()]);
}

#[test]
fn test_dropping_registration_unregisters() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let registration = registry.register(id("a"), recorder(&log, "a"));
    assert!(registry.is_registered(&id("a")));
    assert_eq!(registration.item_id(), &id("a"));

    drop(registration);
    assert!(!registry.is_registered(&id("a")));
    assert!(registry.is_empty());
}

#[test]
fn test_stale_registration_does_not_remove_newer_one() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let stale = registry.register(id("a"), recorder(&log, "old"));
    let _fresh = registry.register(id("a"), recorder(&log, "new"));

    drop(stale);
    assert!(registry.is_registered(&id("a")));

    registry.set_active(Some(id("a")));
    registry.set_active(Some(id("b")));
    assert_eq!(*log.lock(), vec!["stop:new".to_string()]);
}

#[test]
fn test_registration_outliving_registry_is_harmless() {
    let registry = PlaybackRegistry::new();
    let registration = registry.register(id("a"), Arc::new(|| {}));
    drop(registry);
    drop(registration);
}

#[test]
fn test_stop_all_isolates_panicking_callbacks() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _a = registry.register(id("a"), recorder(&log, "a"));
    let _boom = registry.register(id("boom"), Arc::new(|| panic!("callback exploded")));
    let _c = registry.register(id("c"), recorder(&log, "c"));

    registry.set_active(Some(id("c")));
    registry.stop_all();

    let mut stopped = log.lock().clone();
    stopped.sort();
    assert_eq!(stopped, vec!["stop:a".to_string(), "stop:c".to_string()]);
    assert_eq!(registry.active_id(), None);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_cleanup_stops_and_forgets_everything() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = registry.register(id("a"), recorder(&log, "a"));
    let _b = registry.register(id("b"), recorder(&log, "b"));
    registry.set_active(Some(id("a")));

    registry.cleanup();

    assert_eq!(log.lock().len(), 2);
    assert!(registry.is_empty());
    assert_eq!(registry.active_id(), None);

    // Guards released after cleanup find nothing to remove.
    drop(a);
    assert!(registry.is_empty());
}

#[test]
fn test_clear_if_active_only_clears_own_id() {
    let registry = PlaybackRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _a = registry.register(id("a"), recorder(&log, "a"));
    let _b = registry.register(id("b"), recorder(&log, "b"));
    registry.set_active(Some(id("b")));

    assert!(!registry.clear_if_active(&id("a")));
    assert!(registry.is_active(&id("b")));
    assert!(log.lock().is_empty());

    assert!(registry.clear_if_active(&id("b")));
    assert_eq!(registry.active_id(), None);
}

#[test]
fn test_run_if_active() {
    let registry = PlaybackRegistry::new();
    registry.set_active(Some(id("a")));

    assert_eq!(registry.run_if_active(&id("a"), || 7), Some(7));
    assert_eq!(registry.run_if_active(&id("b"), || 7), None);
}

#[test]
fn test_concurrent_activation_keeps_single_active_id() {
    let registry = PlaybackRegistry::new();
    let ids: Vec<ItemId> = (0..8).map(|i| id(&format!("m{i}"))).collect();
    let _registrations: Vec<_> = ids
        .iter()
        .map(|i| registry.register(i.clone(), Arc::new(|| {})))
        .collect();

    std::thread::scope(|scope| {
        for i in &ids {
            let registry = registry.clone();
            scope.spawn(move || {
                for _ in 0..100 {
                    registry.set_active(Some(i.clone()));
                }
            });
        }
    });

    let active = registry.active_id().unwrap();
    assert!(ids.contains(&active));
}
