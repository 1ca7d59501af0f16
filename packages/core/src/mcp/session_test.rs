//! Tests for the MCP Session Manager

use super::*;
use std::sync::Arc;

#[test]
fn test_create_then_get() {
    let manager = SessionManager::default();
    let session = manager.create("2025-03-26");

    let fetched = manager.get(&session.id).expect("session is live");
    assert_eq!(fetched.id, session.id);
    assert_eq!(fetched.protocol_version, "2025-03-26");
    assert!(!fetched.initialized);
}

#[test]
fn test_ids_are_unique() {
    let manager = SessionManager::default();
    let a = manager.create("2025-03-26");
    let b = manager.create("2025-03-26");
    assert_ne!(a.id, b.id);
    assert_eq!(manager.active_count(), 2);
}

#[test]
fn test_session_expires_after_ttl() {
    let manager = SessionManager::new(Duration::from_millis(30), 10);
    let session = manager.create("2025-03-26");

    std::thread::sleep(Duration::from_millis(60));

    assert!(manager.get(&session.id).is_none());
    assert!(manager.is_recently_expired(&session.id));
    assert_eq!(manager.active_count(), 0);
}

#[test]
fn test_get_refreshes_last_access() {
    let manager = SessionManager::new(Duration::from_millis(150), 10);
    let session = manager.create("2025-03-26");

    for _ in 0..4 {
        std::thread::sleep(Duration::from_millis(50));
        assert!(manager.get(&session.id).is_some());
    }
}

#[test]
fn test_remove_marks_recently_expired() {
    let manager = SessionManager::default();
    let session = manager.create("2025-03-26");

    assert!(manager.remove(&session.id));
    assert!(manager.get(&session.id).is_none());
    assert!(manager.is_recently_expired(&session.id));

    // Second teardown is a no-op
    assert!(!manager.remove(&session.id));
}

#[test]
fn test_never_created_is_not_recently_expired() {
    let manager = SessionManager::default();
    assert!(!manager.is_recently_expired("never-issued"));
    assert!(!manager.remove("never-issued"));
    assert!(!manager.is_recently_expired("never-issued"));
}

#[test]
fn test_create_with_id_revives_expired_session() {
    let manager = SessionManager::default();
    let session = manager.create("2024-11-05");
    manager.remove(&session.id);

    let revived = manager.create_with_id(session.id.clone(), "2024-11-05");

    assert_eq!(revived.id, session.id);
    assert!(manager.get(&session.id).is_some());
    assert!(!manager.is_recently_expired(&session.id));
}

#[test]
fn test_mark_initialized() {
    let manager = SessionManager::default();
    let session = manager.create("2025-03-26");

    assert!(manager.mark_initialized(&session.id));
    assert!(manager.get(&session.id).unwrap().initialized);
    assert!(!manager.mark_initialized("unknown"));
}

#[test]
fn test_create_sweeps_expired_sessions() {
    let manager = SessionManager::new(Duration::from_millis(20), 10);
    let stale = manager.create("2025-03-26");

    std::thread::sleep(Duration::from_millis(40));
    manager.create("2025-03-26");

    assert_eq!(manager.active_count(), 1);
    assert!(manager.is_recently_expired(&stale.id));
}

#[test]
fn test_recently_expired_is_bounded() {
    let manager = SessionManager::new(DEFAULT_SESSION_TTL, 3);
    let ids: Vec<String> = (0..5)
        .map(|_| {
            let session = manager.create("2025-03-26");
            manager.remove(&session.id);
            session.id
        })
        .collect();

    assert_eq!(manager.recently_expired_count(), 3);
    assert!(!manager.is_recently_expired(&ids[0]));
    assert!(!manager.is_recently_expired(&ids[1]));
    assert!(manager.is_recently_expired(&ids[2]));
    assert!(manager.is_recently_expired(&ids[4]));
}

#[test]
fn test_concurrent_access() {
    let manager = Arc::new(SessionManager::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let session = manager.create("2025-03-26");
                    assert!(manager.get(&session.id).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(manager.active_count(), 400);
}
