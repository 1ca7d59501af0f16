//! MCP Session Manager
//!
//! Tracks protocol sessions created by `initialize`. Expiry is lazy: a session
//! idle for longer than the TTL is dropped the next time it is looked up or
//! when a new session is created, never by a background timer.
//!
//! Ids of removed or expired sessions are remembered in a bounded
//! "recently expired" set so the transport can tell "expired" from "never
//! issued". Once the set is full the oldest ids are forgotten first.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Default idle time before a session expires
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Default number of remembered expired ids
pub const DEFAULT_RECENTLY_EXPIRED_CAPACITY: usize = 1000;

/// A protocol session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub protocol_version: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Instant,
    pub initialized: bool,
}

impl Session {
    fn new(id: String, protocol_version: String) -> Self {
        Self {
            id,
            protocol_version,
            created_at: Utc::now(),
            last_accessed: Instant::now(),
            initialized: false,
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_accessed) > ttl
    }
}

/// Insertion-ordered set with a fixed capacity
#[derive(Debug)]
struct RecentIds {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl RecentIds {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, id: String) {
        if !self.members.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    fn remove(&mut self, id: &str) {
        if self.members.remove(id) {
            self.order.retain(|existing| existing != id);
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[derive(Debug)]
struct SessionTable {
    sessions: HashMap<String, Session>,
    recently_expired: RecentIds,
}

impl SessionTable {
    fn expire(&mut self, id: &str) {
        if self.sessions.remove(id).is_some() {
            self.recently_expired.insert(id.to_string());
        }
    }

    fn sweep(&mut self, ttl: Duration, now: Instant) {
        let expired: Vec<String> = self
            .sessions
            .values()
            .filter(|session| session.is_expired(ttl, now))
            .map(|session| session.id.clone())
            .collect();
        for id in expired {
            debug!("Session {} expired", id);
            self.expire(&id);
        }
    }
}

/// Thread-safe session table with TTL expiry
#[derive(Debug)]
pub struct SessionManager {
    table: Mutex<SessionTable>,
    ttl: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_RECENTLY_EXPIRED_CAPACITY)
    }
}

impl SessionManager {
    pub fn new(ttl: Duration, recently_expired_capacity: usize) -> Self {
        Self {
            table: Mutex::new(SessionTable {
                sessions: HashMap::new(),
                recently_expired: RecentIds::new(recently_expired_capacity),
            }),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a session with a fresh unique id
    pub fn create(&self, protocol_version: impl Into<String>) -> Session {
        self.create_with_id(Uuid::new_v4().to_string(), protocol_version)
    }

    /// Create a session under a caller-supplied id
    ///
    /// Used to transparently re-establish a session the client still
    /// references after it expired. Replaces any live session with that id.
    pub fn create_with_id(
        &self,
        id: impl Into<String>,
        protocol_version: impl Into<String>,
    ) -> Session {
        let session = Session::new(id.into(), protocol_version.into());
        let mut table = self.lock();
        table.sweep(self.ttl, Instant::now());
        table.recently_expired.remove(&session.id);
        table.sessions.insert(session.id.clone(), session.clone());
        info!(
            "Session {} created (protocol {}, {} active)",
            session.id,
            session.protocol_version,
            table.sessions.len()
        );
        session
    }

    /// Look up a live session, refreshing its last-access time
    ///
    /// An expired session is removed, remembered as recently expired, and
    /// reported as absent.
    pub fn get(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        let mut table = self.lock();
        let expired = table.sessions.get(id)?.is_expired(self.ttl, now);
        if expired {
            debug!("Session {} expired", id);
            table.expire(id);
            return None;
        }
        let session = table.sessions.get_mut(id)?;
        session.last_accessed = now;
        Some(session.clone())
    }

    /// Mark a live session as initialized; returns false if unknown
    pub fn mark_initialized(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut table = self.lock();
        match table.sessions.get_mut(id) {
            Some(session) if !session.is_expired(self.ttl, now) => {
                session.initialized = true;
                session.last_accessed = now;
                true
            }
            _ => false,
        }
    }

    /// Explicit teardown; returns whether a session was removed
    ///
    /// Only ids that were actually issued are remembered as recently expired,
    /// so a teardown of an arbitrary id cannot make it revivable.
    pub fn remove(&self, id: &str) -> bool {
        let mut table = self.lock();
        let removed = table.sessions.contains_key(id);
        if removed {
            table.expire(id);
            info!("Session {} closed", id);
        }
        removed
    }

    /// Whether `id` belonged to a session that expired or was removed
    pub fn is_recently_expired(&self, id: &str) -> bool {
        self.lock().recently_expired.contains(id)
    }

    /// Drop every expired session now
    pub fn cleanup_expired(&self) {
        self.lock().sweep(self.ttl, Instant::now());
    }

    /// Number of live (possibly not yet swept) sessions
    pub fn active_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Number of remembered expired ids
    pub fn recently_expired_count(&self) -> usize {
        self.lock().recently_expired.len()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
