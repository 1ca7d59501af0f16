//! Checkpoint Manager
//!
//! Branching undo/redo timeline over opaque snapshots. A snapshot is an
//! already-cloned copy of application state; once pushed it is owned by the
//! timeline and never mutated.
//!
//! # Timeline rules
//!
//! - Pushing while the cursor is not at the end forks: everything after the
//!   cursor is discarded before the new snapshot is appended.
//! - While the memory probe reports low memory, the oldest snapshots are
//!   evicted first.
//! - The timeline never holds more than `max_depth` snapshots; the oldest is
//!   dropped to make room.
//! - Restoring only moves the cursor. Snapshots are never deleted by a restore.
//!
//! Every operation takes one lock around the whole timeline. Critical sections
//! are short and never do I/O.

use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::memory::{MemoryProbe, NeverLow};
use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Default number of retained snapshots
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Timeline limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointConfig {
    /// Maximum retained snapshots (values below 1 are treated as 1)
    pub max_depth: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One retained point in the timeline
#[derive(Debug)]
pub struct Snapshot<T> {
    state: Arc<T>,
    description: Option<String>,
    created_at_ms: i64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            description: self.description.clone(),
            created_at_ms: self.created_at_ms,
        }
    }
}

impl<T> Snapshot<T> {
    /// The captured state
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Shared handle to the captured state
    pub fn state_arc(&self) -> Arc<T> {
        Arc::clone(&self.state)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Creation time, milliseconds since the Unix epoch
    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }
}

/// Read-only listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointInfo {
    pub id: usize,
    pub description: Option<String>,
    pub created_at_ms: i64,
    pub is_current: bool,
}

struct Timeline<T> {
    snapshots: VecDeque<Snapshot<T>>,
    cursor: Option<usize>,
    last_timestamp_ms: i64,
}

impl<T> Timeline<T> {
    fn len(&self) -> usize {
        self.snapshots.len()
    }

    fn check_range(&self, id: usize) -> Result<(), CheckpointError> {
        if id >= self.snapshots.len() {
            return Err(CheckpointError::out_of_range(id, self.snapshots.len()));
        }
        Ok(())
    }

    fn move_to(&mut self, id: usize) -> Snapshot<T> {
        self.cursor = Some(id);
        self.snapshots[id].clone()
    }

    fn next_timestamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis().max(self.last_timestamp_ms);
        self.last_timestamp_ms = now;
        now
    }
}

/// Thread-safe undo/redo timeline
pub struct CheckpointManager<T> {
    timeline: Mutex<Timeline<T>>,
    config: CheckpointConfig,
    memory: Arc<dyn MemoryProbe>,
}

impl<T> CheckpointManager<T> {
    /// Create a manager that never evicts for memory pressure
    pub fn new(config: CheckpointConfig) -> Self {
        Self::with_memory_probe(config, Arc::new(NeverLow))
    }

    /// Create a manager with a custom low-memory probe
    pub fn with_memory_probe(config: CheckpointConfig, memory: Arc<dyn MemoryProbe>) -> Self {
        Self {
            timeline: Mutex::new(Timeline {
                snapshots: VecDeque::new(),
                cursor: None,
                last_timestamp_ms: 0,
            }),
            config: CheckpointConfig {
                max_depth: config.max_depth.max(1),
            },
            memory,
        }
    }

    pub fn config(&self) -> CheckpointConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, Timeline<T>> {
        // A panic mid-operation cannot leave the cursor out of range, so the
        // poisoned state is still consistent.
        self.timeline
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a snapshot and make it current
    ///
    /// Returns the new snapshot's id (its index in the timeline). Blank
    /// descriptions are stored as `None`.
    pub fn push(&self, state: T, description: Option<&str>) -> usize {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let mut timeline = self.lock();

        if let Some(cursor) = timeline.cursor {
            if cursor + 1 < timeline.len() {
                let discarded = timeline.len() - (cursor + 1);
                timeline.snapshots.truncate(cursor + 1);
                debug!("Forked timeline, discarded {} forward checkpoints", discarded);
            }
        }

        while !timeline.snapshots.is_empty() && self.memory.is_low() {
            timeline.snapshots.pop_front();
            warn!(
                "Low memory: evicted oldest checkpoint ({} remaining)",
                timeline.len()
            );
        }

        while timeline.len() >= self.config.max_depth {
            timeline.snapshots.pop_front();
        }

        let created_at_ms = timeline.next_timestamp();
        timeline.snapshots.push_back(Snapshot {
            state: Arc::new(state),
            description,
            created_at_ms,
        });
        let id = timeline.len() - 1;
        timeline.cursor = Some(id);

        info!("📸 Checkpoint {} created ({} retained)", id, timeline.len());
        id
    }

    /// Step the cursor back one snapshot (undo)
    ///
    /// Returns the new cursor together with the snapshot at it.
    pub fn restore_back(&self) -> Result<(usize, Snapshot<T>), CheckpointError> {
        let mut timeline = self.lock();
        match timeline.cursor {
            Some(cursor) if cursor > 0 => {
                let id = cursor - 1;
                debug!("Restoring checkpoint {}", id);
                Ok((id, timeline.move_to(id)))
            }
            _ => Err(CheckpointError::NoPrevious),
        }
    }

    /// Move the cursor to `id`, backwards (undo) or forwards (redo)
    ///
    /// Fails if `id` is out of range or already current.
    pub fn restore_to(&self, id: usize) -> Result<Snapshot<T>, CheckpointError> {
        let mut timeline = self.lock();
        timeline.check_range(id)?;
        if timeline.cursor == Some(id) {
            return Err(CheckpointError::AlreadyCurrent { id });
        }
        debug!("Restoring checkpoint {}", id);
        Ok(timeline.move_to(id))
    }

    /// Like [`restore_to`](Self::restore_to) but allows re-applying the
    /// current snapshot
    pub fn restore_to_forced(&self, id: usize) -> Result<Snapshot<T>, CheckpointError> {
        let mut timeline = self.lock();
        timeline.check_range(id)?;
        debug!("Force-restoring checkpoint {}", id);
        Ok(timeline.move_to(id))
    }

    /// Describe every retained snapshot
    pub fn list(&self) -> Vec<CheckpointInfo> {
        let timeline = self.lock();
        timeline
            .snapshots
            .iter()
            .enumerate()
            .map(|(id, snapshot)| CheckpointInfo {
                id,
                description: snapshot.description.clone(),
                created_at_ms: snapshot.created_at_ms,
                is_current: timeline.cursor == Some(id),
            })
            .collect()
    }

    /// Drop every snapshot
    pub fn clear(&self) {
        let mut timeline = self.lock();
        timeline.snapshots.clear();
        timeline.cursor = None;
        info!("Checkpoint timeline cleared");
    }

    /// Current cursor, `None` when the timeline is empty
    pub fn cursor(&self) -> Option<usize> {
        self.lock().cursor
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().snapshots.is_empty()
    }

    /// Snapshot at the cursor, without moving it
    pub fn current(&self) -> Option<Snapshot<T>> {
        let timeline = self.lock();
        timeline.cursor.map(|cursor| timeline.snapshots[cursor].clone())
    }
}

impl<T> Default for CheckpointManager<T> {
    fn default() -> Self {
        Self::new(CheckpointConfig::default())
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
