//! Checkpoints
//!
//! Undo/redo safety net for destructive edits. The [`CheckpointManager`] is
//! independent of the protocol layer; command handlers in
//! [`crate::commands::checkpoint`] drive it against a live document.

pub mod error;
pub mod manager;
pub mod memory;

pub use error::CheckpointError;
pub use manager::{
    CheckpointConfig, CheckpointInfo, CheckpointManager, Snapshot, DEFAULT_MAX_DEPTH,
};
pub use memory::{MemoryProbe, NeverLow, SystemMemoryProbe, DEFAULT_LOW_MEMORY_BYTES};
