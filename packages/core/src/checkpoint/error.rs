//! Checkpoint Error Types

use thiserror::Error;

/// Misuse of the checkpoint timeline
///
/// All variants are caller-level contract violations; the timeline is left
/// untouched when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    /// `restore_back` with the cursor at (or before) the first snapshot
    #[error("No previous checkpoint")]
    NoPrevious,

    /// Requested id is not a retained snapshot
    #[error("Checkpoint {id} out of range (have {len} checkpoints)")]
    OutOfRange { id: usize, len: usize },

    /// Requested id is already the current position
    #[error("Checkpoint {id} is already the current checkpoint")]
    AlreadyCurrent { id: usize },
}

impl CheckpointError {
    pub fn out_of_range(id: usize, len: usize) -> Self {
        Self::OutOfRange { id, len }
    }
}
