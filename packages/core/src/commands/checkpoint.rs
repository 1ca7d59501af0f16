//! Checkpoint Commands
//!
//! Exposes the [`CheckpointManager`] timeline as registry commands that
//! capture and restore a live [`Document`]:
//!
//! - `create_checkpoint { description? }`
//! - `list_checkpoints`
//! - `undo_checkpoint` - step back one checkpoint
//! - `restore_checkpoint { id, force? }` - jump to any retained checkpoint
//! - `clear_checkpoints`

use crate::checkpoint::{CheckpointError, CheckpointManager, Snapshot};
use crate::commands::error::{CommandError, RegistryError};
use crate::commands::registry::{CommandContext, CommandHandler, CommandRegistry};
use crate::commands::types::{CommandRequest, ToolDescriptor};
use crate::document::Document;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

impl From<CheckpointError> for CommandError {
    fn from(err: CheckpointError) -> Self {
        CommandError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointAction {
    Create,
    List,
    Undo,
    Restore,
    Clear,
}

impl CheckpointAction {
    pub const ALL: [CheckpointAction; 5] = [
        CheckpointAction::Create,
        CheckpointAction::List,
        CheckpointAction::Undo,
        CheckpointAction::Restore,
        CheckpointAction::Clear,
    ];

    /// Action name the command is registered under
    pub fn action_name(self) -> &'static str {
        match self {
            CheckpointAction::Create => "create_checkpoint",
            CheckpointAction::List => "list_checkpoints",
            CheckpointAction::Undo => "undo_checkpoint",
            CheckpointAction::Restore => "restore_checkpoint",
            CheckpointAction::Clear => "clear_checkpoints",
        }
    }
}

/// One checkpoint operation bound to a document and its timeline
pub struct CheckpointCommand<S> {
    action: CheckpointAction,
    document: Arc<Document<S>>,
    checkpoints: Arc<CheckpointManager<S>>,
}

impl<S> CheckpointCommand<S> {
    pub fn new(
        action: CheckpointAction,
        document: Arc<Document<S>>,
        checkpoints: Arc<CheckpointManager<S>>,
    ) -> Self {
        Self {
            action,
            document,
            checkpoints,
        }
    }
}

impl<S: Clone> CheckpointCommand<S> {
    async fn create(&self, request: &CommandRequest) -> Result<Value, CommandError> {
        let state = self.document.snapshot().await?;
        let id = self
            .checkpoints
            .push(state, request.str_param("description"));
        Ok(json!({
            "checkpoint_id": id,
            "total": self.checkpoints.len(),
        }))
    }

    /// Move the timeline and write the snapshot back under one document lock
    ///
    /// The cursor only moves once the lock is held, so a lock timeout leaves
    /// both the timeline and the document untouched.
    async fn apply<F>(&self, select: F) -> Result<Value, CommandError>
    where
        F: FnOnce(&CheckpointManager<S>) -> Result<(usize, Snapshot<S>), CheckpointError>,
    {
        let (id, description) = self
            .document
            .with_state(|state| {
                let (id, snapshot) = select(&self.checkpoints)?;
                *state = snapshot.state().clone();
                Ok::<_, CheckpointError>((id, snapshot.description().map(str::to_string)))
            })
            .await??;
        Ok(json!({
            "restored": id,
            "description": description,
        }))
    }

    async fn undo(&self) -> Result<Value, CommandError> {
        self.apply(|checkpoints| checkpoints.restore_back()).await
    }

    async fn restore(&self, request: &CommandRequest) -> Result<Value, CommandError> {
        let id = request
            .param("id")
            .ok_or_else(|| CommandError::missing_param("id"))?
            .as_u64()
            .ok_or_else(|| CommandError::validation("'id' must be a non-negative integer"))?;
        let id = usize::try_from(id)
            .map_err(|_| CommandError::validation(format!("Checkpoint id {} is too large", id)))?;
        let force = request
            .param("force")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        self.apply(|checkpoints| {
            let snapshot = if force {
                checkpoints.restore_to_forced(id)?
            } else {
                checkpoints.restore_to(id)?
            };
            Ok((id, snapshot))
        })
        .await
    }
}

#[async_trait]
impl<S> CommandHandler for CheckpointCommand<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn execute(
        &self,
        _ctx: CommandContext<'_>,
        request: &CommandRequest,
    ) -> Result<Value, CommandError> {
        match self.action {
            CheckpointAction::Create => self.create(request).await,
            CheckpointAction::List => Ok(json!({
                "checkpoints": self.checkpoints.list(),
                "current": self.checkpoints.cursor(),
            })),
            CheckpointAction::Undo => self.undo().await,
            CheckpointAction::Restore => self.restore(request).await,
            CheckpointAction::Clear => {
                self.checkpoints.clear();
                Ok(json!({ "cleared": true }))
            }
        }
    }

    fn descriptor(&self) -> Option<ToolDescriptor> {
        let descriptor = match self.action {
            CheckpointAction::Create => ToolDescriptor::new(
                "Save a checkpoint of the current scene so destructive edits can be undone. \
                 Creating a checkpoint after a restore discards the checkpoints after it.",
                json!({
                    "type": "object",
                    "properties": {
                        "description": {
                            "type": "string",
                            "description": "Short note about what is about to change"
                        }
                    }
                }),
            ),
            CheckpointAction::List => ToolDescriptor::new(
                "List retained checkpoints with their ids, descriptions and which one is current",
                json!({ "type": "object", "properties": {} }),
            ),
            CheckpointAction::Undo => ToolDescriptor::new(
                "Restore the checkpoint before the current one",
                json!({ "type": "object", "properties": {} }),
            ),
            CheckpointAction::Restore => ToolDescriptor::new(
                "Restore any retained checkpoint by id (undo or redo). Set force to re-apply \
                 the current checkpoint after the scene changed.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "minimum": 0 },
                        "force": { "type": "boolean", "default": false }
                    },
                    "required": ["id"]
                }),
            ),
            CheckpointAction::Clear => ToolDescriptor::new(
                "Delete all checkpoints",
                json!({ "type": "object", "properties": {} }),
            ),
        };
        Some(descriptor)
    }
}

/// Register every checkpoint command against one document
pub fn register_checkpoint_commands<S>(
    registry: &mut CommandRegistry,
    document: Arc<Document<S>>,
    checkpoints: Arc<CheckpointManager<S>>,
) -> Result<(), RegistryError>
where
    S: Clone + Send + Sync + 'static,
{
    for action in CheckpointAction::ALL {
        registry.register(
            action.action_name(),
            Arc::new(CheckpointCommand::new(
                action,
                Arc::clone(&document),
                Arc::clone(&checkpoints),
            )),
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "checkpoint_test.rs"]
mod checkpoint_test;
