//! Command Surface
//!
//! Named, schema-described operations behind one uniform contract:
//!
//! - [`CommandRegistry`] - name → handler table and the error-containment boundary
//! - [`BatchCommandHandler`] - runs many commands in one call (collect-all)
//! - [`checkpoint`] - undo/redo commands over a live document
//!
//! Domain commands (geometry, materials, rendering, ...) plug in by
//! implementing [`CommandHandler`].

pub mod batch;
pub mod checkpoint;
pub mod error;
pub mod registry;
pub mod types;

pub use batch::{BatchCommandHandler, BatchSummary, BATCH_ACTION, MAX_BATCH_SIZE};
pub use checkpoint::{register_checkpoint_commands, CheckpointAction, CheckpointCommand};
pub use error::{CommandError, RegistryError};
pub use registry::{CommandContext, CommandHandler, CommandRegistry, ToolEntry};
pub use types::{CommandParams, CommandRequest, CommandResponse, ToolDescriptor};
