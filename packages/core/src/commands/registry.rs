//! Command Registry
//!
//! Maps action names to handlers and dispatches requests. `dispatch` is the
//! single error-containment point for the whole command surface: handler
//! errors and panics are turned into `CommandResponse::Error` here and never
//! escape to the protocol layer.
//!
//! The registry is built mutably at startup and then shared read-only
//! (typically behind an `Arc`), so dispatch needs no locking.

use crate::commands::error::{CommandError, RegistryError};
use crate::commands::types::{CommandRequest, CommandResponse, ToolDescriptor};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// A capability registered under a unique action name
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command
    ///
    /// Returns the success payload (normally a JSON object) or a
    /// [`CommandError`]. Panics are tolerated but reported as internal errors.
    async fn execute(
        &self,
        ctx: CommandContext<'_>,
        request: &CommandRequest,
    ) -> Result<Value, CommandError>;

    /// Optional tool description; commands without one are callable but
    /// not advertised by `tools/list`
    fn descriptor(&self) -> Option<ToolDescriptor> {
        None
    }
}

/// Per-dispatch view handed to a handler
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    registry: &'a CommandRegistry,
    action: &'a str,
}

impl<'a> CommandContext<'a> {
    /// The registry that dispatched this call, for handlers that fan out
    pub fn registry(&self) -> &'a CommandRegistry {
        self.registry
    }

    /// Name the running handler was registered under
    pub fn action(&self) -> &'a str {
        self.action
    }
}

/// A registered command as exposed through `tools/list`
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEntry {
    /// Public tool name (alias if declared, otherwise the action name)
    pub name: String,
    /// Internal action name
    pub action: String,
    pub descriptor: ToolDescriptor,
}

/// Name → handler table
#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`
    ///
    /// Duplicate registration is forbidden: the first handler wins and the
    /// second call fails. A descriptor alias is checked against existing
    /// action names and aliases as well.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.handlers.contains_key(&name) || self.aliases.contains_key(&name) {
            return Err(RegistryError::duplicate_command(name));
        }

        let alias = handler
            .descriptor()
            .and_then(|descriptor| descriptor.alias)
            .filter(|alias| alias != &name);
        if let Some(alias) = alias {
            if alias.trim().is_empty()
                || self.handlers.contains_key(&alias)
                || self.aliases.contains_key(&alias)
            {
                return Err(RegistryError::duplicate_alias(name, alias));
            }
            self.aliases.insert(alias, name.clone());
        }

        debug!("Registered command '{}'", name);
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Whether an action name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Map a public tool name to its action name
    ///
    /// Aliases take precedence; a plain action name resolves to itself.
    /// Unknown names resolve to `None`.
    pub fn resolve_tool(&self, tool_name: &str) -> Option<&str> {
        if let Some(action) = self.aliases.get(tool_name) {
            return Some(action.as_str());
        }
        self.handlers
            .get_key_value(tool_name)
            .map(|(name, _)| name.as_str())
    }

    /// Every command that exposes a descriptor, sorted by action name
    pub fn tools(&self) -> Vec<ToolEntry> {
        self.handlers
            .iter()
            .filter_map(|(action, handler)| {
                let descriptor = handler.descriptor()?;
                let name = descriptor.alias.clone().unwrap_or_else(|| action.clone());
                Some(ToolEntry {
                    name,
                    action: action.clone(),
                    descriptor,
                })
            })
            .collect()
    }

    /// Dispatch a request to its handler
    ///
    /// Never fails: unknown actions, handler errors and handler panics all
    /// come back as `CommandResponse::Error`.
    #[instrument(skip(self, request), fields(action = %request.name()))]
    pub async fn dispatch(&self, request: &CommandRequest) -> CommandResponse {
        let Some((action, handler)) = self.handlers.get_key_value(request.name()) else {
            warn!("Unknown action: {}", request.name());
            return CommandResponse::error(format!("Unknown action: {}", request.name()));
        };

        let ctx = CommandContext {
            registry: self,
            action: action.as_str(),
        };

        let outcome = AssertUnwindSafe(handler.execute(ctx, request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(data)) => {
                debug!("✅ Command '{}' succeeded", action);
                CommandResponse::ok(data)
            }
            Ok(Err(CommandError::Validation(message))) => {
                warn!("Command '{}' rejected: {}", action, message);
                CommandResponse::Error(message)
            }
            Ok(Err(CommandError::Unexpected(err))) => {
                error!("❌ Command '{}' failed: {:#}", action, err);
                CommandResponse::error(format!("Internal error: {}", err))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("❌ Command '{}' panicked: {}", action, message);
                CommandResponse::error(format!("Internal error: {}", message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
