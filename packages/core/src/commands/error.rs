//! Command Error Types
//!
//! Handlers distinguish intentional validation failures from genuine bugs.
//! The registry formats the two differently: validation messages reach the
//! caller verbatim, unexpected failures are prefixed with `Internal error:`.

use thiserror::Error;

/// Failure raised by a command handler
#[derive(Error, Debug)]
pub enum CommandError {
    /// Expected, caller-correctable failure (bad arguments, missing target)
    #[error("{0}")]
    Validation(String),

    /// Anything the handler did not anticipate
    #[error("{0}")]
    Unexpected(#[from] anyhow::Error),
}

impl CommandError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unexpected error from a plain message
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(anyhow::anyhow!(message.into()))
    }

    /// Create a "missing parameter" validation error
    pub fn missing_param(name: &str) -> Self {
        Self::Validation(format!("Missing '{}' parameter", name))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid parameters: {}", err))
    }
}

/// Registration-time failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Command names must be non-empty
    #[error("Command name must not be empty")]
    EmptyName,

    /// A handler is already registered under this name
    #[error("Command already registered: {name}")]
    DuplicateCommand { name: String },

    /// A descriptor alias collides with an existing tool or command name
    #[error("Tool alias '{alias}' for command '{name}' is already taken")]
    DuplicateAlias { name: String, alias: String },
}

impl RegistryError {
    pub fn duplicate_command(name: impl Into<String>) -> Self {
        Self::DuplicateCommand { name: name.into() }
    }

    pub fn duplicate_alias(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::DuplicateAlias {
            name: name.into(),
            alias: alias.into(),
        }
    }
}
