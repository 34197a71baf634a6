//! Error types for block construction and rendering.
//!
//! [`BlockError`] covers every failure of the framework. Errors raised while
//! resolving options or parsing property paths are wrapped transparently.

use thiserror::Error;

use tessera_core::{OptionsError, PathError};

/// The main error type for Tessera operations.
#[derive(Debug, Error)]
pub enum BlockError {
    /// A caller passed a value that is not acceptable at this boundary.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Expected argument of type \"{expected}\", \"{actual}\" given")]
    UnexpectedType { expected: String, actual: String },

    #[error("Could not load block type \"{name}\"{}", suggestion_hint(.suggestion))]
    TypeNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Child \"{0}\" does not exist")]
    ChildNotFound(String),

    /// The operation is invalid for the current structure of the tree.
    #[error("{0}")]
    Logic(String),

    /// The operation is invalid for the current state of a block.
    #[error("{0}")]
    Runtime(String),

    #[error("Unable to transform value: {0}")]
    TransformationFailed(String),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|name| format!(". Did you mean \"{name}\"?"))
        .unwrap_or_default()
}

impl BlockError {
    /// Creates a [`BlockError::TypeNotFound`] error without suggestion.
    pub fn type_not_found(name: impl Into<String>) -> Self {
        Self::TypeNotFound {
            name: name.into(),
            suggestion: None,
        }
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    pub fn transformation_failed(message: impl Into<String>) -> Self {
        Self::TransformationFailed(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = BlockError> = std::result::Result<T, E>;
