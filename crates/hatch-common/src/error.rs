//! Unified error types for the Hatch workspace.
//!
//! Every stage of container creation surfaces its failure through one of
//! these variants without local recovery, so the final caller always sees
//! the classification of the first failure encountered.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum HatchError {
    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier or path of the missing resource.
        id: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The specification file could not be deserialized.
    #[error("malformed specification {path}: {source}")]
    MalformedSpec {
        /// Path of the specification file.
        path: PathBuf,
        /// Underlying decoding error.
        source: serde_json::Error,
    },

    /// A specification invariant was violated.
    #[error("invalid specification: {message}")]
    InvalidSpec {
        /// The rule that was violated.
        message: String,
    },

    /// A path could not be resolved.
    #[error("cannot resolve path {path}: {source}")]
    PathError {
        /// Path that failed to resolve.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A requested capability is not available on this host.
    #[error("{message}")]
    UnsupportedConfiguration {
        /// Description of the missing capability.
        message: String,
    },

    /// The specification cannot be represented as an engine configuration.
    #[error("cannot convert specification: {message}")]
    ConfigConversion {
        /// Description of the unrepresentable setting.
        message: String,
    },

    /// The container engine rejected or failed the creation.
    #[error("failed to create container {id}: {reason}")]
    CreationFailed {
        /// Identifier of the container being created.
        id: String,
        /// Engine-provided failure description.
        reason: String,
    },

    /// Serialization or deserialization of runtime state failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl HatchError {
    /// Shorthand for an [`HatchError::InvalidSpec`] with the given rule.
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            message: message.into(),
        }
    }

    /// Shorthand for a [`HatchError::ConfigConversion`] with the given message.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::ConfigConversion {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HatchError>;
