//! Error types for the sync engine.
//!
//! Every failure falls in one of three classes, see [`ErrorClass`]. The class
//! tells the caller whether retrying the same apply operation can help.

use netsync_controller::ControllerError;
use netsync_types::ParseError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Broad failure class of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The controller failed or could not be reached.
    Infrastructure,
    /// Controller state contradicts what earlier passes established.
    InconsistentState,
    /// The caller supplied a rule or configuration that cannot be built.
    MalformedInput,
}

/// Errors that can occur while reconciling a network.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A controller call failed.
    #[error("Controller call failed: {0}")]
    Controller(#[from] ControllerError),

    /// A chain the router topology should already have is missing.
    #[error("Chain '{name}' not found for tenant {tenant_id}")]
    ChainNotFound {
        /// Tenant the chain was looked up for.
        tenant_id: String,
        /// Expected chain name.
        name: String,
    },

    /// Controller objects are present but do not fit together.
    #[error("Inconsistent controller state: {message}")]
    InconsistentState {
        /// Error message.
        message: String,
    },

    /// A rule names a protocol the protocol table does not know.
    #[error("Unknown protocol '{protocol}'")]
    UnknownProtocol {
        /// The protocol name as supplied.
        protocol: String,
    },

    /// A rule is missing fields or combines fields that cannot go together.
    #[error("Invalid rule: {message}")]
    InvalidRule {
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Reading a file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    /// Creates an inconsistent state error.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentState {
            message: message.into(),
        }
    }

    /// Creates an invalid rule error.
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::InvalidRule {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a chain not found error.
    pub fn chain_not_found(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ChainNotFound {
            tenant_id: tenant_id.into(),
            name: name.into(),
        }
    }

    /// Returns the failure class.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Controller(_) | Self::Io { .. } => ErrorClass::Infrastructure,
            Self::ChainNotFound { .. } | Self::InconsistentState { .. } => {
                ErrorClass::InconsistentState
            }
            Self::UnknownProtocol { .. } | Self::InvalidRule { .. } | Self::Config { .. } => {
                ErrorClass::MalformedInput
            }
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Controller(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<ParseError> for SyncError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownProtocol(protocol) => Self::UnknownProtocol { protocol },
            other => Self::InvalidRule {
                message: other.to_string(),
            },
        }
    }
}
