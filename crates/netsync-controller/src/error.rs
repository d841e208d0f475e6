//! Controller error types.

use thiserror::Error;

/// Result type alias for controller calls.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Error type for controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The controller could not be reached or timed out.
    #[error("Controller unavailable: {message}")]
    Unavailable { message: String },

    /// The referenced object does not exist.
    #[error("Object not found: {object}")]
    NotFound { object: String },

    /// The request was rejected as malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The request conflicts with current object state.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Unexpected controller-side failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ControllerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        ControllerError::Unavailable {
            message: message.into(),
        }
    }

    pub fn not_found(object: impl Into<String>) -> Self {
        ControllerError::NotFound {
            object: object.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ControllerError::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ControllerError::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ControllerError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ControllerError::Unavailable { .. } | ControllerError::Internal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ControllerError::unavailable("timeout").is_retryable());
        assert!(ControllerError::internal("boom").is_retryable());
        assert!(!ControllerError::not_found("Port(x)").is_retryable());
        assert!(!ControllerError::conflict("already linked").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ControllerError::not_found("Router(abc)");
        assert_eq!(err.to_string(), "Object not found: Router(abc)");
    }
}
