//! Error types for the operator

use crate::store::StoreError;
use relay_validation::{InterfaceConflict, ValidationError};
use thiserror::Error;

/// Operator error type
#[derive(Debug, Error)]
pub enum OperatorError {
    /// Malformed interface list; rejected at admission, never retried
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Interface claim collides with another healthy monitor; never retried
    #[error("Conflict: {0}")]
    Conflict(#[from] InterfaceConflict),

    /// Store read or write failed or timed out; the whole pass is retried
    #[error("Transport error: {0}")]
    Transport(#[from] StoreError),

    /// No workload image available; blocks workload sync only
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ownership binding could not be established
    #[error("Failed to set controller reference: {0}")]
    Ownership(String),
}

/// Result type for operator operations
pub type Result<T> = std::result::Result<T, OperatorError>;

impl OperatorError {
    /// Whether re-running the failed pass may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperatorError::Transport(_) | OperatorError::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::ObjectKey;

    #[test]
    fn test_retryable_classification() {
        assert!(OperatorError::Transport(StoreError::Transport("reset".into())).is_retryable());
        assert!(OperatorError::Configuration("image".into()).is_retryable());

        let validation = OperatorError::from(ValidationError::EmptyInterface {
            index: 0,
            value: "".into(),
        });
        assert!(!validation.is_retryable());

        let conflict = OperatorError::from(InterfaceConflict {
            interfaces: vec!["eth0".into()],
            other: ObjectKey::new("ns", "b"),
        });
        assert!(!conflict.is_retryable());
        assert!(conflict.to_string().starts_with("Conflict: interfaces [eth0]"));
    }
}
