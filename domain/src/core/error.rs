//! Domain error types

use crate::lifecycle::status::ToolStatus;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Illegal state transition: {from} -> {to}")]
    IllegalTransition { from: ToolStatus, to: ToolStatus },

    #[error("Record is already {0}; refusing a no-op transition")]
    SameStatus(ToolStatus),

    #[error("Record is {actual}, expected {expected}")]
    UnexpectedStatus {
        expected: ToolStatus,
        actual: ToolStatus,
    },

    #[error("Failed record has no resumable step recorded")]
    NotResumable,

    #[error("Invalid tool record: {0}")]
    InvalidRecord(String),
}

impl DomainError {
    /// Check if this error is a rejected state transition
    pub fn is_transition_error(&self) -> bool {
        !matches!(self, DomainError::InvalidRecord(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_transition_display() {
        let error = DomainError::IllegalTransition {
            from: ToolStatus::Approved,
            to: ToolStatus::Deploying,
        };
        assert_eq!(
            error.to_string(),
            "Illegal state transition: APPROVED -> DEPLOYING"
        );
    }

    #[test]
    fn test_is_transition_error() {
        assert!(DomainError::SameStatus(ToolStatus::Failed).is_transition_error());
        assert!(DomainError::NotResumable.is_transition_error());
        assert!(!DomainError::InvalidRecord("x".into()).is_transition_error());
    }
}
