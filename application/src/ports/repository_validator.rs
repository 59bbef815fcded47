//! Repository validator port
//!
//! Checks that a user-supplied source reference points at a repository
//! the platform is willing to build from.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during source validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    #[error("source rejected: {0}")]
    Rejected(String),

    #[error("validator unreachable: {0}")]
    Unreachable(String),

    #[error("invalid validator response: {0}")]
    InvalidResponse(String),

    #[error("request timed out")]
    Timeout,
}

/// Validator for source repository references
///
/// Validation is read-only, so re-running it for the same record is safe.
#[async_trait]
pub trait RepositoryValidator: Send + Sync {
    /// Validate a source reference. `Ok(())` means the source is accepted.
    async fn validate(&self, source_url: &str) -> Result<(), ValidatorError>;
}
