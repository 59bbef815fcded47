//! Source validation step.

use super::{StepProcessor, StepResult, StepSuccess};
use crate::ports::repository_validator::{RepositoryValidator, ValidatorError};
use async_trait::async_trait;
use onboard_domain::{Dependency, FailureReason, ToolRecord, ToolStatus};
use std::sync::Arc;
use tracing::{debug, info};

/// Validates `source_url` and moves the record on to `DEPLOYING`.
///
/// Registered twice: once for `SUBMITTED` (the normal entry, which passes
/// through `VALIDATING_SOURCE` in the same commit) and once for
/// `VALIDATING_SOURCE` (a record found resting there is re-validated).
pub struct SourceValidationProcessor<V: RepositoryValidator + ?Sized> {
    state: ToolStatus,
    validator: Arc<V>,
}

impl<V: RepositoryValidator + ?Sized> SourceValidationProcessor<V> {
    pub fn for_submitted(validator: Arc<V>) -> Self {
        Self {
            state: ToolStatus::Submitted,
            validator,
        }
    }

    pub fn for_validating_source(validator: Arc<V>) -> Self {
        Self {
            state: ToolStatus::ValidatingSource,
            validator,
        }
    }
}

#[async_trait]
impl<V: RepositoryValidator + ?Sized + 'static> StepProcessor for SourceValidationProcessor<V> {
    fn state(&self) -> ToolStatus {
        self.state
    }

    fn dependency(&self) -> Dependency {
        Dependency::RepositoryValidator
    }

    async fn execute(&self, record: &ToolRecord) -> StepResult {
        let source_url = record.source_url().trim();
        if source_url.is_empty() {
            return Err(FailureReason::new(
                Dependency::RepositoryValidator,
                "no source reference was submitted",
            ));
        }

        debug!(record = %record.id(), source_url, "Validating source");

        match self.validator.validate(source_url).await {
            Ok(()) => {
                info!(record = %record.id(), "Source accepted");
                Ok(StepSuccess::to(ToolStatus::Deploying))
            }
            Err(ValidatorError::Rejected(reason)) => Err(FailureReason::new(
                Dependency::RepositoryValidator,
                format!("source {} rejected: {}", source_url, reason),
            )),
            Err(e) => Err(FailureReason::new(Dependency::RepositoryValidator, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockValidator;

    fn record(source: &str) -> ToolRecord {
        ToolRecord::new("t1", "alice", source, serde_json::json!({}))
    }

    #[tokio::test]
    async fn test_accepted_source_moves_to_deploying() {
        let validator = Arc::new(MockValidator::accepting());
        let processor = SourceValidationProcessor::for_submitted(validator.clone());

        let result = processor.execute(&record("good")).await.unwrap();
        assert_eq!(result, StepSuccess::to(ToolStatus::Deploying));
        assert_eq!(validator.calls(), vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_source_names_validator() {
        let validator = Arc::new(MockValidator::rejecting("repository is private"));
        let processor = SourceValidationProcessor::for_submitted(validator);

        let reason = processor.execute(&record("bad")).await.unwrap_err();
        assert_eq!(reason.dependency, Dependency::RepositoryValidator);
        assert!(reason.render().starts_with("repository validator: "));
        assert!(reason.render().contains("repository is private"));
    }

    #[tokio::test]
    async fn test_blank_source_fails_without_calling_validator() {
        let validator = Arc::new(MockValidator::accepting());
        let processor = SourceValidationProcessor::for_submitted(validator.clone());

        assert!(processor.execute(&record("   ")).await.is_err());
        assert!(validator.calls().is_empty());
    }

    #[test]
    fn test_bound_states() {
        let validator = Arc::new(MockValidator::accepting());
        assert_eq!(
            SourceValidationProcessor::for_submitted(validator.clone()).state(),
            ToolStatus::Submitted
        );
        assert_eq!(
            SourceValidationProcessor::for_validating_source(validator).state(),
            ToolStatus::ValidatingSource
        );
    }
}
