//! The tool record entity and its guarded mutations.
//!
//! A [`ToolRecord`] is the unit of work moved through the onboarding
//! lifecycle. Fields are private: every status change goes through one of
//! the transition methods below, which check the edge against
//! [`ToolStatus::can_transition_to`] and keep the failure fields paired.
//!
//! Each successful transition bumps [`ToolRecord::revision`] and remembers
//! the status it left in [`ToolRecord::previous_status`]; stores use the
//! pre-transition `(status, revision)` as the compare-and-swap precondition.

use crate::core::error::DomainError;
use crate::core::ids::{OwnerId, ToolId};
use crate::lifecycle::status::ToolStatus;
use crate::tool::operation::OperationDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record changes produced by a successful step, applied atomically with
/// the status change.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StepEffect {
    #[default]
    None,
    /// The deployment gateway reported the resolved service name.
    Deployed { service_name: String },
    /// Discovery reported the operation list; replaces any previous list.
    OperationsDiscovered(Vec<OperationDescriptor>),
}

/// A user-submitted tool integration (Entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    id: ToolId,
    owner: OwnerId,
    status: ToolStatus,
    source_url: String,
    deployment_spec: serde_json::Value,
    #[serde(default)]
    service_name: Option<String>,
    #[serde(default)]
    discovered_operations: Vec<OperationDescriptor>,
    #[serde(default)]
    failed_step: Option<ToolStatus>,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    previous_status: Option<ToolStatus>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ToolRecord {
    /// Create a record in the initial `SUBMITTED` state.
    pub fn new(
        id: impl Into<ToolId>,
        owner: impl Into<OwnerId>,
        source_url: impl Into<String>,
        deployment_spec: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner: owner.into(),
            status: ToolStatus::Submitted,
            source_url: source_url.into(),
            deployment_spec,
            service_name: None,
            discovered_operations: Vec::new(),
            failed_step: None,
            failure_reason: None,
            revision: 0,
            previous_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &ToolId {
        &self.id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn status(&self) -> ToolStatus {
        self.status
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn deployment_spec(&self) -> &serde_json::Value {
        &self.deployment_spec
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn discovered_operations(&self) -> &[OperationDescriptor] {
        &self.discovered_operations
    }

    pub fn failed_step(&self) -> Option<ToolStatus> {
        self.failed_step
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn previous_status(&self) -> Option<ToolStatus> {
        self.previous_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ==================== Transitions ====================

    /// Route a freshly submitted record to human review.
    ///
    /// The decision itself is made outside this subsystem.
    pub fn route_to_manual_review(&mut self) -> Result<(), DomainError> {
        self.expect_status(ToolStatus::Submitted)?;
        self.commit(ToolStatus::ManualReview);
        Ok(())
    }

    /// Apply the successful outcome of a step processor.
    pub fn apply_step(&mut self, next: ToolStatus, effect: StepEffect) -> Result<(), DomainError> {
        if !self.status.is_automatic() || !self.status.can_reach_in_one_commit(next) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }

        match effect {
            StepEffect::None => {}
            StepEffect::Deployed { service_name } => {
                if service_name.trim().is_empty() {
                    return Err(DomainError::InvalidRecord(
                        "deployment produced an empty service name".to_string(),
                    ));
                }
                self.service_name = Some(service_name);
            }
            StepEffect::OperationsDiscovered(operations) => {
                self.discovered_operations = operations;
            }
        }

        self.commit(next);
        Ok(())
    }

    /// Mark the record `FAILED`, remembering the step it failed in.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(ToolStatus::Failed) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: ToolStatus::Failed,
            });
        }
        let failed_step = self.status;
        self.commit(ToolStatus::Failed);
        self.failed_step = Some(failed_step);
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Adjudicate a record suspended in `MANUAL_REVIEW`.
    pub fn complete_review(&mut self, approve: bool, reason: impl Into<String>) -> Result<(), DomainError> {
        self.expect_status(ToolStatus::ManualReview)?;
        if approve {
            self.commit(ToolStatus::Approved);
            Ok(())
        } else {
            self.fail(reason)
        }
    }

    /// Re-enter the pipeline at the step that failed.
    ///
    /// Returns the status the record resumed in.
    pub fn resubmit(&mut self) -> Result<ToolStatus, DomainError> {
        self.expect_status(ToolStatus::Failed)?;
        let resume_at = self
            .failed_step
            .filter(|step| step.is_resumable())
            .ok_or(DomainError::NotResumable)?;
        self.commit(resume_at);
        Ok(resume_at)
    }

    /// Administrative override to an arbitrary status.
    ///
    /// Rejects a no-op target: asking for the current status signals a stale
    /// read on the caller's side.
    pub fn force(&mut self, to: ToolStatus, reason: impl Into<String>) -> Result<(), DomainError> {
        if to == self.status {
            return Err(DomainError::SameStatus(to));
        }
        let before = self.status;
        self.commit(to);
        if to == ToolStatus::Failed {
            self.failed_step = Some(before);
            self.failure_reason = Some(reason.into());
        }
        Ok(())
    }

    /// Verify the structural invariants of a record.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let is_failed = self.status == ToolStatus::Failed;
        if is_failed != self.failed_step.is_some() || is_failed != self.failure_reason.is_some() {
            return Err(DomainError::InvalidRecord(format!(
                "failure fields must be set together and only when FAILED (status {})",
                self.status
            )));
        }
        if !self.discovered_operations.is_empty() && self.service_name.is_none() {
            return Err(DomainError::InvalidRecord(
                "operations discovered without a deployed service".to_string(),
            ));
        }
        if self.id.as_str().trim().is_empty() {
            return Err(DomainError::InvalidRecord("empty id".to_string()));
        }
        Ok(())
    }

    fn expect_status(&self, expected: ToolStatus) -> Result<(), DomainError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DomainError::UnexpectedStatus {
                expected,
                actual: self.status,
            })
        }
    }

    /// Move to `to`, clearing failure fields. Callers entering `FAILED` set
    /// them again afterwards.
    fn commit(&mut self, to: ToolStatus) {
        self.previous_status = Some(self.status);
        self.status = to;
        self.failed_step = None;
        self.failure_reason = None;
        self.revision += 1;
        self.updated_at = Utc::now();
    }
}
