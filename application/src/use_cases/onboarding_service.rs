//! Onboarding service facade
//!
//! The surface exposed to collaborators: creating records, administrative
//! decisions and read access. Automatic progression is delegated to the
//! [`OrchestrationDriver`].

use super::admin_override::{AdminError, AdminOverrideHandler};
use super::driver::{DriverError, OrchestrationDriver};
use crate::ports::transition_events::{TransitionBus, TransitionEvent, TransitionTrigger};
use onboard_domain::{DomainError, OwnerId, StoreError, ToolId, ToolRecord, ToolRecordStore, ToolStatus};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Errors returned by [`OnboardingService`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        ServiceError::Admin(AdminError::InvalidStateTransition(err))
    }
}

/// Input for [`OnboardingService::submit`]
#[derive(Debug, Clone)]
pub struct SubmitToolInput {
    /// Explicit id; generated when absent.
    pub id: Option<ToolId>,
    pub owner: OwnerId,
    pub source_url: String,
    pub deployment_spec: serde_json::Value,
}

impl SubmitToolInput {
    pub fn new(
        owner: impl Into<OwnerId>,
        source_url: impl Into<String>,
        deployment_spec: serde_json::Value,
    ) -> Self {
        Self {
            id: None,
            owner: owner.into(),
            source_url: source_url.into(),
            deployment_spec,
        }
    }

    pub fn with_id(mut self, id: impl Into<ToolId>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn into_record(self) -> Result<ToolRecord, ServiceError> {
        if self.owner.as_str().trim().is_empty() {
            return Err(ServiceError::InvalidSubmission("owner must not be empty".into()));
        }
        if !self.deployment_spec.is_object() {
            return Err(ServiceError::InvalidSubmission(
                "deployment spec must be a JSON object".into(),
            ));
        }
        let id = self.id.unwrap_or_else(ToolId::generate);
        let record = ToolRecord::new(id, self.owner, self.source_url, self.deployment_spec);
        record
            .check_invariants()
            .map_err(|e| ServiceError::InvalidSubmission(e.to_string()))?;
        Ok(record)
    }
}

/// Entry point for everything outside the automatic pipeline.
pub struct OnboardingService<S: ToolRecordStore + ?Sized + 'static> {
    store: Arc<S>,
    driver: Arc<OrchestrationDriver<S>>,
    admin: AdminOverrideHandler<S>,
    events: TransitionBus,
}

impl<S: ToolRecordStore + ?Sized + 'static> OnboardingService<S> {
    pub fn new(driver: Arc<OrchestrationDriver<S>>) -> Self {
        let store = Arc::clone(driver.engine().store());
        let events = driver.engine().events().clone();
        Self {
            admin: AdminOverrideHandler::new(Arc::clone(&store), events.clone()),
            store,
            driver,
            events,
        }
    }

    pub fn driver(&self) -> &Arc<OrchestrationDriver<S>> {
        &self.driver
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events.subscribe()
    }

    /// Persist a new `SUBMITTED` record and queue it for processing.
    pub async fn submit(&self, input: SubmitToolInput) -> Result<ToolRecord, ServiceError> {
        let record = input.into_record()?;
        self.store.insert(&record).await?;
        info!(record = %record.id(), owner = %record.owner(), "Tool submitted");
        self.driver.enqueue(record.id().clone()).await?;
        Ok(record)
    }

    /// Persist a new record routed straight to `MANUAL_REVIEW`.
    ///
    /// The routing decision is made by the caller; nothing is queued.
    pub async fn submit_for_review(&self, input: SubmitToolInput) -> Result<ToolRecord, ServiceError> {
        let mut record = input.into_record()?;
        record.route_to_manual_review()?;
        self.store.insert(&record).await?;
        info!(record = %record.id(), owner = %record.owner(), "Tool submitted for manual review");
        self.events
            .publish_commit(ToolStatus::Submitted, &record, TransitionTrigger::Submission);
        Ok(record)
    }

    /// Approve or reject a record in `MANUAL_REVIEW`.
    pub async fn admin_complete(
        &self,
        id: &ToolId,
        approve: bool,
        reason: Option<&str>,
    ) -> Result<ToolRecord, ServiceError> {
        Ok(self.admin.complete_manual_review(id, approve, reason).await?)
    }

    /// Force a record into `status`; queues it if that status is automatic.
    pub async fn admin_force(
        &self,
        id: &ToolId,
        status: ToolStatus,
        reason: &str,
    ) -> Result<ToolRecord, ServiceError> {
        let record = self.admin.force_status(id, status, reason).await?;
        self.requeue_if_automatic(&record).await;
        Ok(record)
    }

    /// Resume a `FAILED` record at its failed step.
    pub async fn admin_resubmit(&self, id: &ToolId) -> Result<ToolRecord, ServiceError> {
        let record = self.admin.resubmit(id).await?;
        self.requeue_if_automatic(&record).await;
        Ok(record)
    }

    pub async fn status(&self, id: &ToolId) -> Result<ToolRecord, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list(&self, status: Option<ToolStatus>) -> Result<Vec<ToolRecord>, ServiceError> {
        Ok(self.store.list(status).await?)
    }

    /// The transition is already committed; a record left unqueued is
    /// picked up by the next recovery pass.
    async fn requeue_if_automatic(&self, record: &ToolRecord) {
        if !record.status().is_automatic() {
            return;
        }
        if let Err(e) = self.driver.enqueue(record.id().clone()).await {
            warn!(record = %record.id(), "Could not queue record: {}", e);
        }
    }
}
