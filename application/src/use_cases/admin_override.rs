//! Administrative transitions
//!
//! Manual-review decisions, forced status changes and resubmission. Each
//! runs read → mutate → conditional write, exactly like an engine step, so
//! an override racing with an in-flight step commits at most one of them.

use crate::ports::transition_events::{TransitionBus, TransitionTrigger};
use onboard_domain::{CasOutcome, DomainError, Precondition, StoreError, ToolId, ToolRecord, ToolRecordStore, ToolStatus};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Reason stored when a reviewer rejects without giving one.
pub const DEFAULT_REJECT_REASON: &str = "rejected during manual review";

/// Errors from administrative operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdminError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] DomainError),

    #[error("Tool record not found: {0}")]
    NotFound(ToolId),

    #[error("Tool record {id} changed concurrently (now {actual}); re-read and retry")]
    Conflict { id: ToolId, actual: ToolStatus },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AdminError::NotFound(id),
            other => AdminError::Store(other),
        }
    }
}

/// Applies out-of-band transitions to tool records.
pub struct AdminOverrideHandler<S: ToolRecordStore + ?Sized> {
    store: Arc<S>,
    events: TransitionBus,
}

impl<S: ToolRecordStore + ?Sized> AdminOverrideHandler<S> {
    pub fn new(store: Arc<S>, events: TransitionBus) -> Self {
        Self { store, events }
    }

    /// Approve or reject a record waiting in `MANUAL_REVIEW`.
    #[instrument(skip(self, reason), fields(record = %id))]
    pub async fn complete_manual_review(
        &self,
        id: &ToolId,
        approve: bool,
        reason: Option<&str>,
    ) -> Result<ToolRecord, AdminError> {
        let given = reason.map(str::trim).filter(|r| !r.is_empty());
        let stored = given.unwrap_or(DEFAULT_REJECT_REASON).to_string();

        self.mutate(id, TransitionTrigger::ManualReview, given, |record| {
            record.complete_review(approve, stored)
        })
        .await
    }

    /// Move a record to any status other than its current one.
    ///
    /// Forcing `FAILED` records the current status as the failed step and
    /// `reason` as the failure reason.
    #[instrument(skip(self, reason), fields(record = %id, to = %status))]
    pub async fn force_status(
        &self,
        id: &ToolId,
        status: ToolStatus,
        reason: &str,
    ) -> Result<ToolRecord, AdminError> {
        let given = Some(reason.trim()).filter(|r| !r.is_empty());
        let stored = given.unwrap_or("forced by administrator").to_string();
        self.mutate(id, TransitionTrigger::Override, given, |record| {
            record.force(status, stored)
        })
        .await
    }

    /// Return a `FAILED` record to the step it failed in.
    #[instrument(skip(self), fields(record = %id))]
    pub async fn resubmit(&self, id: &ToolId) -> Result<ToolRecord, AdminError> {
        self.mutate(id, TransitionTrigger::Resubmission, None, |record| {
            record.resubmit().map(|_| ())
        })
        .await
    }

    async fn mutate<F>(
        &self,
        id: &ToolId,
        trigger: TransitionTrigger,
        note: Option<&str>,
        change: F,
    ) -> Result<ToolRecord, AdminError>
    where
        F: FnOnce(&mut ToolRecord) -> Result<(), DomainError>,
    {
        let current = self.store.get(id).await?;
        let from = current.status();
        let expected = Precondition::of(&current);

        let mut next = current;
        change(&mut next)?;

        match self.store.compare_and_swap(expected, &next).await? {
            CasOutcome::Committed => {
                info!(trigger = trigger.as_str(), "Committed {} -> {}", from, next.status());
                self.events.publish_commit_with_note(from, &next, trigger, note);
                Ok(next)
            }
            CasOutcome::Conflict { actual, .. } => {
                warn!(actual = %actual, "Administrative transition lost a race");
                Err(AdminError::Conflict {
                    id: id.clone(),
                    actual,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transition_events::TransitionEvent;
    use crate::test_support::{MemoryStore, deployed_record, submitted_record};
    use tokio::sync::broadcast::error::TryRecvError;

    fn review_record(id: &str) -> ToolRecord {
        let mut record = submitted_record(id);
        record.route_to_manual_review().unwrap();
        record
    }

    fn handler(record: ToolRecord) -> (AdminOverrideHandler<MemoryStore>, Arc<MemoryStore>, TransitionBus) {
        let store = Arc::new(MemoryStore::with_record(record));
        let bus = TransitionBus::new(16);
        (AdminOverrideHandler::new(store.clone(), bus.clone()), store, bus)
    }

    #[tokio::test]
    async fn test_review_approval() {
        let (handler, store, bus) = handler(review_record("t2"));
        let mut rx = bus.subscribe();

        let record = handler
            .complete_manual_review(&ToolId::new("t2"), true, None)
            .await
            .unwrap();
        assert_eq!(record.status(), ToolStatus::Approved);
        assert_eq!(store.snapshot("t2").status(), ToolStatus::Approved);

        let event: TransitionEvent = rx.try_recv().unwrap();
        assert_eq!((event.from, event.to), (ToolStatus::ManualReview, ToolStatus::Approved));
        assert_eq!(event.trigger, TransitionTrigger::ManualReview);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_review_rejection_keeps_reason() {
        let (handler, store, _) = handler(review_record("t3"));
        handler
            .complete_manual_review(&ToolId::new("t3"), false, Some("policy violation"))
            .await
            .unwrap();

        let record = store.snapshot("t3");
        assert_eq!(record.status(), ToolStatus::Failed);
        assert_eq!(record.failed_step(), Some(ToolStatus::ManualReview));
        assert_eq!(record.failure_reason(), Some("policy violation"));
    }

    #[tokio::test]
    async fn test_review_rejection_without_reason_uses_default() {
        let (handler, store, _) = handler(review_record("t3"));
        handler
            .complete_manual_review(&ToolId::new("t3"), false, Some("   "))
            .await
            .unwrap();
        assert_eq!(store.snapshot("t3").failure_reason(), Some(DEFAULT_REJECT_REASON));
    }

    #[tokio::test]
    async fn test_review_outside_manual_review_is_rejected() {
        let (handler, store, _) = handler(submitted_record("t1"));
        let err = handler
            .complete_manual_review(&ToolId::new("t1"), true, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::InvalidStateTransition(DomainError::UnexpectedStatus { .. })
        ));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_force_failed_records_prior_status() {
        let (handler, store, _) = handler(deployed_record("t4", "svc-1"));
        let record = handler
            .force_status(&ToolId::new("t4"), ToolStatus::Failed, "abuse report")
            .await
            .unwrap();
        assert_eq!(record.failed_step(), Some(ToolStatus::DiscoveringOperations));
        assert_eq!(store.snapshot("t4").failure_reason(), Some("abuse report"));
    }

    #[tokio::test]
    async fn test_force_reason_reaches_event_for_any_target() {
        for target in [ToolStatus::Approved, ToolStatus::Deploying] {
            let (handler, store, bus) = handler(submitted_record("t5"));
            let mut rx = bus.subscribe();

            handler
                .force_status(&ToolId::new("t5"), target, "  vetted offline ")
                .await
                .unwrap();
            assert_eq!(store.snapshot("t5").status(), target);

            let event = rx.try_recv().unwrap();
            assert_eq!(event.to, target);
            assert_eq!(event.trigger, TransitionTrigger::Override);
            assert_eq!(event.note.as_deref(), Some("vetted offline"));
            assert!(event.failure_reason.is_none());
        }
    }

    #[tokio::test]
    async fn test_force_without_reason_has_no_note() {
        let (handler, _, bus) = handler(submitted_record("t5"));
        let mut rx = bus.subscribe();
        handler
            .force_status(&ToolId::new("t5"), ToolStatus::Approved, "")
            .await
            .unwrap();
        assert!(rx.try_recv().unwrap().note.is_none());
    }

    #[tokio::test]
    async fn test_review_approval_reason_reaches_event() {
        let (handler, _, bus) = handler(review_record("t2"));
        let mut rx = bus.subscribe();
        handler
            .complete_manual_review(&ToolId::new("t2"), true, Some("trusted publisher"))
            .await
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.to, ToolStatus::Approved);
        assert_eq!(event.note.as_deref(), Some("trusted publisher"));
    }

    #[tokio::test]
    async fn test_force_same_status_is_rejected() {
        let (handler, store, _) = handler(submitted_record("t1"));
        let err = handler
            .force_status(&ToolId::new("t1"), ToolStatus::Submitted, "noop")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdminError::InvalidStateTransition(DomainError::SameStatus(ToolStatus::Submitted))
        );
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_force_out_of_failed_clears_failure_fields() {
        let mut record = submitted_record("t1");
        record.fail("repository validator: gone").unwrap();
        let (handler, _, _) = handler(record);

        let record = handler
            .force_status(&ToolId::new("t1"), ToolStatus::Deploying, "")
            .await
            .unwrap();
        assert!(record.failed_step().is_none());
        assert!(record.failure_reason().is_none());
        assert!(record.check_invariants().is_ok());
    }

    #[tokio::test]
    async fn test_resubmit_resumes_at_failed_step() {
        let mut record = deployed_record("t1", "svc-1");
        record.fail("tool discovery: service svc-1 reported no operations").unwrap();
        let (handler, _, bus) = handler(record);
        let mut rx = bus.subscribe();

        let record = handler.resubmit(&ToolId::new("t1")).await.unwrap();
        assert_eq!(record.status(), ToolStatus::DiscoveringOperations);
        assert_eq!(record.service_name(), Some("svc-1"));
        assert!(record.failure_reason().is_none());
        assert_eq!(rx.try_recv().unwrap().trigger, TransitionTrigger::Resubmission);
    }

    #[tokio::test]
    async fn test_resubmit_non_failed_is_rejected() {
        let (handler, _, _) = handler(submitted_record("t1"));
        assert!(matches!(
            handler.resubmit(&ToolId::new("t1")).await,
            Err(AdminError::InvalidStateTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let (handler, _, _) = handler(submitted_record("t1"));
        assert_eq!(
            handler.resubmit(&ToolId::new("missing")).await.unwrap_err(),
            AdminError::NotFound(ToolId::new("missing"))
        );
    }
}
