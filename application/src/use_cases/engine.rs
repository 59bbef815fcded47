//! Onboarding engine
//!
//! Advances one record by one step: resolves the processor for the record's
//! status, runs it with failure containment, and commits the result under
//! a compare-and-swap precondition.
//!
//! # Flow
//!
//! ```text
//! advance(record)
//!   ├─ resting state (APPROVED / FAILED / MANUAL_REVIEW) ──> Skipped, no side effects
//!   ├─ no processor for status ─────────────────────────> EngineError::MissingProcessor (fatal)
//!   └─ run processor (timeout + panic containment)
//!        ├─ Ok(next, effect) ──> apply_step ─┐
//!        └─ Err(reason) ───────> fail ───────┤
//!                                            └─ compare_and_swap(read precondition)
//!                                                 ├─ Committed ──> publish TransitionEvents
//!                                                 └─ Conflict ───> abandon silently
//! ```
//!
//! The engine never resubmits; the
//! [`OrchestrationDriver`](super::driver::OrchestrationDriver) decides what
//! to do with the outcome.

use crate::config::EngineParams;
use crate::ports::transition_events::{TransitionBus, TransitionTrigger};
use crate::processors::{ProcessorRegistry, StepProcessor, StepResult};
use futures::FutureExt;
use onboard_domain::{
    CasOutcome, DomainError, FailureReason, Precondition, StoreError, ToolId, ToolRecord,
    ToolRecordStore, ToolStatus,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Errors that escape [`OnboardingEngine::advance`].
///
/// External-call failures never appear here; they are committed as
/// `FAILED` records instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("No step processor registered for {0}; refusing to advance")]
    MissingProcessor(ToolStatus),

    #[error("Step processor for {from} declared an illegal next state {to}: {source}")]
    IllegalStep {
        from: ToolStatus,
        to: ToolStatus,
        #[source]
        source: DomainError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Programming or configuration errors that must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::MissingProcessor(_) | EngineError::IllegalStep { .. }
        )
    }
}

/// What a call to [`OnboardingEngine::advance`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// The record rests in a state the engine does not advance.
    Skipped { status: ToolStatus },
    /// A step succeeded and its transition was committed.
    Advanced { from: ToolStatus, record: ToolRecord },
    /// A step failed and the `FAILED` record was committed.
    Failed { from: ToolStatus, record: ToolRecord },
    /// Another execution committed first; nothing was written.
    Conflict {
        expected: Precondition,
        actual: ToolStatus,
    },
}

impl AdvanceOutcome {
    /// The committed record, if this call wrote one.
    pub fn record(&self) -> Option<&ToolRecord> {
        match self {
            AdvanceOutcome::Advanced { record, .. } | AdvanceOutcome::Failed { record, .. } => {
                Some(record)
            }
            _ => None,
        }
    }

    /// Whether the record landed in another automatic state.
    pub fn should_continue(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { record, .. } if record.status().is_automatic())
    }
}

/// Drives single steps of the onboarding state machine.
pub struct OnboardingEngine<S: ToolRecordStore + ?Sized> {
    store: Arc<S>,
    registry: Arc<ProcessorRegistry>,
    events: TransitionBus,
    params: EngineParams,
}

impl<S: ToolRecordStore + ?Sized> OnboardingEngine<S> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<ProcessorRegistry>,
        events: TransitionBus,
        params: EngineParams,
    ) -> Self {
        Self {
            store,
            registry,
            events,
            params,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn events(&self) -> &TransitionBus {
        &self.events
    }

    /// Load the current record and advance it.
    pub async fn advance_id(&self, id: &ToolId) -> Result<AdvanceOutcome, EngineError> {
        let record = self.store.get(id).await?;
        self.advance(record).await
    }

    /// Advance `record` by one step.
    ///
    /// `record` is the snapshot the caller read; its `(status, revision)`
    /// is the precondition for the write.
    #[instrument(skip_all, fields(record = %record.id(), status = %record.status()))]
    pub async fn advance(&self, record: ToolRecord) -> Result<AdvanceOutcome, EngineError> {
        let from = record.status();
        if from.is_resting() {
            debug!("Record rests in {}, nothing to do", from);
            return Ok(AdvanceOutcome::Skipped { status: from });
        }

        let Some(processor) = self.registry.get(from) else {
            error!("No step processor registered for {}", from);
            return Err(EngineError::MissingProcessor(from));
        };

        let expected = Precondition::of(&record);
        let result = self.run_step(processor.as_ref(), &record).await;

        let mut next = record;
        let failed = match result {
            Ok(success) => {
                let to = success.next;
                next.apply_step(to, success.effect)
                    .map_err(|source| EngineError::IllegalStep { from, to, source })?;
                false
            }
            Err(reason) => {
                warn!(reason = %reason, "Step failed");
                next.fail(reason.render())
                    .map_err(|source| EngineError::IllegalStep {
                        from,
                        to: ToolStatus::Failed,
                        source,
                    })?;
                true
            }
        };

        match self.store.compare_and_swap(expected, &next).await? {
            CasOutcome::Committed => {
                info!("Committed {} -> {}", from, next.status());
                self.events
                    .publish_commit(from, &next, TransitionTrigger::Step);
                Ok(if failed {
                    AdvanceOutcome::Failed { from, record: next }
                } else {
                    AdvanceOutcome::Advanced { from, record: next }
                })
            }
            CasOutcome::Conflict { actual, revision } => {
                info!(
                    actual = %actual,
                    revision,
                    "Record was transitioned concurrently; abandoning this execution"
                );
                Ok(AdvanceOutcome::Conflict { expected, actual })
            }
        }
    }

    /// Run a processor with a timeout, converting panics and timeouts into
    /// failures attributed to the processor's dependency.
    async fn run_step(&self, processor: &dyn StepProcessor, record: &ToolRecord) -> StepResult {
        let dependency = processor.dependency();
        let timeout = self.params.timeout_for(processor.state());
        let step = AssertUnwindSafe(processor.execute(record)).catch_unwind();

        match tokio::time::timeout(timeout, step).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(dependency = %dependency, "Step panicked: {}", detail);
                Err(FailureReason::new(dependency, format!("step aborted unexpectedly: {}", detail)))
            }
            Err(_) => {
                warn!(dependency = %dependency, ?timeout, "Step timed out");
                Err(FailureReason::timed_out(dependency, timeout))
            }
        }
    }
}
