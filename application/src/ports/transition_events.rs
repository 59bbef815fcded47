//! Transition event channel.
//!
//! Every committed status change is published as a [`TransitionEvent`] on a
//! [`TransitionBus`]. Observers (audit log, notifications, console output)
//! subscribe to the bus; the engine does not know who is listening.
//!
//! Delivery is best-effort per subscriber: a subscriber that falls more than
//! the bus capacity behind observes `RecvError::Lagged` and skips ahead. The
//! persisted record remains the source of truth.

use chrono::{DateTime, Utc};
use onboard_domain::{ToolId, ToolRecord, ToolStatus};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// What caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// A step processor completed (successfully or not).
    Step,
    /// Routing decided at submission time.
    Submission,
    /// An administrator adjudicated a manual review.
    ManualReview,
    /// An administrator forced a status.
    Override,
    /// An administrator resubmitted a failed record.
    Resubmission,
}

impl TransitionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionTrigger::Step => "step",
            TransitionTrigger::Submission => "submission",
            TransitionTrigger::ManualReview => "manual_review",
            TransitionTrigger::Override => "override",
            TransitionTrigger::Resubmission => "resubmission",
        }
    }
}

/// A single committed hop between two lifecycle states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionEvent {
    pub record_id: ToolId,
    pub from: ToolStatus,
    pub to: ToolStatus,
    pub trigger: TransitionTrigger,
    /// Revision of the record after the commit that produced this hop.
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<ToolStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Administrator-supplied reason for an override or review decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

impl TransitionEvent {
    /// Build the events for one committed write.
    ///
    /// Step commits that collapse several edges (source validation) yield
    /// one event per hop, in order. Administrative commits yield exactly one.
    pub fn for_commit(from: ToolStatus, committed: &ToolRecord, trigger: TransitionTrigger) -> Vec<Self> {
        let to = committed.status();
        let path = match trigger {
            TransitionTrigger::Step => from.path_to(to),
            _ => vec![from, to],
        };

        path.windows(2)
            .map(|hop| {
                let is_failure = hop[1] == ToolStatus::Failed;
                Self {
                    record_id: committed.id().clone(),
                    from: hop[0],
                    to: hop[1],
                    trigger,
                    revision: committed.revision(),
                    failed_step: if is_failure { committed.failed_step() } else { None },
                    failure_reason: if is_failure {
                        committed.failure_reason().map(str::to_string)
                    } else {
                        None
                    },
                    note: None,
                    at: committed.updated_at(),
                }
            })
            .collect()
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Broadcast channel carrying [`TransitionEvent`]s.
#[derive(Debug, Clone)]
pub struct TransitionBus {
    sender: broadcast::Sender<TransitionEvent>,
}

impl TransitionBus {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.sender.subscribe()
    }

    /// Publish events; having no subscribers is fine.
    pub fn publish(&self, events: impl IntoIterator<Item = TransitionEvent>) {
        for event in events {
            trace!(
                record = %event.record_id,
                from = %event.from,
                to = %event.to,
                "Publishing transition event"
            );
            let _ = self.sender.send(event);
        }
    }

    /// Convenience: build and publish the events for a committed write.
    pub fn publish_commit(&self, from: ToolStatus, committed: &ToolRecord, trigger: TransitionTrigger) {
        self.publish(TransitionEvent::for_commit(from, committed, trigger));
    }

    /// Like [`publish_commit`](Self::publish_commit), attaching `note` to
    /// every event when one is given.
    pub fn publish_commit_with_note(
        &self,
        from: ToolStatus,
        committed: &ToolRecord,
        trigger: TransitionTrigger,
        note: Option<&str>,
    ) {
        let events = TransitionEvent::for_commit(from, committed, trigger);
        match note {
            Some(note) => self.publish(events.into_iter().map(|e| e.with_note(note))),
            None => self.publish(events),
        }
    }
}

impl Default for TransitionBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
