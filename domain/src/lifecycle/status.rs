//! Onboarding lifecycle states and the legal edges between them.
//!
//! # State Transitions
//!
//! ```text
//! SUBMITTED ──> VALIDATING_SOURCE ──> DEPLOYING ──> DISCOVERING_OPERATIONS ──> APPROVED
//!     │                 │                 │                   │
//!     │                 └─────────────────┴───────────────────┴──> FAILED
//!     ├──> FAILED
//!     └──> MANUAL_REVIEW ──> APPROVED | FAILED
//!
//! FAILED ──> <failed step>            (resubmission)
//! ```
//!
//! Administrative `force` overrides bypass this table; they are checked
//! separately by the override handler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a tool integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolStatus {
    /// Initial state, waiting for source validation.
    Submitted,
    /// Source reference is being validated.
    ValidatingSource,
    /// Deployment spec has been handed to the deployment gateway.
    Deploying,
    /// Querying the deployed service for its operations.
    DiscoveringOperations,
    /// Suspended until an administrator adjudicates.
    ManualReview,
    /// Callable. Terminal.
    Approved,
    /// Terminal until resubmitted.
    Failed,
}

impl ToolStatus {
    pub const ALL: [ToolStatus; 7] = [
        ToolStatus::Submitted,
        ToolStatus::ValidatingSource,
        ToolStatus::Deploying,
        ToolStatus::DiscoveringOperations,
        ToolStatus::ManualReview,
        ToolStatus::Approved,
        ToolStatus::Failed,
    ];

    /// States advanced by a step processor.
    pub const AUTOMATIC: [ToolStatus; 4] = [
        ToolStatus::Submitted,
        ToolStatus::ValidatingSource,
        ToolStatus::Deploying,
        ToolStatus::DiscoveringOperations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Submitted => "SUBMITTED",
            ToolStatus::ValidatingSource => "VALIDATING_SOURCE",
            ToolStatus::Deploying => "DEPLOYING",
            ToolStatus::DiscoveringOperations => "DISCOVERING_OPERATIONS",
            ToolStatus::ManualReview => "MANUAL_REVIEW",
            ToolStatus::Approved => "APPROVED",
            ToolStatus::Failed => "FAILED",
        }
    }

    /// Terminal for the automatic pipeline.
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolStatus::Approved | ToolStatus::Failed)
    }

    /// Whether the engine advances this state on its own.
    pub fn is_automatic(self) -> bool {
        Self::AUTOMATIC.contains(&self)
    }

    /// Whether the automatic pipeline leaves this state alone.
    pub fn is_resting(self) -> bool {
        !self.is_automatic()
    }

    /// Whether a record that failed in this state can be resubmitted into it.
    pub fn is_resumable(self) -> bool {
        self.is_automatic() || self == ToolStatus::ManualReview
    }

    /// Check a single edge of the lifecycle graph.
    ///
    /// Resubmission out of `Failed` is accepted for any resumable target; the
    /// caller must additionally check it equals the record's failed step.
    pub fn can_transition_to(self, to: ToolStatus) -> bool {
        use ToolStatus::*;

        if to == Failed && (self.is_automatic() || self == ManualReview) {
            return true;
        }

        match (self, to) {
            (Submitted, ValidatingSource)
            | (ValidatingSource, Deploying)
            | (Deploying, DiscoveringOperations)
            | (DiscoveringOperations, Approved)
            | (Submitted, ManualReview)
            | (ManualReview, Approved) => true,
            (Failed, target) => target.is_resumable(),
            _ => false,
        }
    }

    /// Intermediate states passed through when moving `self -> to` in a
    /// single committed write, inclusive of both ends.
    ///
    /// Only the source-validation step collapses a hop.
    pub fn path_to(self, to: ToolStatus) -> Vec<ToolStatus> {
        match (self, to) {
            (ToolStatus::Submitted, ToolStatus::Deploying) => vec![
                ToolStatus::Submitted,
                ToolStatus::ValidatingSource,
                ToolStatus::Deploying,
            ],
            _ => vec![self, to],
        }
    }

    /// Whether every hop on [`path_to`](Self::path_to) is a legal edge.
    pub fn can_reach_in_one_commit(self, to: ToolStatus) -> bool {
        self.path_to(to)
            .windows(2)
            .all(|hop| hop[0].can_transition_to(hop[1]))
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ToolStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown tool status: {}", s))
    }
}
