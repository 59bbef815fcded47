//! Step processors: one unit of work per automatic state.
//!
//! Each processor is bound to exactly one [`ToolStatus`], performs the
//! external call(s) for that step and declares the state the record moves
//! to. Processors never persist anything; the engine commits their result.
//!
//! # Flow
//!
//! ```text
//! SUBMITTED ───────── SourceValidationProcessor ──> DEPLOYING
//! VALIDATING_SOURCE ─ SourceValidationProcessor ──> DEPLOYING
//! DEPLOYING ───────── DeploymentProcessor ────────> DISCOVERING_OPERATIONS
//! DISCOVERING_OPS ─── DiscoveryProcessor ─────────> APPROVED
//! ```
//!
//! Every failure is returned as a [`FailureReason`] naming the dependency
//! that failed; processors do not raise.

pub mod deployment;
pub mod discovery;
pub mod registry;
pub mod source_validation;

use async_trait::async_trait;
use onboard_domain::{Dependency, FailureReason, StepEffect, ToolRecord, ToolStatus};

pub use deployment::DeploymentProcessor;
pub use discovery::DiscoveryProcessor;
pub use registry::{ProcessorRegistry, RegistryError};
pub use source_validation::SourceValidationProcessor;

/// A successful step: the declared next state plus record changes.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSuccess {
    pub next: ToolStatus,
    pub effect: StepEffect,
}

impl StepSuccess {
    pub fn to(next: ToolStatus) -> Self {
        Self {
            next,
            effect: StepEffect::None,
        }
    }

    pub fn with_effect(mut self, effect: StepEffect) -> Self {
        self.effect = effect;
        self
    }
}

/// Result of running one step.
pub type StepResult = Result<StepSuccess, FailureReason>;

/// The unit of behavior bound to one automatic state.
///
/// `execute` must be idempotent with respect to the external side effect
/// it performs: running it twice for the same record (e.g. after a crash
/// before the transition was persisted) must not create duplicate external
/// resources.
#[async_trait]
pub trait StepProcessor: Send + Sync {
    /// The state this processor advances.
    fn state(&self) -> ToolStatus;

    /// The external collaborator this step calls; used to attribute
    /// timeouts and panics.
    fn dependency(&self) -> Dependency;

    /// Perform the step for `record`.
    async fn execute(&self, record: &ToolRecord) -> StepResult;
}
