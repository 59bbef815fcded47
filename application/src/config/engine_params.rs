//! Engine parameters: per-step timeouts and discovery policy.
//!
//! [`EngineParams`] groups the static parameters the
//! [`OnboardingEngine`](crate::use_cases::engine::OnboardingEngine) and the
//! step processors need. Infrastructure builds it from the config file.

use onboard_domain::ToolStatus;
use std::time::Duration;

/// How the discovery step treats a reachable service reporting no operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyDiscoveryPolicy {
    /// An empty list fails the step.
    #[default]
    Fail,
    /// An empty list approves the tool with zero operations.
    Accept,
}

/// Step execution parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    /// Upper bound for the source-validation step.
    pub validation_timeout: Duration,
    /// Upper bound for the deployment step.
    pub deployment_timeout: Duration,
    /// Upper bound for the discovery step.
    pub discovery_timeout: Duration,
    pub empty_discovery: EmptyDiscoveryPolicy,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            validation_timeout: Duration::from_secs(15),
            deployment_timeout: Duration::from_secs(120),
            discovery_timeout: Duration::from_secs(30),
            empty_discovery: EmptyDiscoveryPolicy::Fail,
        }
    }
}

impl EngineParams {
    /// Timeout for the step that advances `state`.
    ///
    /// Resting states have no step; they get the shortest timeout so a
    /// misconfigured registry still cannot hang.
    pub fn timeout_for(&self, state: ToolStatus) -> Duration {
        match state {
            ToolStatus::Submitted | ToolStatus::ValidatingSource => self.validation_timeout,
            ToolStatus::Deploying => self.deployment_timeout,
            ToolStatus::DiscoveringOperations => self.discovery_timeout,
            _ => self
                .validation_timeout
                .min(self.deployment_timeout)
                .min(self.discovery_timeout),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn with_deployment_timeout(mut self, timeout: Duration) -> Self {
        self.deployment_timeout = timeout;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_empty_discovery(mut self, policy: EmptyDiscoveryPolicy) -> Self {
        self.empty_discovery = policy;
        self
    }
}
