//! Failure diagnostics attached to a `FAILED` record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The collaborator responsible for a failure.
///
/// Every failure reason names one of these so the stored text can be
/// diagnosed without access to internal logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    RepositoryValidator,
    DeploymentGateway,
    ToolDiscovery,
    ManualReview,
    Administrator,
}

impl Dependency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dependency::RepositoryValidator => "repository validator",
            Dependency::DeploymentGateway => "deployment gateway",
            Dependency::ToolDiscovery => "tool discovery",
            Dependency::ManualReview => "manual review",
            Dependency::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step failed, attributed to the collaborator that failed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub dependency: Dependency,
    pub message: String,
}

impl FailureReason {
    pub fn new(dependency: Dependency, message: impl Into<String>) -> Self {
        Self {
            dependency,
            message: message.into(),
        }
    }

    pub fn timed_out(dependency: Dependency, after: std::time::Duration) -> Self {
        Self::new(
            dependency,
            format!("timed out after {}s", after.as_secs_f64()),
        )
    }

    /// The stored, human-readable form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.trim();
        if message.is_empty() {
            write!(f, "{}: failed without a diagnostic", self.dependency)
        } else {
            write!(f, "{}: {}", self.dependency, message)
        }
    }
}
