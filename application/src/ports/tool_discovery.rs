//! Tool discovery port
//!
//! Lists the operations a deployed tool service exposes.

use async_trait::async_trait;
use onboard_domain::OperationDescriptor;
use thiserror::Error;

/// Errors that can occur during discovery
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The service could not be reached at all. Distinct from a reachable
    /// service that reports zero operations.
    #[error("service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid discovery response: {0}")]
    InvalidResponse(String),

    #[error("request timed out")]
    Timeout,
}

/// Client for the tool-discovery endpoint
#[async_trait]
pub trait ToolDiscoveryClient: Send + Sync {
    /// List the operations exposed by `service_name`, in the order reported.
    async fn list_operations(&self, service_name: &str) -> Result<Vec<OperationDescriptor>, DiscoveryError>;
}
