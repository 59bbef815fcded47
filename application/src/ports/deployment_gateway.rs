//! Deployment gateway port
//!
//! Hands a tool's deployment spec to the remote deployment platform.
//!
//! Deployment creates external resources, so every request carries the
//! record id as an idempotency key: re-sending the same request after a
//! crash must resolve to the same deployment instead of creating another.

use async_trait::async_trait;
use onboard_domain::ToolId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the deployment gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,
}

/// A deployment request keyed for idempotent retries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentRequest {
    pub idempotency_key: ToolId,
    pub spec: serde_json::Value,
}

impl DeploymentRequest {
    pub fn new(idempotency_key: ToolId, spec: serde_json::Value) -> Self {
        Self {
            idempotency_key,
            spec,
        }
    }
}

/// Outcome reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Succeeded,
    Rejected,
    Pending,
    #[serde(other)]
    Unknown,
}

/// The gateway's answer to a deployment request.
///
/// Only `status == Succeeded` together with a non-empty `service_name`
/// counts as a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    pub status: DeploymentStatus,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DeploymentReceipt {
    pub fn succeeded(service_name: impl Into<String>) -> Self {
        Self {
            status: DeploymentStatus::Succeeded,
            service_name: Some(service_name.into()),
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: DeploymentStatus::Rejected,
            service_name: None,
            message: Some(message.into()),
        }
    }
}

/// Gateway to the remote deployment platform
#[async_trait]
pub trait DeploymentGateway: Send + Sync {
    /// Submit a deployment and wait for the gateway's verdict.
    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReceipt, GatewayError>;
}
