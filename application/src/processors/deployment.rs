//! Deployment step.

use super::{StepProcessor, StepResult, StepSuccess};
use crate::ports::deployment_gateway::{DeploymentGateway, DeploymentRequest, DeploymentStatus};
use async_trait::async_trait;
use onboard_domain::{Dependency, FailureReason, StepEffect, ToolRecord, ToolStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Submits the deployment spec and moves the record to
/// `DISCOVERING_OPERATIONS` once the gateway explicitly reports success.
///
/// The record id is sent as the idempotency key, so re-running this step
/// after a crash resolves to the deployment created by the first run.
pub struct DeploymentProcessor<G: DeploymentGateway + ?Sized> {
    gateway: Arc<G>,
}

impl<G: DeploymentGateway + ?Sized> DeploymentProcessor<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: DeploymentGateway + ?Sized + 'static> StepProcessor for DeploymentProcessor<G> {
    fn state(&self) -> ToolStatus {
        ToolStatus::Deploying
    }

    fn dependency(&self) -> Dependency {
        Dependency::DeploymentGateway
    }

    async fn execute(&self, record: &ToolRecord) -> StepResult {
        let request = DeploymentRequest::new(record.id().clone(), record.deployment_spec().clone());
        debug!(record = %record.id(), "Submitting deployment");

        let receipt = self
            .gateway
            .deploy(&request)
            .await
            .map_err(|e| FailureReason::new(Dependency::DeploymentGateway, e.to_string()))?;

        let detail = receipt.message.as_deref().unwrap_or("no detail given");
        match receipt.status {
            DeploymentStatus::Succeeded => {}
            DeploymentStatus::Rejected => {
                return Err(FailureReason::new(
                    Dependency::DeploymentGateway,
                    format!("deployment rejected: {}", detail),
                ));
            }
            DeploymentStatus::Pending | DeploymentStatus::Unknown => {
                warn!(record = %record.id(), status = ?receipt.status, "Deployment did not report success");
                return Err(FailureReason::new(
                    Dependency::DeploymentGateway,
                    format!("deployment did not report success ({:?}): {}", receipt.status, detail),
                ));
            }
        }

        let service_name = receipt
            .service_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                FailureReason::new(
                    Dependency::DeploymentGateway,
                    "deployment reported success without a service name",
                )
            })?;

        info!(record = %record.id(), service = %service_name, "Deployment succeeded");
        Ok(StepSuccess::to(ToolStatus::DiscoveringOperations)
            .with_effect(StepEffect::Deployed { service_name }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::deployment_gateway::{DeploymentReceipt, GatewayError};
    use crate::test_support::MockGateway;

    fn record() -> ToolRecord {
        ToolRecord::new("t1", "alice", "good", serde_json::json!({"image": "acme/tool:1"}))
    }

    #[tokio::test]
    async fn test_success_declares_discovery_and_service_name() {
        let gateway = Arc::new(MockGateway::succeeding("svc-1"));
        let processor = DeploymentProcessor::new(gateway.clone());

        let success = processor.execute(&record()).await.unwrap();
        assert_eq!(success.next, ToolStatus::DiscoveringOperations);
        assert_eq!(
            success.effect,
            StepEffect::Deployed { service_name: "svc-1".into() }
        );

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].idempotency_key.as_str(), "t1");
        assert_eq!(requests[0].spec["image"], "acme/tool:1");
    }

    #[tokio::test]
    async fn test_repeated_execution_reuses_idempotency_key() {
        let gateway = Arc::new(MockGateway::succeeding("svc-1"));
        let processor = DeploymentProcessor::new(gateway.clone());

        processor.execute(&record()).await.unwrap();
        processor.execute(&record()).await.unwrap();

        let keys: Vec<_> = gateway.requests().into_iter().map(|r| r.idempotency_key).collect();
        assert_eq!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn test_missing_success_signal_is_failure() {
        let receipt = DeploymentReceipt {
            status: DeploymentStatus::Pending,
            service_name: Some("svc-1".into()),
            message: None,
        };
        let processor = DeploymentProcessor::new(Arc::new(MockGateway::with_receipt(receipt)));

        let reason = processor.execute(&record()).await.unwrap_err();
        assert_eq!(reason.dependency, Dependency::DeploymentGateway);
        assert!(reason.message.contains("did not report success"));
    }

    #[tokio::test]
    async fn test_success_without_service_name_is_failure() {
        let receipt = DeploymentReceipt {
            status: DeploymentStatus::Succeeded,
            service_name: Some("  ".into()),
            message: None,
        };
        let processor = DeploymentProcessor::new(Arc::new(MockGateway::with_receipt(receipt)));
        assert!(processor.execute(&record()).await.is_err());
    }

    #[tokio::test]
    async fn test_rejection_and_transport_errors() {
        let processor = DeploymentProcessor::new(Arc::new(MockGateway::with_receipt(
            DeploymentReceipt::rejected("policy: privileged container"),
        )));
        let reason = processor.execute(&record()).await.unwrap_err();
        assert_eq!(
            reason.render(),
            "deployment gateway: deployment rejected: policy: privileged container"
        );

        let processor = DeploymentProcessor::new(Arc::new(MockGateway::failing(
            GatewayError::ConnectionError("connection refused".into()),
        )));
        let reason = processor.execute(&record()).await.unwrap_err();
        assert_eq!(
            reason.render(),
            "deployment gateway: Connection error: connection refused"
        );
    }
}
