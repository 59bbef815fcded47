//! Operation discovery step.

use super::{StepProcessor, StepResult, StepSuccess};
use crate::config::EmptyDiscoveryPolicy;
use crate::ports::tool_discovery::ToolDiscoveryClient;
use async_trait::async_trait;
use onboard_domain::{Dependency, FailureReason, StepEffect, ToolRecord, ToolStatus};
use std::sync::Arc;
use tracing::{debug, info};

/// Queries the deployed service for its operations and approves the tool.
///
/// An empty operation list fails the step unless the policy says otherwise.
pub struct DiscoveryProcessor<D: ToolDiscoveryClient + ?Sized> {
    client: Arc<D>,
    empty_policy: EmptyDiscoveryPolicy,
}

impl<D: ToolDiscoveryClient + ?Sized> DiscoveryProcessor<D> {
    pub fn new(client: Arc<D>) -> Self {
        Self {
            client,
            empty_policy: EmptyDiscoveryPolicy::default(),
        }
    }

    pub fn with_empty_policy(mut self, policy: EmptyDiscoveryPolicy) -> Self {
        self.empty_policy = policy;
        self
    }
}

#[async_trait]
impl<D: ToolDiscoveryClient + ?Sized + 'static> StepProcessor for DiscoveryProcessor<D> {
    fn state(&self) -> ToolStatus {
        ToolStatus::DiscoveringOperations
    }

    fn dependency(&self) -> Dependency {
        Dependency::ToolDiscovery
    }

    async fn execute(&self, record: &ToolRecord) -> StepResult {
        let service_name = record.service_name().ok_or_else(|| {
            FailureReason::new(
                Dependency::ToolDiscovery,
                "no deployed service name recorded for this tool",
            )
        })?;

        debug!(record = %record.id(), service = service_name, "Discovering operations");

        let operations = self
            .client
            .list_operations(service_name)
            .await
            .map_err(|e| FailureReason::new(Dependency::ToolDiscovery, e.to_string()))?;

        if operations.is_empty() && self.empty_policy == EmptyDiscoveryPolicy::Fail {
            return Err(FailureReason::new(
                Dependency::ToolDiscovery,
                format!("service {} reported no operations", service_name),
            ));
        }

        info!(
            record = %record.id(),
            service = service_name,
            count = operations.len(),
            "Operations discovered"
        );
        Ok(StepSuccess::to(ToolStatus::Approved)
            .with_effect(StepEffect::OperationsDiscovered(operations)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tool_discovery::DiscoveryError;
    use crate::test_support::{MockDiscovery, deployed_record, ops};

    #[tokio::test]
    async fn test_operations_approve_in_order() {
        let client = Arc::new(MockDiscovery::returning(ops(&["op1", "op2"])));
        let processor = DiscoveryProcessor::new(client.clone());

        let success = processor.execute(&deployed_record("t1", "svc-1")).await.unwrap();
        assert_eq!(success.next, ToolStatus::Approved);
        assert_eq!(success.effect, StepEffect::OperationsDiscovered(ops(&["op1", "op2"])));
        assert_eq!(client.calls(), vec!["svc-1".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_list_fails_by_default() {
        let processor = DiscoveryProcessor::new(Arc::new(MockDiscovery::returning(vec![])));
        let reason = processor.execute(&deployed_record("t1", "svc-1")).await.unwrap_err();
        assert_eq!(reason.render(), "tool discovery: service svc-1 reported no operations");
    }

    #[tokio::test]
    async fn test_empty_list_accepted_when_policy_allows() {
        let processor = DiscoveryProcessor::new(Arc::new(MockDiscovery::returning(vec![])))
            .with_empty_policy(EmptyDiscoveryPolicy::Accept);
        let success = processor.execute(&deployed_record("t1", "svc-1")).await.unwrap();
        assert_eq!(success.effect, StepEffect::OperationsDiscovered(vec![]));
    }

    #[tokio::test]
    async fn test_unreachable_is_distinct_failure() {
        let processor = DiscoveryProcessor::new(Arc::new(MockDiscovery::failing(
            DiscoveryError::ServiceUnreachable("dns lookup failed".into()),
        )));
        let reason = processor.execute(&deployed_record("t1", "svc-1")).await.unwrap_err();
        assert_eq!(
            reason.render(),
            "tool discovery: service unreachable: dns lookup failed"
        );
    }

    #[tokio::test]
    async fn test_missing_service_name_fails_without_call() {
        let client = Arc::new(MockDiscovery::returning(ops(&["op1"])));
        let processor = DiscoveryProcessor::new(client.clone());

        let mut record = ToolRecord::new("t1", "alice", "good", serde_json::json!({}));
        record.force(ToolStatus::DiscoveringOperations, "").unwrap();

        assert!(processor.execute(&record).await.is_err());
        assert!(client.calls().is_empty());
    }
}
