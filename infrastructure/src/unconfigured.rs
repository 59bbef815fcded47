//! Stand-in for a collaborator whose endpoint is not configured.
//!
//! Lets administrative commands run without every endpoint set. A record
//! that reaches a step backed by this adapter fails with a reason naming
//! the missing config section.

use async_trait::async_trait;
use onboard_application::{
    DeploymentGateway, DeploymentReceipt, DeploymentRequest, DiscoveryError, GatewayError,
    RepositoryValidator, ToolDiscoveryClient, ValidatorError,
};
use onboard_domain::OperationDescriptor;

#[derive(Debug, Clone)]
pub struct UnconfiguredCollaborator {
    section: &'static str,
}

impl UnconfiguredCollaborator {
    pub fn new(section: &'static str) -> Self {
        Self { section }
    }

    fn detail(&self) -> String {
        format!("no endpoint configured in [{}]", self.section)
    }
}

#[async_trait]
impl RepositoryValidator for UnconfiguredCollaborator {
    async fn validate(&self, _source_url: &str) -> Result<(), ValidatorError> {
        Err(ValidatorError::Unreachable(self.detail()))
    }
}

#[async_trait]
impl DeploymentGateway for UnconfiguredCollaborator {
    async fn deploy(&self, _request: &DeploymentRequest) -> Result<DeploymentReceipt, GatewayError> {
        Err(GatewayError::ConnectionError(self.detail()))
    }
}

#[async_trait]
impl ToolDiscoveryClient for UnconfiguredCollaborator {
    async fn list_operations(&self, _service_name: &str) -> Result<Vec<OperationDescriptor>, DiscoveryError> {
        Err(DiscoveryError::ServiceUnreachable(self.detail()))
    }
}
