//! Application layer for tool-onboard
//!
//! This crate contains the step processors, the engine and driver that run
//! them, administrative use cases, and the ports to external collaborators.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod processors;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{DriverParams, EmptyDiscoveryPolicy, EngineParams};
pub use ports::{
    deployment_gateway::{
        DeploymentGateway, DeploymentReceipt, DeploymentRequest, DeploymentStatus, GatewayError,
    },
    repository_validator::{RepositoryValidator, ValidatorError},
    tool_discovery::{DiscoveryError, ToolDiscoveryClient},
    transition_events::{TransitionBus, TransitionEvent, TransitionTrigger},
};
pub use processors::{
    ProcessorRegistry, RegistryError, StepProcessor, StepResult, StepSuccess,
};
pub use use_cases::admin_override::{AdminError, AdminOverrideHandler};
pub use use_cases::driver::{DriverError, OrchestrationDriver};
pub use use_cases::engine::{AdvanceOutcome, EngineError, OnboardingEngine};
pub use use_cases::onboarding_service::{OnboardingService, ServiceError, SubmitToolInput};
