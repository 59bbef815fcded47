//! Static mapping from automatic state to its step processor.
//!
//! Built once at startup and shared read-only. Building checks that every
//! automatic state has exactly one processor, so a misconfiguration is
//! caught before any record is touched.

use super::{DeploymentProcessor, DiscoveryProcessor, SourceValidationProcessor, StepProcessor};
use crate::config::EngineParams;
use crate::ports::deployment_gateway::DeploymentGateway;
use crate::ports::repository_validator::RepositoryValidator;
use crate::ports::tool_discovery::ToolDiscoveryClient;
use onboard_domain::ToolStatus;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors detected while building a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No step processor registered for {0}")]
    MissingProcessor(ToolStatus),

    #[error("Two step processors registered for {0}")]
    DuplicateProcessor(ToolStatus),

    #[error("{0} is not an automatic state and cannot have a step processor")]
    NotAutomatic(ToolStatus),
}

/// Immutable map `ToolStatus -> StepProcessor`.
pub struct ProcessorRegistry {
    processors: HashMap<ToolStatus, Arc<dyn StepProcessor>>,
}

impl ProcessorRegistry {
    pub fn builder() -> ProcessorRegistryBuilder {
        ProcessorRegistryBuilder::default()
    }

    /// The standard pipeline wired to the three external collaborators.
    pub fn standard<V, G, D>(
        validator: Arc<V>,
        gateway: Arc<G>,
        discovery: Arc<D>,
        params: &EngineParams,
    ) -> Result<Self, RegistryError>
    where
        V: RepositoryValidator + ?Sized + 'static,
        G: DeploymentGateway + ?Sized + 'static,
        D: ToolDiscoveryClient + ?Sized + 'static,
    {
        Self::builder()
            .register(SourceValidationProcessor::for_submitted(Arc::clone(&validator)))
            .register(SourceValidationProcessor::for_validating_source(validator))
            .register(DeploymentProcessor::new(gateway))
            .register(DiscoveryProcessor::new(discovery).with_empty_policy(params.empty_discovery))
            .build()
    }

    /// Processor bound to `state`, if any.
    pub fn get(&self, state: ToolStatus) -> Option<Arc<dyn StepProcessor>> {
        self.processors.get(&state).cloned()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

/// Builder for [`ProcessorRegistry`].
#[derive(Default)]
pub struct ProcessorRegistryBuilder {
    processors: Vec<Arc<dyn StepProcessor>>,
}

impl ProcessorRegistryBuilder {
    pub fn register(mut self, processor: impl StepProcessor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn register_arc(mut self, processor: Arc<dyn StepProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Build, requiring exactly one processor for every automatic state.
    pub fn build(self) -> Result<ProcessorRegistry, RegistryError> {
        let registry = self.build_unchecked()?;
        for state in ToolStatus::AUTOMATIC {
            if !registry.processors.contains_key(&state) {
                return Err(RegistryError::MissingProcessor(state));
            }
        }
        Ok(registry)
    }

    /// Build without the completeness check.
    ///
    /// Advancing a record whose state has no processor then fails with a
    /// fatal engine error instead.
    pub fn build_unchecked(self) -> Result<ProcessorRegistry, RegistryError> {
        let mut processors = HashMap::new();
        for processor in self.processors {
            let state = processor.state();
            if !state.is_automatic() {
                return Err(RegistryError::NotAutomatic(state));
            }
            if processors.insert(state, processor).is_some() {
                return Err(RegistryError::DuplicateProcessor(state));
            }
        }
        Ok(ProcessorRegistry { processors })
    }
}
