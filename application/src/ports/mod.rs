//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod deployment_gateway;
pub mod repository_validator;
pub mod tool_discovery;
pub mod transition_events;
