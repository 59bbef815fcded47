//! Infrastructure layer for tool-onboard
//!
//! This crate contains adapters that implement the domain and application
//! ports: record stores, HTTP clients for the remote collaborators, the
//! transition audit log, and configuration file loading.

pub mod config;
#[cfg(feature = "http-adapters")]
pub mod http;
pub mod logging;
pub mod store;
pub mod unconfigured;

pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, FileConfig, FileDiscoveryConfig,
    FileDriverConfig, FileEventsConfig, FileGatewayConfig, FileStoreConfig, FileValidatorConfig,
};
#[cfg(feature = "http-adapters")]
pub use http::{HttpDeploymentGateway, HttpRepositoryValidator, HttpToolDiscoveryClient};
pub use logging::JsonlTransitionLogger;
pub use store::{InMemoryToolRecordStore, JsonFileToolRecordStore};
pub use unconfigured::UnconfiguredCollaborator;
