//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application parameters.

mod collaborators;
mod driver;
mod storage;

pub use collaborators::{FileDiscoveryConfig, FileGatewayConfig, FileValidatorConfig};
pub use driver::FileDriverConfig;
pub use storage::{FileEventsConfig, FileStoreConfig};

use onboard_application::{DriverParams, EmptyDiscoveryPolicy, EngineParams};
use onboard_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort startup
#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Config file not found: {}", .0.display())]
    MissingFile(std::path::PathBuf),

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Repository validator client
    pub validator: FileValidatorConfig,
    /// Deployment gateway client
    pub gateway: FileGatewayConfig,
    /// Tool discovery client
    pub discovery: FileDiscoveryConfig,
    /// Worker pool and store retries
    pub driver: FileDriverConfig,
    /// Record persistence
    pub store: FileStoreConfig,
    /// Transition audit log
    pub events: FileEventsConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.validator.validate());
        issues.extend(self.gateway.validate());
        issues.extend(self.discovery.validate());
        issues.extend(self.driver.to_driver_params().1);
        issues
    }

    /// Split issues into warnings (returned) and errors (aborting).
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(ConfigIssue::is_error);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError::Invalid(
                errors.into_iter().map(|issue| issue.message).collect(),
            ))
        }
    }

    pub fn to_engine_params(&self) -> EngineParams {
        let empty_discovery = if self.discovery.allow_empty {
            EmptyDiscoveryPolicy::Accept
        } else {
            EmptyDiscoveryPolicy::Fail
        };
        EngineParams::default()
            .with_validation_timeout(self.validator.timeout())
            .with_deployment_timeout(self.gateway.timeout())
            .with_discovery_timeout(self.discovery.timeout())
            .with_empty_discovery(empty_discovery)
    }

    pub fn to_driver_params(&self) -> DriverParams {
        self.driver.to_driver_params().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[validator]
endpoint = "https://validator.internal"
timeout_secs = 5

[gateway]
endpoint = "https://deploy.internal"
timeout_secs = 300

[discovery]
endpoint = "http://discovery.internal:8080"
allow_empty = true

[driver]
workers = 8
retry_delay_ms = 250

[store]
dir = "/var/lib/tool-onboard"

[events]
log_path = "/var/log/tool-onboard/transitions.jsonl"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validator.timeout_secs, 5);
        assert_eq!(config.gateway.timeout_secs, 300);
        assert_eq!(config.discovery.timeout_secs, 30);
        assert!(config.discovery.allow_empty);
        assert_eq!(config.driver.workers, 8);
        assert_eq!(config.driver.queue_capacity, 256);
        assert_eq!(config.store.dir, PathBuf::from("/var/lib/tool-onboard"));
        assert!(config.events.log_path.is_some());
        assert!(config.validate().is_empty());

        let params = config.to_engine_params();
        assert_eq!(params.validation_timeout, Duration::from_secs(5));
        assert_eq!(params.deployment_timeout, Duration::from_secs(300));
        assert_eq!(params.empty_discovery, EmptyDiscoveryPolicy::Accept);
        assert_eq!(config.to_driver_params().retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[gateway]\ntimeout_secs = 60\n").unwrap();
        assert_eq!(config.gateway.timeout_secs, 60);
        assert_eq!(config.validator, FileValidatorConfig::default());
        assert_eq!(config.to_engine_params().empty_discovery, EmptyDiscoveryPolicy::Fail);
    }

    #[test]
    fn test_default_config_only_warns() {
        let config = FileConfig::default();
        let warnings = config.check().unwrap();
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_check_collects_errors() {
        let mut config = FileConfig::default();
        config.gateway.timeout_secs = 0;
        config.validator.endpoint = Some("not a url".into());

        match config.check() {
            Err(ConfigValidationError::Invalid(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("expected invalid config, got {:?}", other),
        }
    }
}
