//! Configuration file loading for tool-onboard
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ONBOARD_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./onboard.toml` or `./.onboard.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tool-onboard/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDiscoveryConfig, FileDriverConfig, FileEventsConfig,
    FileGatewayConfig, FileStoreConfig, FileValidatorConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
