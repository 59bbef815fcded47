//! Orchestration driver configuration from TOML (`[driver]` section)

use onboard_application::DriverParams;
use onboard_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[driver]` section.
///
/// ```toml
/// [driver]
/// workers = 4
/// queue_capacity = 256
/// retry_delay_ms = 500
/// max_store_retries = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDriverConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub retry_delay_ms: u64,
    pub max_store_retries: u32,
}

impl Default for FileDriverConfig {
    fn default() -> Self {
        let params = DriverParams::default();
        Self {
            workers: params.workers,
            queue_capacity: params.queue_capacity,
            retry_delay_ms: params.retry_delay.as_millis() as u64,
            max_store_retries: params.max_store_retries,
        }
    }
}

impl FileDriverConfig {
    /// Convert to [`DriverParams`], returning validation issues.
    ///
    /// Zero workers or a zero queue bound fall back to the defaults.
    pub fn to_driver_params(&self) -> (DriverParams, Vec<ConfigIssue>) {
        let defaults = DriverParams::default();
        let mut issues = Vec::new();

        let workers = if self.workers == 0 {
            issues.push(out_of_range("driver.workers", 0, defaults.workers));
            defaults.workers
        } else {
            self.workers
        };
        let queue_capacity = if self.queue_capacity == 0 {
            issues.push(out_of_range("driver.queue_capacity", 0, defaults.queue_capacity));
            defaults.queue_capacity
        } else {
            self.queue_capacity
        };

        let params = DriverParams {
            workers,
            queue_capacity,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_store_retries: self.max_store_retries,
        };
        (params, issues)
    }
}

fn out_of_range(field: &str, value: u64, fallback: usize) -> ConfigIssue {
    ConfigIssue::warning(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
            value,
        },
        format!("{}: {} is not usable, falling back to {}", field, value, fallback),
    )
}
