//! External collaborator configuration (`[validator]`, `[gateway]`, `[discovery]`)

use onboard_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[validator]` section.
///
/// ```toml
/// [validator]
/// endpoint = "https://validator.internal/api/v1"
/// timeout_secs = 15
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileValidatorConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileValidatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 15,
        }
    }
}

/// Raw `[gateway]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 120,
        }
    }
}

/// Raw `[discovery]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiscoveryConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    /// Treat an empty operation list as success.
    pub allow_empty: bool,
}

impl Default for FileDiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
            allow_empty: false,
        }
    }
}

macro_rules! collaborator_section {
    ($ty:ty, $section:literal) => {
        impl $ty {
            pub const SECTION: &'static str = $section;

            pub fn timeout(&self) -> Duration {
                Duration::from_secs(self.timeout_secs)
            }

            /// The configured endpoint with surrounding whitespace and a
            /// trailing slash removed.
            pub fn endpoint(&self) -> Option<&str> {
                self.endpoint
                    .as_deref()
                    .map(|e| e.trim().trim_end_matches('/'))
                    .filter(|e| !e.is_empty())
            }

            pub fn validate(&self) -> Vec<ConfigIssue> {
                let mut issues = Vec::new();
                check_endpoint(Self::SECTION, self.endpoint.as_deref(), &mut issues);
                if self.timeout_secs == 0 {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::ZeroTimeout {
                            field: format!("{}.timeout_secs", Self::SECTION),
                        },
                        format!(
                            "{}.timeout_secs: 0 would fail every call immediately",
                            Self::SECTION
                        ),
                    ));
                }
                issues
            }
        }
    };
}

collaborator_section!(FileValidatorConfig, "validator");
collaborator_section!(FileGatewayConfig, "gateway");
collaborator_section!(FileDiscoveryConfig, "discovery");

fn check_endpoint(section: &str, endpoint: Option<&str>, issues: &mut Vec<ConfigIssue>) {
    let Some(raw) = endpoint.map(str::trim).filter(|e| !e.is_empty()) else {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::MissingEndpoint {
                section: section.to_string(),
            },
            format!(
                "[{}] has no endpoint; records reaching this step will fail",
                section
            ),
        ));
        return;
    };

    let host = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"));
    if host.is_none_or(|h| h.is_empty() || h.starts_with('/')) {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::InvalidEndpoint {
                section: section.to_string(),
                value: raw.to_string(),
            },
            format!(
                "{}.endpoint: '{}' is not an absolute http(s) URL",
                section, raw
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(FileValidatorConfig::default().timeout(), Duration::from_secs(15));
        assert_eq!(FileGatewayConfig::default().timeout(), Duration::from_secs(120));
        let discovery = FileDiscoveryConfig::default();
        assert_eq!(discovery.timeout(), Duration::from_secs(30));
        assert!(!discovery.allow_empty);
    }

    #[test]
    fn test_missing_endpoint_is_warning() {
        let issues = FileGatewayConfig::default().validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
        assert_eq!(
            issues[0].code,
            ConfigIssueCode::MissingEndpoint { section: "gateway".into() }
        );
    }

    #[test]
    fn test_malformed_endpoint_is_error() {
        for bad in ["gateway.internal", "ftp://gateway", "https://", "http:///path"] {
            let config = FileGatewayConfig {
                endpoint: Some(bad.into()),
                ..Default::default()
            };
            let issues = config.validate();
            assert!(issues.iter().any(|i| i.is_error()), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let config = FileValidatorConfig {
            endpoint: Some("https://validator.internal".into()),
            timeout_secs: 0,
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].code,
            ConfigIssueCode::ZeroTimeout { field: "validator.timeout_secs".into() }
        );
    }

    #[test]
    fn test_endpoint_normalized() {
        let config = FileDiscoveryConfig {
            endpoint: Some(" https://discovery.internal/ ".into()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), Some("https://discovery.internal"));
        assert!(config.validate().is_empty());
    }
}
