//! Structured configuration issues.
//!
//! Config loaders report everything they find wrong in one pass as a list of
//! [`ConfigIssue`]s; the caller decides whether to abort (any `Error`) or
//! log and continue (`Warning` only).

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A required endpoint is not configured.
    MissingEndpoint { section: String },
    /// An endpoint is not an absolute http(s) URL.
    InvalidEndpoint { section: String, value: String },
    /// A timeout of zero would fail every call immediately.
    ZeroTimeout { field: String },
    /// A numeric setting is outside its usable range.
    OutOfRange { field: String, value: u64 },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_severity() {
        let err = ConfigIssue::error(
            ConfigIssueCode::ZeroTimeout { field: "gateway.timeout_secs".into() },
            "zero",
        );
        assert!(err.is_error());

        let warn = ConfigIssue::warning(
            ConfigIssueCode::MissingEndpoint { section: "discovery".into() },
            "missing",
        );
        assert!(!warn.is_error());
        assert_eq!(warn.severity, Severity::Warning);
    }
}
