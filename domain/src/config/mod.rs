//! Domain-level configuration vocabulary.

pub mod validation;

pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
