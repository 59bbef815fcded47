//! Domain layer for tool-onboard
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tool Record
//!
//! A [`ToolRecord`] is a user-submitted integration with an external tool
//! service. It moves through the onboarding lifecycle:
//!
//! - **Automatic states**: `SUBMITTED`, `VALIDATING_SOURCE`, `DEPLOYING`,
//!   `DISCOVERING_OPERATIONS`, each advanced by one step processor
//! - **Manual review**: suspended until an administrator decides
//! - **Terminal states**: `APPROVED`, `FAILED` (the latter resubmittable)
//!
//! ## Compare-and-swap persistence
//!
//! [`ToolRecordStore`] only commits a write when the stored record still
//! matches the [`Precondition`] read before the change was computed.

pub mod config;
pub mod core;
pub mod lifecycle;
pub mod store;
pub mod tool;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use core::{
    error::DomainError,
    ids::{OwnerId, ToolId},
};
pub use lifecycle::{
    failure::{Dependency, FailureReason},
    status::ToolStatus,
};
pub use store::repository::{CasOutcome, Precondition, StoreError, ToolRecordStore};
pub use tool::{
    operation::OperationDescriptor,
    record::{StepEffect, ToolRecord},
};
