//! Core domain concepts shared across all subdomains.
//!
//! - [`ids::ToolId`] / [`ids::OwnerId`] - identifier value objects
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod ids;
