//! Onboarding lifecycle.
//!
//! - [`status::ToolStatus`] - the seven lifecycle states and the legal edges
//! - [`failure::FailureReason`] - diagnostics attributed to a [`failure::Dependency`]

pub mod failure;
pub mod status;
