//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod admin_override;
pub mod driver;
pub mod engine;
pub mod onboarding_service;
