//! Tool integration domain.
//!
//! - [`record::ToolRecord`] - the unit of work moved through onboarding
//! - [`record::StepEffect`] - record changes committed together with a step
//! - [`operation::OperationDescriptor`] - an operation reported by discovery

pub mod operation;
pub mod record;
