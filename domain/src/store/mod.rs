//! Tool record persistence contract.
//!
//! - [`repository::ToolRecordStore`] - trait for compare-and-swap persistence

pub mod repository;
