//! Tool record stores.
//!
//! Both implementations honor the compare-and-swap contract of
//! [`ToolRecordStore`](onboard_domain::ToolRecordStore).

mod json_file;
mod memory;

pub use json_file::JsonFileToolRecordStore;
pub use memory::InMemoryToolRecordStore;
