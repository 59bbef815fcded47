//! Application-level configuration.
//!
//! - [`EngineParams`] - per-step timeouts and the empty-discovery policy
//! - [`DriverParams`] - worker pool size, queue bound and store retries

pub mod driver_params;
pub mod engine_params;

pub use driver_params::DriverParams;
pub use engine_params::{EmptyDiscoveryPolicy, EngineParams};
