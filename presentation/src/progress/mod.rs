//! Live progress while the driver drains its queue

pub mod reporter;
