//! Presentation layer for tool-onboard
//!
//! This crate contains CLI definitions, output formatters
//! and the live progress reporter used while the queue drains.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat, SpecSource, SubmitArgs};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::formatter_for;
pub use output::json::JsonFormatter;
pub use progress::reporter::ProgressReporter;
