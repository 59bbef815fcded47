//! Output formatter trait

use onboard_application::TransitionEvent;
use onboard_domain::ToolRecord;

/// Trait for formatting records and transition events
pub trait OutputFormatter: Send + Sync {
    /// Format a single record in full
    fn record(&self, record: &ToolRecord) -> String;

    /// Format a list of records
    fn records(&self, records: &[ToolRecord]) -> String;

    /// Format a single committed transition
    fn event(&self, event: &TransitionEvent) -> String;
}
