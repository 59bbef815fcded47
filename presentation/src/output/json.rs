//! JSON output

use super::formatter::OutputFormatter;
use onboard_application::TransitionEvent;
use onboard_domain::ToolRecord;
use serde::Serialize;

/// Formats results as pretty-printed JSON; events as single lines.
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn record(&self, record: &ToolRecord) -> String {
        Self::pretty(record)
    }

    fn records(&self, records: &[ToolRecord]) -> String {
        Self::pretty(records)
    }

    fn event(&self, event: &TransitionEvent) -> String {
        serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_application::TransitionTrigger;
    use onboard_domain::ToolStatus;
    use serde_json::{Value, json};

    #[test]
    fn test_record_fields_are_exposed() {
        let record = ToolRecord::new("t1", "alice", "https://git.example.com/a", json!({"image": "a"}));
        let value: Value = serde_json::from_str(&JsonFormatter.record(&record)).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["status"], "SUBMITTED");
        assert_eq!(value["deployment_spec"]["image"], "a");
    }

    #[test]
    fn test_event_is_one_line() {
        let mut record = ToolRecord::new("t1", "alice", "u", json!({}));
        record.fail("repository validator: bad").unwrap();
        let event = TransitionEvent::for_commit(ToolStatus::Submitted, &record, TransitionTrigger::Step)
            .remove(0);

        let line = JsonFormatter.event(&event);
        assert!(!line.contains('\n'));
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["to"], "FAILED");
        assert_eq!(value["failure_reason"], "repository validator: bad");
    }
}
