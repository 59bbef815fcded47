//! Console output formatter for onboarding records

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use onboard_application::TransitionEvent;
use onboard_domain::{ConfigIssue, Severity, ToolRecord, ToolStatus};

/// Formats records for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete record
    pub fn format(record: &ToolRecord) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Tool {}", record.id())));
        output.push('\n');

        output.push_str(&Self::field("Status:", &Self::status(record.status()).to_string()));
        output.push_str(&Self::field("Owner:", record.owner().as_str()));
        output.push_str(&Self::field("Source:", record.source_url()));
        if let Some(service) = record.service_name() {
            output.push_str(&Self::field("Service:", service));
        }
        output.push_str(&Self::field("Revision:", &record.revision().to_string()));
        output.push_str(&Self::field(
            "Updated:",
            &record.updated_at().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ));

        if let (Some(step), Some(reason)) = (record.failed_step(), record.failure_reason()) {
            output.push_str(&Self::section_header("Failure"));
            output.push_str(&format!("  {} {}\n", "at".dimmed(), step.as_str().yellow()));
            output.push_str(&Self::indent(reason, "  "));
            output.push('\n');
        }

        if !record.discovered_operations().is_empty() {
            output.push_str(&Self::section_header("Operations"));
            for op in record.discovered_operations() {
                if op.description.is_empty() {
                    output.push_str(&format!("  * {}\n", op.name.bold()));
                } else {
                    output.push_str(&format!("  * {} {}\n", op.name.bold(), op.description.dimmed()));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// One line per record
    pub fn format_list(records: &[ToolRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No records.".dimmed());
        }

        let width = records
            .iter()
            .map(|r| r.id().as_str().len())
            .max()
            .unwrap_or(0);

        let mut output = String::new();
        for record in records {
            output.push_str(&format!(
                "{:width$}  {:<22}  {}",
                record.id().as_str(),
                Self::status(record.status()),
                record.owner(),
                width = width
            ));
            if let Some(reason) = record.failure_reason() {
                output.push_str(&format!("  {}", reason.dimmed()));
            }
            output.push('\n');
        }
        output
    }

    /// One committed transition
    pub fn format_event(event: &TransitionEvent) -> String {
        let mut line = format!(
            "{} {} {} {}",
            event.record_id.to_string().bold(),
            Self::status(event.from),
            "->".dimmed(),
            Self::status(event.to)
        );
        if event.trigger != onboard_application::TransitionTrigger::Step {
            line.push_str(&format!(" {}", format!("({})", event.trigger.as_str()).dimmed()));
        }
        if let Some(reason) = event.failure_reason.as_ref().or(event.note.as_ref()) {
            line.push_str(&format!(": {}", reason));
        }
        line
    }

    /// Configuration issues, errors first
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|issue| !issue.is_error());

        sorted
            .into_iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("{} {}\n", "error:".red().bold(), issue.message),
                Severity::Warning => format!("{} {}\n", "warning:".yellow().bold(), issue.message),
            })
            .collect()
    }

    /// One line describing a configuration source
    pub fn format_source(label: &str, location: &str, found: bool) -> String {
        let marker = if found { "found".green() } else { "not found".dimmed() };
        format!("  {:<12} {} ({})\n", label.cyan(), location, marker)
    }

    /// Status label colored by lifecycle position
    pub fn status(status: ToolStatus) -> ColoredString {
        let label = status.as_str();
        match status {
            ToolStatus::Approved => label.green().bold(),
            ToolStatus::Failed => label.red().bold(),
            ToolStatus::ManualReview => label.magenta(),
            _ => label.yellow(),
        }
    }

    fn field(name: &str, value: &str) -> String {
        format!("{:<10} {}\n", name.cyan().bold(), value)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn record(&self, record: &ToolRecord) -> String {
        Self::format(record)
    }

    fn records(&self, records: &[ToolRecord]) -> String {
        Self::format_list(records)
    }

    fn event(&self, event: &TransitionEvent) -> String {
        Self::format_event(event)
    }
}
