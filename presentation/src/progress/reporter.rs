//! Progress reporting for queue draining

use crate::output::formatter::OutputFormatter;
use indicatif::{ProgressBar, ProgressStyle};
use onboard_application::TransitionEvent;
use onboard_domain::ToolStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Prints each transition above a spinner and tallies outcomes.
pub struct ProgressReporter {
    bar: ProgressBar,
    formatter: Box<dyn OutputFormatter>,
    transitions: AtomicUsize,
    approved: AtomicUsize,
    failed: AtomicUsize,
}

impl ProgressReporter {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message("Waiting for work...");
        Self::with_bar(bar, formatter)
    }

    /// No terminal output; counts only.
    pub fn hidden(formatter: Box<dyn OutputFormatter>) -> Self {
        Self::with_bar(ProgressBar::hidden(), formatter)
    }

    fn with_bar(bar: ProgressBar, formatter: Box<dyn OutputFormatter>) -> Self {
        Self {
            bar,
            formatter,
            transitions: AtomicUsize::new(0),
            approved: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn on_event(&self, event: &TransitionEvent) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
        match event.to {
            ToolStatus::Approved => {
                self.approved.fetch_add(1, Ordering::Relaxed);
            }
            ToolStatus::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        self.bar.println(self.formatter.event(event));
        self.bar
            .set_message(format!("{} {}", event.record_id, event.to.as_str()));
    }

    /// Consume events until the bus closes.
    pub fn spawn(self: Arc<Self>, mut rx: broadcast::Receiver<TransitionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => self.on_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        self.bar
                            .println(format!("... {} transitions not shown", skipped));
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// `(transitions, approved, failed)` seen so far.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.transitions.load(Ordering::Relaxed),
            self.approved.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }

    /// Clear the spinner and return a one-line summary.
    pub fn finish(&self) -> String {
        self.bar.finish_and_clear();
        let (transitions, approved, failed) = self.counts();
        format!(
            "{} transitions, {} approved, {} failed",
            transitions, approved, failed
        )
    }
}
