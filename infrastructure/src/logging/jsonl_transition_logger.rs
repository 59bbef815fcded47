//! JSONL file writer for transition events.
//!
//! Each [`TransitionEvent`] is serialized as a single JSON line with a
//! `type` field and `timestamp`, appended to the file via a buffered writer.

use onboard_application::TransitionEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

/// Append-only transition audit log, one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and
/// on `Drop`.
pub struct JsonlTransitionLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTransitionLogger {
    /// Open the log at the given path for appending.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create transition log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open transition log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, event: &TransitionEvent) {
        let mut record = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return,
        };
        record.insert("type".to_string(), "transition".into());
        record.insert("timestamp".to_string(), timestamp().into());
        self.write_line(&serde_json::Value::Object(record));
    }

    /// Record that `skipped` events were dropped because this subscriber
    /// fell behind.
    pub fn log_gap(&self, skipped: u64) {
        self.write_line(&serde_json::json!({
            "type": "gap",
            "timestamp": timestamp(),
            "skipped": skipped,
        }));
    }

    /// Consume events from `receiver` until the bus closes.
    pub fn spawn(self: Arc<Self>, mut receiver: broadcast::Receiver<TransitionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => self.log(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Transition log fell behind");
                        self.log_gap(skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn write_line(&self, value: &serde_json::Value) {
        let Ok(line) = serde_json::to_string(value) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlTransitionLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
