//! Persistence and audit configuration (`[store]`, `[events]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw `[store]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Directory holding one JSON file per tool record.
    pub dir: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".onboard/records"),
        }
    }
}

/// Raw `[events]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEventsConfig {
    /// Append every committed transition to this JSONL file.
    pub log_path: Option<PathBuf>,
}
