//! JSON-file record store.
//!
//! One pretty-printed JSON document per record under a directory. Writes go
//! to a uniquely named temporary sibling file which is then renamed over the
//! target, so a reader never sees a half-written record.
//!
//! Inserts and compare-and-swap hold an exclusive advisory lock on
//! `<stem>.lock` for the whole read-check-rename, so several store handles
//! and several processes may share one directory.

use async_trait::async_trait;
use fd_lock::RwLock;
use onboard_domain::{
    CasOutcome, Precondition, StoreError, ToolId, ToolRecord, ToolRecordStore, ToolStatus,
};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "lock";

/// File-backed [`ToolRecordStore`].
pub struct JsonFileToolRecordStore {
    dir: PathBuf,
}

impl JsonFileToolRecordStore {
    /// Open (and create if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(io_error)?;
        debug!("Record store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ToolId) -> PathBuf {
        self.dir.join(format!("{}.{}", file_stem(id), EXTENSION))
    }

    fn lock_path_for(&self, id: &ToolId) -> PathBuf {
        self.dir.join(format!("{}.{}", file_stem(id), LOCK_EXTENSION))
    }

    async fn read(&self, id: &ToolId, path: &Path) -> Result<Option<ToolRecord>, StoreError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };
        decode(id, &bytes).map(Some)
    }

    /// Run `f` on a blocking thread while holding the record's lock file.
    async fn with_record_lock<T, F>(&self, id: &ToolId, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let lock_path = self.lock_path_for(id);
        let path = self.path_for(id);

        tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(io_error)?;
            let mut lock = RwLock::new(file);
            let _guard = lock.write().map_err(io_error)?;
            f(&path)
        })
        .await
        .map_err(|e| StoreError::Io(format!("store task failed: {}", e)))?
    }
}

#[async_trait]
impl ToolRecordStore for JsonFileToolRecordStore {
    async fn insert(&self, record: &ToolRecord) -> Result<(), StoreError> {
        let id = record.id().clone();
        let record = record.clone();
        self.with_record_lock(&id, move |path| {
            if path.exists() {
                return Err(StoreError::AlreadyExists(record.id().clone()));
            }
            write_atomic(path, &record)
        })
        .await
    }

    async fn load(&self, id: &ToolId) -> Result<Option<ToolRecord>, StoreError> {
        self.read(id, &self.path_for(id)).await
    }

    async fn compare_and_swap(
        &self,
        expected: Precondition,
        record: &ToolRecord,
    ) -> Result<CasOutcome, StoreError> {
        let id = record.id().clone();
        let record = record.clone();
        self.with_record_lock(&id, move |path| {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(StoreError::NotFound(record.id().clone()));
                }
                Err(e) => return Err(io_error(e)),
            };
            let stored = decode(record.id(), &bytes)?;

            if !expected.matches(&stored) {
                return Ok(CasOutcome::Conflict {
                    actual: stored.status(),
                    revision: stored.revision(),
                });
            }
            write_atomic(path, &record)?;
            Ok(CasOutcome::Committed)
        })
        .await
    }

    async fn list(&self, status: Option<ToolStatus>) -> Result<Vec<ToolRecord>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(io_error)?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match self.read(&ToolId::new(stem), &path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(StoreError::Corrupt { id, message }) => {
                    warn!("Skipping unreadable record file {} ({}): {}", path.display(), id, message);
                }
                Err(e) => return Err(e),
            }
        }

        records.retain(|r| status.is_none_or(|s| r.status() == s));
        records.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(records)
    }
}

fn decode(id: &ToolId, bytes: &[u8]) -> Result<ToolRecord, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        id: id.clone(),
        message: e.to_string(),
    })
}

/// Write `record` to `path` through a temp file unique to this writer.
fn write_atomic(path: &Path, record: &ToolRecord) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(record).map_err(|e| StoreError::Corrupt {
        id: record.id().clone(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));

    std::fs::write(&tmp, json).map_err(io_error)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_error(e));
    }
    Ok(())
}

/// File name for an id: safe characters pass through, everything else is
/// percent-encoded.
fn file_stem(id: &ToolId) -> String {
    let mut stem = String::with_capacity(id.as_str().len());
    for (i, byte) in id.as_str().bytes().enumerate() {
        let safe = byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || (byte == b'.' && i > 0);
        if safe {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}
