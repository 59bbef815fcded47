//! Tool record repository trait
//!
//! The persisted record is the only shared mutable resource of the
//! onboarding pipeline. Writes are conditioned on the `(status, revision)`
//! the writer read before computing its change, so two executions racing
//! on the same record commit at most one transition.

use crate::core::ids::ToolId;
use crate::lifecycle::status::ToolStatus;
use crate::tool::record::ToolRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Tool record not found: {0}")]
    NotFound(ToolId),

    #[error("Tool record already exists: {0}")]
    AlreadyExists(ToolId),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Corrupt tool record {id}: {message}")]
    Corrupt { id: ToolId, message: String },
}

impl StoreError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}

/// The value read before a transition was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precondition {
    pub status: ToolStatus,
    pub revision: u64,
}

impl Precondition {
    pub fn of(record: &ToolRecord) -> Self {
        Self {
            status: record.status(),
            revision: record.revision(),
        }
    }

    pub fn matches(&self, stored: &ToolRecord) -> bool {
        stored.status() == self.status && stored.revision() == self.revision
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    /// The write was applied.
    Committed,
    /// Someone else transitioned the record first; nothing was written.
    Conflict { actual: ToolStatus, revision: u64 },
}

impl CasOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CasOutcome::Committed)
    }
}

/// Repository trait for tool records
///
/// This is a domain-level abstraction. Implementations live in the
/// infrastructure layer.
#[async_trait]
pub trait ToolRecordStore: Send + Sync {
    /// Persist a new record. Fails if the id is taken.
    async fn insert(&self, record: &ToolRecord) -> Result<(), StoreError>;

    /// Load a record by id.
    async fn load(&self, id: &ToolId) -> Result<Option<ToolRecord>, StoreError>;

    /// Replace the stored record with `record` only if the stored copy still
    /// satisfies `expected`.
    async fn compare_and_swap(
        &self,
        expected: Precondition,
        record: &ToolRecord,
    ) -> Result<CasOutcome, StoreError>;

    /// List records, optionally restricted to one status, ordered by id.
    async fn list(&self, status: Option<ToolStatus>) -> Result<Vec<ToolRecord>, StoreError>;

    /// Load a record, mapping absence to [`StoreError::NotFound`].
    async fn get(&self, id: &ToolId) -> Result<ToolRecord, StoreError> {
        self.load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
