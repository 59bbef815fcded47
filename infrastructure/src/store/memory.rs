//! In-memory record store.

use async_trait::async_trait;
use onboard_domain::{
    CasOutcome, Precondition, StoreError, ToolId, ToolRecord, ToolRecordStore, ToolStatus,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local store for tests and single-run pipelines.
///
/// The write lock is held across the precondition check and the write, so
/// compare-and-swap is atomic within the process.
#[derive(Debug, Default)]
pub struct InMemoryToolRecordStore {
    records: RwLock<BTreeMap<ToolId, ToolRecord>>,
}

impl InMemoryToolRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ToolRecordStore for InMemoryToolRecordStore {
    async fn insert(&self, record: &ToolRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists(record.id().clone()));
        }
        records.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn load(&self, id: &ToolId) -> Result<Option<ToolRecord>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected: Precondition,
        record: &ToolRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut records = self.records.write().await;
        let Some(stored) = records.get_mut(record.id()) else {
            return Err(StoreError::NotFound(record.id().clone()));
        };
        if !expected.matches(stored) {
            return Ok(CasOutcome::Conflict {
                actual: stored.status(),
                revision: stored.revision(),
            });
        }
        *stored = record.clone();
        Ok(CasOutcome::Committed)
    }

    async fn list(&self, status: Option<ToolStatus>) -> Result<Vec<ToolRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| status.is_none_or(|s| r.status() == s))
            .cloned()
            .collect())
    }
}
