//! Shared mocks for application-layer tests.

use crate::ports::deployment_gateway::{DeploymentGateway, DeploymentReceipt, DeploymentRequest, GatewayError};
use crate::ports::repository_validator::{RepositoryValidator, ValidatorError};
use crate::ports::tool_discovery::{DiscoveryError, ToolDiscoveryClient};
use async_trait::async_trait;
use onboard_domain::{
    CasOutcome, OperationDescriptor, Precondition, StepEffect, StoreError, ToolId, ToolRecord,
    ToolRecordStore, ToolStatus,
};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn ops(names: &[&str]) -> Vec<OperationDescriptor> {
    names
        .iter()
        .map(|name| OperationDescriptor::new(*name, format!("{} operation", name)))
        .collect()
}

pub fn submitted_record(id: &str) -> ToolRecord {
    ToolRecord::new(id, "alice", "good", serde_json::json!({"image": "acme/tool:1"}))
}

/// A record resting in `DISCOVERING_OPERATIONS` with `service_name` set.
pub fn deployed_record(id: &str, service_name: &str) -> ToolRecord {
    let mut record = submitted_record(id);
    record.apply_step(ToolStatus::Deploying, StepEffect::None).unwrap();
    record
        .apply_step(
            ToolStatus::DiscoveringOperations,
            StepEffect::Deployed { service_name: service_name.into() },
        )
        .unwrap();
    record
}

// ==================== External collaborators ====================

pub struct MockValidator {
    result: Result<(), ValidatorError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockValidator {
    pub fn accepting() -> Self {
        Self {
            result: Ok(()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            result: Err(ValidatorError::Rejected(reason.to_string())),
            ..Self::accepting()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryValidator for MockValidator {
    async fn validate(&self, source_url: &str) -> Result<(), ValidatorError> {
        self.calls.lock().unwrap().push(source_url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub struct MockGateway {
    result: Result<DeploymentReceipt, GatewayError>,
    panics: bool,
    requests: Mutex<Vec<DeploymentRequest>>,
}

impl MockGateway {
    pub fn succeeding(service_name: &str) -> Self {
        Self::with_receipt(DeploymentReceipt::succeeded(service_name))
    }

    pub fn with_receipt(receipt: DeploymentReceipt) -> Self {
        Self {
            result: Ok(receipt),
            panics: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self {
            result: Err(error),
            panics: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::succeeding("unused")
        }
    }

    pub fn requests(&self) -> Vec<DeploymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeploymentGateway for MockGateway {
    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReceipt, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.panics {
            panic!("gateway client bug");
        }
        self.result.clone()
    }
}

pub struct MockDiscovery {
    result: Result<Vec<OperationDescriptor>, DiscoveryError>,
    calls: Mutex<Vec<String>>,
}

impl MockDiscovery {
    pub fn returning(operations: Vec<OperationDescriptor>) -> Self {
        Self {
            result: Ok(operations),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: DiscoveryError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolDiscoveryClient for MockDiscovery {
    async fn list_operations(&self, service_name: &str) -> Result<Vec<OperationDescriptor>, DiscoveryError> {
        self.calls.lock().unwrap().push(service_name.to_string());
        self.result.clone()
    }
}

// ==================== Store ====================

/// In-memory store with injectable transient load failures.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<ToolId, ToolRecord>>,
    failing_loads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: ToolRecord) -> Self {
        let store = Self::new();
        store.records.lock().unwrap().insert(record.id().clone(), record);
        store
    }

    /// Make the next `n` loads fail with a transient I/O error.
    pub fn fail_next_loads(&self, n: usize) {
        self.failing_loads.store(n, Ordering::SeqCst);
    }

    /// Number of successful conditional writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, id: &str) -> ToolRecord {
        self.records.lock().unwrap()[&ToolId::new(id)].clone()
    }
}

#[async_trait]
impl ToolRecordStore for MemoryStore {
    async fn insert(&self, record: &ToolRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists(record.id().clone()));
        }
        records.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn load(&self, id: &ToolId) -> Result<Option<ToolRecord>, StoreError> {
        let failing = self.failing_loads.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_loads.store(failing - 1, Ordering::SeqCst);
            return Err(StoreError::Io("simulated outage".into()));
        }
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected: Precondition,
        record: &ToolRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut records = self.records.lock().unwrap();
        let stored = records
            .get(record.id())
            .ok_or_else(|| StoreError::NotFound(record.id().clone()))?;
        if !expected.matches(stored) {
            return Ok(CasOutcome::Conflict {
                actual: stored.status(),
                revision: stored.revision(),
            });
        }
        records.insert(record.id().clone(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(CasOutcome::Committed)
    }

    async fn list(&self, status: Option<ToolStatus>) -> Result<Vec<ToolRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| status.is_none_or(|s| r.status() == s))
            .cloned()
            .collect())
    }
}
