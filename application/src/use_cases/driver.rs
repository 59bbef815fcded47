//! Orchestration driver
//!
//! Owns the work queue and the worker pool. Each job names a record; a worker
//! keeps calling [`OnboardingEngine::advance_id`] for that record while it
//! lands in automatic states, then moves on.
//!
//! ```text
//! submit / resubmit / recover ──> enqueue(id) ──> [ bounded mpsc ] ──> worker 1..N
//!                                                                         │
//!                      ┌──────────── transient store error (backoff) ─────┤
//!                      ▼                                                  ▼
//!                 delayed re-enqueue                          engine.advance_id() loop
//! ```
//!
//! - Jobs for a record already being driven are coalesced: the running
//!   worker drives the record once more before releasing it.
//! - Failed external steps are persisted as `FAILED` by the engine and are
//!   never retried here.
//! - A fatal engine error stops every worker and is returned from
//!   [`OrchestrationDriver::run`].

use super::engine::{AdvanceOutcome, EngineError, OnboardingEngine};
use crate::config::DriverParams;
use onboard_domain::{StoreError, ToolId, ToolRecordStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound on engine steps per job. The longest legal run is three
/// commits (SUBMITTED, DEPLOYING, DISCOVERING_OPERATIONS).
const MAX_STEPS_PER_JOB: usize = 8;

/// Errors from the orchestration driver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("Fatal engine error: {0}")]
    Fatal(EngineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Driver stopped after a fatal error")]
    Stopped,

    #[error("Worker task failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone)]
struct Job {
    id: ToolId,
    attempt: u32,
}

/// Jobs enqueued, scheduled for retry or being processed.
#[derive(Default)]
struct PendingJobs {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingJobs {
    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Queue plus worker pool driving records through the automatic pipeline.
pub struct OrchestrationDriver<S: ToolRecordStore + ?Sized + 'static> {
    engine: Arc<OnboardingEngine<S>>,
    params: DriverParams,
    sender: mpsc::Sender<Job>,
    receiver: AsyncMutex<mpsc::Receiver<Job>>,
    /// Records currently being driven, with a "run again" flag.
    in_flight: Mutex<HashMap<ToolId, bool>>,
    pending: Arc<PendingJobs>,
    halt: CancellationToken,
    fatal: Mutex<Option<EngineError>>,
}

impl<S: ToolRecordStore + ?Sized + 'static> OrchestrationDriver<S> {
    pub fn new(engine: Arc<OnboardingEngine<S>>, params: DriverParams) -> Self {
        let (sender, receiver) = mpsc::channel(params.queue_capacity.max(1));
        Self {
            engine,
            params,
            sender,
            receiver: AsyncMutex::new(receiver),
            in_flight: Mutex::new(HashMap::new()),
            pending: Arc::new(PendingJobs::default()),
            halt: CancellationToken::new(),
            fatal: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<OnboardingEngine<S>> {
        &self.engine
    }

    /// Number of jobs not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Queue `id` for processing. Waits for queue capacity.
    pub async fn enqueue(&self, id: ToolId) -> Result<(), DriverError> {
        if self.halt.is_cancelled() {
            return Err(DriverError::Stopped);
        }
        self.pending.add();
        let job = Job { id, attempt: 0 };
        let sent = tokio::select! {
            biased;
            _ = self.halt.cancelled() => false,
            result = self.sender.send(job) => result.is_ok(),
        };
        if sent {
            Ok(())
        } else {
            self.finish_job();
            Err(DriverError::Stopped)
        }
    }

    /// Enqueue every persisted record resting in an automatic state.
    ///
    /// Used at startup to pick up work interrupted by a crash.
    pub async fn recover(&self) -> Result<usize, DriverError> {
        let records = self.engine.store().list(None).await?;
        let mut count = 0;
        for record in records.into_iter().filter(|r| r.status().is_automatic()) {
            debug!(record = %record.id(), status = %record.status(), "Recovering record");
            self.enqueue(record.id().clone()).await?;
            count += 1;
        }
        if count > 0 {
            info!("Recovered {} record(s) in automatic states", count);
        }
        Ok(count)
    }

    /// Run the worker pool until `shutdown` fires or a fatal error occurs.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<(), DriverError> {
        let workers = self.params.workers.max(1);
        info!("Starting {} orchestration worker(s)", workers);

        let mut join_set = JoinSet::new();
        for worker in 0..workers {
            let driver = Arc::clone(&self);
            let shutdown = shutdown.clone();
            join_set.spawn(async move { driver.worker_loop(worker, shutdown).await });
        }

        let mut worker_error = None;
        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                error!("Orchestration worker aborted: {}", e);
                worker_error.get_or_insert_with(|| DriverError::Worker(e.to_string()));
            }
        }

        if let Some(fatal) = self.take_fatal() {
            return Err(DriverError::Fatal(fatal));
        }
        worker_error.map_or(Ok(()), Err)
    }

    /// Start the workers, wait until no job is pending, then stop them.
    pub async fn run_until_idle(self: &Arc<Self>) -> Result<(), DriverError> {
        self.drain(false).await.map(|_| ())
    }

    /// [`recover`](Self::recover), then [`run_until_idle`](Self::run_until_idle).
    pub async fn recover_until_idle(self: &Arc<Self>) -> Result<usize, DriverError> {
        self.drain(true).await
    }

    async fn drain(self: &Arc<Self>, recover: bool) -> Result<usize, DriverError> {
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(Arc::clone(self).run(shutdown.clone()));

        let recovered = if recover { self.recover().await } else { Ok(0) };
        if recovered.is_ok() {
            self.wait_idle().await;
        }
        shutdown.cancel();

        runner
            .await
            .map_err(|e| DriverError::Worker(e.to_string()))??;
        recovered
    }

    /// Wait until every job has finished or the driver halted.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.pending.idle.notified();
            if self.pending() == 0 || self.halt.is_cancelled() {
                return;
            }
            tokio::select! {
                _ = notified => {}
                _ = self.halt.cancelled() => return,
            }
        }
    }

    async fn worker_loop(&self, worker: usize, shutdown: CancellationToken) {
        debug!(worker, "Worker started");
        loop {
            let job = {
                let mut receiver = self.receiver.lock().await;
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => None,
                    _ = self.halt.cancelled() => None,
                    job = receiver.recv() => job,
                }
            };
            let Some(job) = job else { break };
            self.process(job, &shutdown).await;
        }
        debug!(worker, "Worker stopped");
    }

    async fn process(&self, job: Job, shutdown: &CancellationToken) {
        if !self.claim(&job.id) {
            debug!(record = %job.id, "Record already in flight; coalesced");
            self.finish_job();
            return;
        }

        loop {
            match self.drive(&job.id).await {
                Ok(outcome) => {
                    debug!(record = %job.id, ?outcome, "Job finished");
                }
                Err(EngineError::Store(e)) if e.is_transient() => {
                    self.schedule_retry(&job, e, shutdown);
                }
                Err(e) if e.is_fatal() => {
                    error!(record = %job.id, "Fatal engine error, stopping driver: {}", e);
                    self.halt_with(e);
                }
                Err(e) => {
                    warn!(record = %job.id, "Dropping job: {}", e);
                }
            }

            if self.halt.is_cancelled() || !self.release(&job.id) {
                break;
            }
            debug!(record = %job.id, "Driving record again for coalesced job");
        }

        self.finish_job();
    }

    /// Advance one record until it leaves the automatic states.
    async fn drive(&self, id: &ToolId) -> Result<Option<AdvanceOutcome>, EngineError> {
        let mut last = None;
        for _ in 0..MAX_STEPS_PER_JOB {
            let outcome = self.engine.advance_id(id).await?;
            let keep_going = outcome.should_continue();
            last = Some(outcome);
            if !keep_going {
                break;
            }
        }
        Ok(last)
    }

    /// Re-enqueue `job` after a backoff. A retry abandoned by `shutdown` or
    /// a halt is settled here; the record stays in its automatic state for
    /// the next [`recover`](Self::recover).
    fn schedule_retry(&self, job: &Job, cause: StoreError, shutdown: &CancellationToken) {
        let attempt = job.attempt + 1;
        if attempt > self.params.max_store_retries {
            warn!(
                record = %job.id,
                attempts = job.attempt,
                "Giving up after repeated store errors: {}", cause
            );
            return;
        }

        let delay = self.params.backoff(attempt);
        warn!(record = %job.id, attempt, ?delay, "Store error, retrying: {}", cause);

        self.pending.add();
        let pending = Arc::clone(&self.pending);
        let sender = self.sender.clone();
        let halt = self.halt.clone();
        let shutdown = shutdown.clone();
        let retry = Job {
            id: job.id.clone(),
            attempt,
        };
        tokio::spawn(async move {
            let sent = tokio::select! {
                biased;
                _ = halt.cancelled() => false,
                _ = shutdown.cancelled() => false,
                sent = async {
                    tokio::time::sleep(delay).await;
                    sender.send(retry).await.is_ok()
                } => sent,
            };
            if !sent {
                debug!("Retry abandoned");
                pending.finish();
            }
        });
    }

    fn claim(&self, id: &ToolId) -> bool {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rerun) = in_flight.get_mut(id) {
            *rerun = true;
            return false;
        }
        in_flight.insert(id.clone(), false);
        true
    }

    /// Release `id`, or keep it and return `true` if another job asked for
    /// a rerun meanwhile.
    fn release(&self, id: &ToolId) -> bool {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let rerun = in_flight.get(id).copied().unwrap_or(false);
        if rerun {
            in_flight.insert(id.clone(), false);
        } else {
            in_flight.remove(id);
        }
        rerun
    }

    fn finish_job(&self) {
        self.pending.finish();
    }

    fn halt_with(&self, error: EngineError) {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(error);
        self.halt.cancel();
    }

    fn take_fatal(&self) -> Option<EngineError> {
        self.fatal.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
