//! Bounded task queue feeding a fixed set of workers.

use std::any::Any;
use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};
use voxreel_models::{Task, TaskId, TaskRequest, TaskType};

use crate::error::{QueueError, QueueResult};
use crate::metrics::{record_finished, record_submitted, TaskOutcome};

const DEFAULT_WORKER_COUNT: usize = 5;
const CAPACITY_PER_WORKER: usize = 8;

/// Executes one dequeued task.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    type Error: Display + Send;

    async fn handle(&self, task: &Task) -> Result<(), Self::Error>;
}

/// Worker pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of long-lived workers
    pub worker_count: usize,
    /// Maximum number of queued, not yet dequeued tasks
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT, 0)
    }
}

impl PoolConfig {
    /// Zero values fall back to the defaults (5 workers, 8 slots per worker).
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        let worker_count = if worker_count == 0 {
            DEFAULT_WORKER_COUNT
        } else {
            worker_count
        };
        let queue_capacity = if queue_capacity == 0 {
            worker_count * CAPACITY_PER_WORKER
        } else {
            queue_capacity
        };
        Self {
            worker_count,
            queue_capacity,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::new(env_usize("WORKER_COUNT"), env_usize("QUEUE_CAPACITY"))
    }
}

fn env_usize(key: &str) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

#[derive(Default)]
struct PoolState {
    sender: Option<mpsc::Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    started: bool,
    closed: bool,
}

/// Bounded queue plus N workers running tasks through a [`TaskHandler`].
///
/// `start` and `shutdown` are idempotent. After `shutdown` has begun, new
/// submissions fail with [`QueueError::Closed`]; tasks already queued are
/// drained before `shutdown` returns.
pub struct WorkerPool<H: TaskHandler> {
    config: PoolConfig,
    handler: Arc<H>,
    state: Mutex<PoolState>,
    shutdown_lock: tokio::sync::Mutex<()>,
}

impl<H: TaskHandler> WorkerPool<H> {
    pub fn new(config: PoolConfig, handler: Arc<H>) -> Self {
        Self {
            config,
            handler,
            state: Mutex::new(PoolState::default()),
            shutdown_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate the queue and spawn the workers. Must be called inside a
    /// Tokio runtime; later calls are no-ops.
    pub fn start(&self) {
        let mut state = self.lock_state();
        if state.started || state.closed {
            return;
        }

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        state.workers = (0..self.config.worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&rx),
                    Arc::clone(&self.handler),
                ))
            })
            .collect();
        state.sender = Some(tx);
        state.started = true;

        info!(
            workers = self.config.worker_count,
            capacity = self.config.queue_capacity,
            "Worker pool started"
        );
    }

    /// Serialize `payload` and queue it as a task of `task_type`.
    ///
    /// Blocks while the queue is full. If `cancel` fires first the task is
    /// never queued and [`QueueError::Cancelled`] is returned.
    pub async fn submit<P>(
        &self,
        cancel: &CancellationToken,
        task_type: TaskType,
        payload: &P,
    ) -> QueueResult<TaskId>
    where
        P: Serialize + ?Sized,
    {
        let bytes =
            serde_json::to_vec(payload).map_err(|e| QueueError::serialization(e.to_string()))?;
        self.enqueue(cancel, Task::new(task_type, bytes)).await
    }

    /// Queue an already-typed request.
    pub async fn submit_request(
        &self,
        cancel: &CancellationToken,
        request: &TaskRequest,
    ) -> QueueResult<TaskId> {
        let bytes = request
            .encode()
            .map_err(|e| QueueError::serialization(e.to_string()))?;
        self.enqueue(cancel, Task::new(request.task_type(), bytes))
            .await
    }

    async fn enqueue(&self, cancel: &CancellationToken, task: Task) -> QueueResult<TaskId> {
        self.start();

        // Cloned under the lock: once shutdown has taken the sender, no new
        // submission can reach the channel.
        let sender = {
            let state = self.lock_state();
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.sender.clone().ok_or(QueueError::Closed)?
        };

        let id = task.id().clone();
        let task_type = task.task_type();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(task_id = %id, task_type = %task_type, "Submission cancelled");
                Err(QueueError::Cancelled)
            }
            sent = sender.send(task) => {
                sent.map_err(|_| QueueError::Closed)?;
                record_submitted(task_type);
                debug!(task_id = %id, task_type = %task_type, "Task queued");
                Ok(id)
            }
        }
    }

    /// Stop accepting submissions, drain the queue and wait for every worker.
    ///
    /// Concurrent callers all return once the workers are gone.
    pub async fn shutdown(&self) {
        let _serial = self.shutdown_lock.lock().await;

        let workers = {
            let mut state = self.lock_state();
            state.closed = true;
            state.sender.take();
            std::mem::take(&mut state.workers)
        };
        if workers.is_empty() {
            return;
        }

        info!(workers = workers.len(), "Shutting down worker pool");
        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker exited abnormally");
            }
        }
        info!("Worker pool stopped");
    }
}

async fn worker_loop<H: TaskHandler>(
    worker_id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>,
    handler: Arc<H>,
) {
    debug!(worker_id, "Worker started");
    loop {
        let next = rx.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };
        run_task(worker_id, handler.as_ref(), task).await;
    }
    debug!(worker_id, "Worker exited");
}

/// Run one task, converting a handler panic into a logged failure.
async fn run_task<H: TaskHandler>(worker_id: usize, handler: &H, task: Task) {
    let span = info_span!(
        "task",
        task_id = %task.id(),
        task_type = %task.task_type(),
        worker_id
    );
    let started = Instant::now();

    let result = AssertUnwindSafe(handler.handle(&task))
        .catch_unwind()
        .instrument(span.clone())
        .await;

    let elapsed = started.elapsed().as_secs_f64();
    let _enter = span.enter();
    let outcome = match result {
        Ok(Ok(())) => {
            info!(elapsed_secs = elapsed, "Task completed");
            TaskOutcome::Completed
        }
        Ok(Err(e)) => {
            error!(elapsed_secs = elapsed, error = %e, "Task failed");
            TaskOutcome::Failed
        }
        Err(panic) => {
            error!(
                elapsed_secs = elapsed,
                panic = %panic_message(panic.as_ref()),
                "Task panicked"
            );
            TaskOutcome::Panicked
        }
    };
    record_finished(task.task_type(), outcome, elapsed);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
