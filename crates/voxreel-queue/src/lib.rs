//! Bounded in-process task queue with a fixed worker pool.
//!
//! This crate provides:
//! - `WorkerPool`: bounded queue, N long-lived workers, idempotent start/shutdown
//! - `TaskHandler`: the seam between the pool and whatever executes tasks
//! - Per-task panic isolation and queue metrics

pub mod error;
pub mod metrics;
pub mod pool;

pub use error::{QueueError, QueueResult};
pub use pool::{PoolConfig, TaskHandler, WorkerPool};
