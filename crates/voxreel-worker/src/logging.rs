//! Structured task logging utilities.
//!
//! Provides consistent, structured logging for task processing with
//! tracing spans and contextual information.

use tracing::{info, warn, Span};
use voxreel_models::{TaskId, TaskType};

/// Task logger for lifecycle events with the task ID and type attached.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
    task_type: TaskType,
}

impl TaskLogger {
    pub fn new(task_id: &TaskId, task_type: TaskType) -> Self {
        Self {
            task_id: task_id.to_string(),
            task_type,
        }
    }

    /// Log the start of a task.
    pub fn log_start(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            task_type = %self.task_type,
            "Task started: {}", message
        );
    }

    /// Log a progress update during task execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            task_type = %self.task_type,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            task_id = %self.task_id,
            task_type = %self.task_type,
            "Task warning: {}", message
        );
    }

    /// Log the completion of a task.
    pub fn log_completion(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            task_type = %self.task_type,
            "Task completed: {}", message
        );
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Create a tracing span for this task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "dispatch",
            task_id = %self.task_id,
            task_type = %self.task_type
        )
    }
}
