//! Queue metrics.

use metrics::{counter, histogram};
use voxreel_models::TaskType;

/// Metric names as constants for consistency.
pub mod names {
    pub const TASKS_SUBMITTED_TOTAL: &str = "voxreel_tasks_submitted_total";
    pub const TASKS_COMPLETED_TOTAL: &str = "voxreel_tasks_completed_total";
    pub const TASKS_FAILED_TOTAL: &str = "voxreel_tasks_failed_total";
    pub const TASKS_PANICKED_TOTAL: &str = "voxreel_tasks_panicked_total";
    pub const TASK_DURATION_SECONDS: &str = "voxreel_task_duration_seconds";
}

/// How a dequeued task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed,
    Panicked,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Failed => "failed",
            TaskOutcome::Panicked => "panicked",
        }
    }
}

pub fn record_submitted(task_type: TaskType) {
    counter!(names::TASKS_SUBMITTED_TOTAL, "task_type" => task_type.as_str()).increment(1);
}

pub fn record_finished(task_type: TaskType, outcome: TaskOutcome, duration_secs: f64) {
    let name = match outcome {
        TaskOutcome::Completed => names::TASKS_COMPLETED_TOTAL,
        TaskOutcome::Failed => names::TASKS_FAILED_TOTAL,
        TaskOutcome::Panicked => names::TASKS_PANICKED_TOTAL,
    };
    counter!(name, "task_type" => task_type.as_str()).increment(1);

    let labels = [
        ("task_type", task_type.as_str().to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];
    histogram!(names::TASK_DURATION_SECONDS, &labels).record(duration_secs);
}
