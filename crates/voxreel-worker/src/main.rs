//! Narration task worker binary.
//!
//! Reads one task per line from stdin as `{"type": "<task type>", "payload": {...}}`
//! and feeds them to the worker pool.

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voxreel_models::TaskType;
use voxreel_queue::WorkerPool;
use voxreel_worker::{metrics, TaskContext, TaskDispatcher, WorkerConfig};

/// One line of task input.
#[derive(Debug, Deserialize)]
struct TaskLine {
    #[serde(rename = "type")]
    task_type: TaskType,
    #[serde(default)]
    payload: serde_json::Value,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting voxreel-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(addr) = config.metrics_addr {
        if let Err(e) = metrics::init_metrics(addr) {
            error!("Failed to start metrics exporter: {}", e);
            std::process::exit(1);
        }
    }

    // Fires on the second Ctrl-C and kills running subprocesses.
    let cancel = CancellationToken::new();

    let pool_config = config.pool;
    let ctx = match TaskContext::from_config(config, cancel.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to create task context: {}", e);
            std::process::exit(1);
        }
    };

    let pool = Arc::new(WorkerPool::new(
        pool_config,
        Arc::new(TaskDispatcher::new(Arc::new(ctx))),
    ));
    pool.start();

    let submit_cancel = CancellationToken::new();
    let mut intake = tokio::spawn(read_tasks(Arc::clone(&pool), submit_cancel.clone()));

    tokio::select! {
        res = &mut intake => {
            if let Err(e) = res {
                error!("Task intake failed: {}", e);
            }
            info!("Input closed, draining queue");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, draining queue");
            submit_cancel.cancel();
        }
    }

    let force = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Second shutdown signal, cancelling running commands");
                cancel.cancel();
            }
        })
    };

    pool.shutdown().await;
    force.abort();
    intake.abort();

    info!("Worker shutdown complete");
}

fn init_tracing() {
    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "voxreel=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Submit every stdin line until EOF or cancellation. Bad lines are logged
/// and skipped.
async fn read_tasks(pool: Arc<WorkerPool<TaskDispatcher>>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let task: TaskLine = match serde_json::from_str(&line) {
            Ok(task) => task,
            Err(e) => {
                warn!(error = %e, "Skipping malformed task line");
                continue;
            }
        };

        match pool.submit(&cancel, task.task_type, &task.payload).await {
            Ok(id) => info!(task_id = %id, task_type = %task.task_type, "Task submitted"),
            Err(e) => {
                warn!(task_type = %task.task_type, error = %e, "Task not submitted");
                if pool.is_closed() {
                    break;
                }
            }
        }
    }
}
