//! Routes decoded tasks to their handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;
use voxreel_models::{Task, TaskRequest};
use voxreel_queue::TaskHandler;

use crate::context::TaskContext;
use crate::error::{WorkerError, WorkerResult};
use crate::handlers::{media, script, subtitle, tts};
use crate::logging::TaskLogger;

/// Task handler that decodes a payload by task type and runs the matching
/// handler against a shared [`TaskContext`].
#[derive(Clone)]
pub struct TaskDispatcher {
    ctx: Arc<TaskContext>,
}

impl TaskDispatcher {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// Run an already-decoded request.
    pub async fn dispatch(&self, request: TaskRequest) -> WorkerResult<()> {
        let ctx = self.ctx.as_ref();
        match request {
            TaskRequest::GenScript(p) => script::generate_script(ctx, p).await,
            TaskRequest::GenTtsAll(p) => tts::synthesize_all(ctx, p).await,
            TaskRequest::GenTtsSingle(p) => tts::synthesize_single(ctx, p).await,
            TaskRequest::Mixdown(p) => media::mixdown(ctx, p).await,
            TaskRequest::ConcatWav(p) => media::concat_wav(ctx, p).await,
            TaskRequest::Render(p) => media::render(ctx, p).await,
            TaskRequest::Merge(p) => media::merge(ctx, p).await,
            TaskRequest::GenSubtitle(p) => subtitle::generate(ctx, p).await,
            TaskRequest::BurnSubtitle(p) => subtitle::burn(ctx, p).await,
        }
    }

    async fn run(&self, task: &Task, logger: &TaskLogger) -> WorkerResult<()> {
        let request = TaskRequest::decode(task.task_type(), task.payload())?;
        logger.log_start(&format!("{} bytes of payload", task.payload().len()));

        if let Err(e) = self.dispatch(request).await {
            if e.is_interrupted() {
                logger.log_warning(&format!("interrupted: {}", e));
            }
            return Err(e);
        }
        logger.log_completion("ok");
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for TaskDispatcher {
    type Error = WorkerError;

    async fn handle(&self, task: &Task) -> Result<(), WorkerError> {
        let logger = TaskLogger::new(task.id(), task.task_type());
        let span = logger.create_span();
        self.run(task, &logger).instrument(span).await
    }
}
