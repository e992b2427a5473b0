//! Step execution engine.
//!
//! The ProcessExecutor drives one process at a time: it loads the pending
//! steps, initializes the registered executor, then resolves frontier step
//! types one by one, yielding a unit-of-work boolean after every increment
//! of progress so the caller can commit at each boundary.

pub mod context;

pub use context::{ProcessContext, StepTypeIndex, StepTypeSet};

use crate::executors::{ExecutorRegistry, StepError, StepExecutionResult};
use crate::persistence::{ProcessRepository, RepositoryError};
use async_stream::stream;
use sk_protocol::{ProcessTypeId, StepStatus};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Errors that abort a process run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessExecutionError {
    /// The process's type has no registered executor. A deployment
    /// configuration error, not a business error.
    #[error("No executor registered for process type {0}")]
    UnknownProcessType(ProcessTypeId),

    /// An executor raised on the fatal path.
    #[error("Step execution failed: {0}")]
    Step(#[from] StepError),

    /// The process store failed.
    #[error("Process store failure: {0}")]
    Repository(#[from] RepositoryError),
}

/// The unit-of-work stream produced by one process run.
///
/// Each `Ok(modified)` marks a commit boundary; `modified` says whether
/// anything was written since the previous boundary. The stream is
/// single-use and finite: callers wanting to replay a process call
/// [`ProcessExecutor::run`] again, which re-reads storage.
pub type UnitOfWorkStream = Pin<Box<dyn Stream<Item = Result<bool, ProcessExecutionError>> + Send>>;

/// The per-process driver.
///
/// Holds the executor registry and the process store; each [`Self::run`]
/// call drives exactly one process to frontier exhaustion (or abort).
pub struct ProcessExecutor {
    registry: Arc<ExecutorRegistry>,
    repository: Arc<dyn ProcessRepository>,
}

impl ProcessExecutor {
    /// Create a new ProcessExecutor over the given registry and store.
    pub fn new(registry: Arc<ExecutorRegistry>, repository: Arc<dyn ProcessRepository>) -> Self {
        Self {
            registry,
            repository,
        }
    }

    /// Run one process, returning its unit-of-work stream.
    ///
    /// The run rebuilds all state fresh from the store: pending steps are
    /// loaded, the executor's `initialize` runs, initial scheduling is
    /// applied, and the first unit of work is yielded. The loop then pops
    /// frontier step types and executes them until none remain.
    ///
    /// Failure policy inside the stream:
    ///
    /// - [`StepError::Service`] from `execute_step` is captured: the step
    ///   is recorded `FAILED` with the error text, and the run continues.
    /// - Any other error terminates the stream with a single `Err` item;
    ///   once a step call has observed cancellation, no further steps are
    ///   attempted.
    ///
    /// # Errors
    ///
    /// [`ProcessExecutionError::UnknownProcessType`] if no executor is
    /// registered for `process_type`; no unit of work is produced.
    pub async fn run(
        &self,
        process_id: Uuid,
        process_type: ProcessTypeId,
        cancellation: CancellationToken,
    ) -> Result<UnitOfWorkStream, ProcessExecutionError> {
        let executor = self
            .registry
            .executor_for(process_type)
            .ok_or(ProcessExecutionError::UnknownProcessType(process_type))?;
        let repository = Arc::clone(&self.repository);

        let stream = stream! {
            tracing::info!(%process_id, %process_type, "starting process run");

            let mut ctx =
                match ProcessContext::load(repository, Arc::clone(&executor), process_id).await {
                    Ok(ctx) => ctx,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                };

            let init = match executor.initialize(process_id, ctx.known_steps()).await {
                Ok(init) => init,
                Err(err) => {
                    tracing::error!(%process_id, error = %err, "executor initialization failed");
                    yield Err(ProcessExecutionError::Step(err));
                    return;
                }
            };
            let mut modified = init.modified;
            if let Some(step_types) = init.schedule {
                match ctx.schedule(step_types).await {
                    Ok(created) => modified |= created,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
            yield Ok(modified);

            while let Some(step_type) = ctx.take_next() {
                if executor.is_lock_requested(step_type) {
                    tracing::debug!(%process_id, %step_type, "step requests a process lock");
                }

                let execution = executor
                    .execute_step(step_type, ctx.known_steps(), cancellation.clone())
                    .await;
                let result = match execution {
                    Ok(result) => result,
                    Err(StepError::Service(text)) => {
                        tracing::warn!(
                            %process_id,
                            %step_type,
                            error = %text,
                            "step failed, recording failure"
                        );
                        StepExecutionResult::new(false, StepStatus::Failed).with_message(text)
                    }
                    Err(err) => {
                        tracing::error!(%process_id, %step_type, error = %err, "aborting process run");
                        yield Err(ProcessExecutionError::Step(err));
                        return;
                    }
                };

                let mut modified = result.modified;
                match ctx
                    .update_step_status(step_type, result.status, result.message)
                    .await
                {
                    Ok(changed) => modified |= changed,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
                if let Some(skip) = result.skip {
                    match ctx.skip_steps(skip).await {
                        Ok(changed) => modified |= changed,
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
                if let Some(schedule) = result.schedule {
                    match ctx.schedule(schedule).await {
                        Ok(created) => modified |= created,
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
                yield Ok(modified);
            }

            tracing::info!(%process_id, "process run complete");
        };

        Ok(Box::pin(stream))
    }
}
