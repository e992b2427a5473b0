//! Polling loop over all active processes.
//!
//! One `execute` call is one worker invocation: query the active
//! processes of every registered type, drive each process's unit-of-work
//! stream, commit at every modified boundary, and hard-stop the whole
//! batch on the first error.

use crate::engine::{ProcessExecutionError, ProcessExecutor};
use crate::executors::ExecutorRegistry;
use crate::persistence::ProcessRepository;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

/// Counters for one service invocation, reported to the host for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    /// Active processes picked up.
    pub processes: usize,

    /// Units of work drained across all runs.
    pub units_of_work: usize,

    /// Commits performed, one per modified unit of work.
    pub commits: usize,
}

/// Drives every active process of the registered types once.
pub struct ProcessExecutionService {
    registry: Arc<ExecutorRegistry>,
    repository: Arc<dyn ProcessRepository>,
    executor: ProcessExecutor,
}

impl ProcessExecutionService {
    /// Create a new ProcessExecutionService over the given registry and
    /// store.
    pub fn new(registry: Arc<ExecutorRegistry>, repository: Arc<dyn ProcessRepository>) -> Self {
        let executor = ProcessExecutor::new(Arc::clone(&registry), Arc::clone(&repository));
        Self {
            registry,
            repository,
            executor,
        }
    }

    /// Execute one polling pass over all active processes.
    ///
    /// For every yielded `Ok(modified)`: commit when `modified` is true,
    /// then drop whatever is still buffered, so pending state never leaks
    /// from one unit of work into the next. The first error anywhere
    /// stops the whole pass; processes after the failing one are not
    /// attempted in this invocation.
    ///
    /// # Errors
    ///
    /// Any [`ProcessExecutionError`] raised by a run, the store, or a
    /// commit, logged at error severity before it is returned.
    pub async fn execute(
        &self,
        cancellation: CancellationToken,
    ) -> Result<ProcessingSummary, ProcessExecutionError> {
        match self.execute_inner(cancellation).await {
            Ok(summary) => {
                tracing::info!(
                    processes = summary.processes,
                    units_of_work = summary.units_of_work,
                    commits = summary.commits,
                    "processing pass complete"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::error!(error = %err, "processing pass aborted");
                Err(err)
            }
        }
    }

    async fn execute_inner(
        &self,
        cancellation: CancellationToken,
    ) -> Result<ProcessingSummary, ProcessExecutionError> {
        // An aborted pass leaves its failing unit's writes buffered;
        // drop them so this pass's first commit cannot pick them up.
        self.repository.discard_changes();

        let process_types = self.registry.process_types();
        let active = self.repository.active_processes(&process_types).await?;
        tracing::info!(count = active.len(), "picked up active processes");

        let mut summary = ProcessingSummary::default();
        for (process_id, process_type) in active {
            summary.processes += 1;
            let mut stream = self
                .executor
                .run(process_id, process_type, cancellation.clone())
                .await?;
            while let Some(unit) = stream.next().await {
                let modified = unit?;
                summary.units_of_work += 1;
                if modified {
                    self.repository.commit().await?;
                    summary.commits += 1;
                }
                self.repository.discard_changes();
            }
        }
        Ok(summary)
    }
}
