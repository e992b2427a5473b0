//! Base ProcessTypeExecutor trait and supporting types.

use crate::engine::StepTypeIndex;
use async_trait::async_trait;
use sk_protocol::{ProcessStepTypeId, ProcessTypeId, StepStatus};
use std::collections::HashSet;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Outcome of an executor's per-run initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializationResult {
    /// Whether initialization wrote anything that needs a commit.
    pub modified: bool,

    /// Step types to schedule before the iteration loop starts.
    ///
    /// Typically used to seed the first steps of a process that was
    /// created without any.
    pub schedule: Option<HashSet<ProcessStepTypeId>>,
}

impl InitializationResult {
    /// Create an InitializationResult with no steps to schedule.
    pub fn new(modified: bool) -> Self {
        Self {
            modified,
            schedule: None,
        }
    }

    /// Set the step types to schedule before iteration.
    pub fn with_schedule(mut self, schedule: impl IntoIterator<Item = ProcessStepTypeId>) -> Self {
        self.schedule = Some(schedule.into_iter().collect());
        self
    }
}

/// Outcome of executing a single step type.
///
/// The engine applies `status` to the executed step via the status-update
/// procedure, resolves `skip` entries to `SKIPPED`, and schedules `schedule`
/// entries as fresh `TODO` steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepExecutionResult {
    /// Whether the executor itself wrote anything that needs a commit.
    pub modified: bool,

    /// Resulting status for the just-executed step type.
    ///
    /// `StepStatus::Todo` leaves the step unresolved for a later run;
    /// the engine writes nothing in that case.
    pub status: StepStatus,

    /// New step types to schedule as a consequence of this step.
    pub schedule: Option<HashSet<ProcessStepTypeId>>,

    /// Existing `TODO` step types made irrelevant by this step's outcome.
    pub skip: Option<HashSet<ProcessStepTypeId>>,

    /// Optional detail recorded on the resolved step, typically the
    /// failure text accompanying a `FAILED` status.
    pub message: Option<String>,
}

impl StepExecutionResult {
    /// Create a StepExecutionResult with no side-effect sets.
    pub fn new(modified: bool, status: StepStatus) -> Self {
        Self {
            modified,
            status,
            schedule: None,
            skip: None,
            message: None,
        }
    }

    /// Set the step types to schedule.
    pub fn with_schedule(mut self, schedule: impl IntoIterator<Item = ProcessStepTypeId>) -> Self {
        self.schedule = Some(schedule.into_iter().collect());
        self
    }

    /// Set the step types to skip.
    pub fn with_skip(mut self, skip: impl IntoIterator<Item = ProcessStepTypeId>) -> Self {
        self.skip = Some(skip.into_iter().collect());
        self
    }

    /// Attach a detail message to the resolved step.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Errors an executor can raise out of `initialize` or `execute_step`.
///
/// Transient failures are not an error: executors map them to
/// `Ok(StepExecutionResult { status: Todo, .. })` so the step stays
/// pending for the next worker invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Business or service-level failure. The engine captures it,
    /// records `FAILED` with this text as the step message, and moves
    /// on to the next frontier entry.
    #[error("Service call failed: {0}")]
    Service(String),

    /// Unrecoverable runtime failure. Propagated unchanged; the whole
    /// process run aborts.
    #[error("Unrecoverable failure: {0}")]
    Fatal(String),

    /// Cancellation observed inside executor I/O. Aborts the run.
    #[error("Execution canceled")]
    Canceled,
}

/// The contract every process type plugs into the engine with.
///
/// One executor instance serves all processes of its type. Executors that
/// load per-run state during `initialize` keep it behind interior
/// mutability; the engine drives one process at a time, so such state is
/// never contended.
#[async_trait]
pub trait ProcessTypeExecutor: Send + Sync {
    /// The process type this executor handles.
    fn process_type(&self) -> ProcessTypeId;

    /// The full universe of step types this executor can execute.
    ///
    /// A process type may know about step types it does not execute
    /// itself, e.g. manual retrigger steps resolved by administrators.
    fn executable_step_types(&self) -> &HashSet<ProcessStepTypeId>;

    /// Membership test against [`Self::executable_step_types`].
    fn is_executable(&self, step_type: ProcessStepTypeId) -> bool {
        self.executable_step_types().contains(&step_type)
    }

    /// Whether executing this step type requires an exclusive lock on the
    /// process. The engine only surfaces the flag; enforcing the lock is
    /// the host's responsibility.
    fn is_lock_requested(&self, step_type: ProcessStepTypeId) -> bool;

    /// Called once per run before the iteration loop.
    ///
    /// # Arguments
    ///
    /// * `process_id` - The process about to be driven
    /// * `known_steps` - The pending steps loaded for this run
    ///
    /// # Errors
    ///
    /// Any error aborts the run for this process before a single step
    /// executes; nothing is committed.
    async fn initialize(
        &self,
        process_id: Uuid,
        known_steps: &StepTypeIndex,
    ) -> Result<InitializationResult, StepError>;

    /// Execute exactly one step type's business logic.
    ///
    /// # Arguments
    ///
    /// * `step_type` - The step type popped from the frontier
    /// * `known_steps` - The pending steps as currently known to the run
    /// * `cancellation` - Token to honor at I/O suspension points
    ///
    /// # Errors
    ///
    /// [`StepError::Service`] is captured by the engine and recorded as a
    /// `FAILED` step; [`StepError::Fatal`] and [`StepError::Canceled`]
    /// abort the run.
    async fn execute_step(
        &self,
        step_type: ProcessStepTypeId,
        known_steps: &StepTypeIndex,
        cancellation: CancellationToken,
    ) -> Result<StepExecutionResult, StepError>;
}
