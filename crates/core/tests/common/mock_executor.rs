//! Mock executor implementations for deterministic testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use sk_core::engine::StepTypeIndex;
use sk_core::executors::{
    InitializationResult, ProcessTypeExecutor, StepError, StepExecutionResult,
};
use sk_protocol::{ProcessStepTypeId, ProcessTypeId};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A scriptable executor for driving the engine in tests.
///
/// Each executable step type is mapped to a fixed outcome, and every
/// executed step is recorded so tests can assert on execution order
/// and counts.
pub struct MockExecutor {
    process_type: ProcessTypeId,
    executable: HashSet<ProcessStepTypeId>,
    initialization: Result<InitializationResult, StepError>,
    script: HashMap<ProcessStepTypeId, Result<StepExecutionResult, StepError>>,
    executed: Mutex<Vec<ProcessStepTypeId>>,
}

#[allow(dead_code)]
impl MockExecutor {
    /// Creates an executor with no executable steps and a no-op
    /// initialization.
    pub fn new(process_type: ProcessTypeId) -> Self {
        Self {
            process_type,
            executable: HashSet::new(),
            initialization: Ok(InitializationResult::new(false)),
            script: HashMap::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Declares the step types this executor will pick up from the
    /// frontier.
    pub fn with_executable(
        mut self,
        step_types: impl IntoIterator<Item = ProcessStepTypeId>,
    ) -> Self {
        self.executable = step_types.into_iter().collect();
        self
    }

    /// Replaces the initialization outcome.
    pub fn with_initialization(
        mut self,
        initialization: Result<InitializationResult, StepError>,
    ) -> Self {
        self.initialization = initialization;
        self
    }

    /// Scripts the outcome returned when `step_type` is executed.
    pub fn on_step(
        mut self,
        step_type: ProcessStepTypeId,
        outcome: Result<StepExecutionResult, StepError>,
    ) -> Self {
        self.script.insert(step_type, outcome);
        self
    }

    /// Returns the step types executed so far, in execution order.
    pub fn executed_steps(&self) -> Vec<ProcessStepTypeId> {
        self.executed
            .lock()
            .expect("executed-step log lock poisoned")
            .clone()
    }
}

#[async_trait]
impl ProcessTypeExecutor for MockExecutor {
    fn process_type(&self) -> ProcessTypeId {
        self.process_type
    }

    fn executable_step_types(&self) -> &HashSet<ProcessStepTypeId> {
        &self.executable
    }

    fn is_lock_requested(&self, _step_type: ProcessStepTypeId) -> bool {
        false
    }

    async fn initialize(
        &self,
        _process_id: Uuid,
        _known_steps: &StepTypeIndex,
    ) -> Result<InitializationResult, StepError> {
        self.initialization.clone()
    }

    async fn execute_step(
        &self,
        step_type: ProcessStepTypeId,
        _known_steps: &StepTypeIndex,
        _cancellation: CancellationToken,
    ) -> Result<StepExecutionResult, StepError> {
        self.executed
            .lock()
            .expect("executed-step log lock poisoned")
            .push(step_type);
        match self.script.get(&step_type) {
            Some(outcome) => outcome.clone(),
            None => Err(StepError::Fatal(format!(
                "no scripted outcome for step {step_type}"
            ))),
        }
    }
}
