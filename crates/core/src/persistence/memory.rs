//! In-memory process store.
//!
//! Backs the test suites and the worker's JSON state file. Committed
//! state and the pending operation buffer live behind a single mutex;
//! the engine drives processes sequentially, so the lock is uncontended.

use super::{ProcessRepository, RepositoryError, StepMutation};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sk_protocol::{Process, ProcessStep, ProcessStepTypeId, ProcessTypeId, StepStatus};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Serializable image of the committed store, used for state files.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub processes: Vec<Process>,
    pub steps: Vec<ProcessStep>,
}

enum PendingOp {
    Create(ProcessStep),
    Update { step_id: Uuid, mutate: StepMutation },
}

#[derive(Default)]
struct Inner {
    processes: Vec<Process>,
    steps: Vec<ProcessStep>,
    pending: Vec<PendingOp>,
}

/// Reference [`ProcessRepository`] implementation holding everything in
/// memory.
///
/// Reads see committed state only; `create_steps` and `update_step`
/// buffer operations that become visible on `commit` and vanish on
/// `discard_changes`. The seeding and inspection helpers bypass the
/// buffer and touch committed state directly.
#[derive(Default)]
pub struct InMemoryProcessRepository {
    inner: Mutex<Inner>,
}

impl InMemoryProcessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository whose committed state is the given snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                processes: snapshot.processes,
                steps: snapshot.steps,
                pending: Vec::new(),
            }),
        }
    }

    /// Capture the committed state; pending operations are not included.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.locked();
        StoreSnapshot {
            processes: inner.processes.clone(),
            steps: inner.steps.clone(),
        }
    }

    /// Seed a process directly into committed state.
    pub fn add_process(&self, process: Process) {
        self.locked().processes.push(process);
    }

    /// Seed a step directly into committed state.
    pub fn add_step(&self, step: ProcessStep) {
        self.locked().steps.push(step);
    }

    /// All committed processes, in insertion order.
    pub fn processes(&self) -> Vec<Process> {
        self.locked().processes.clone()
    }

    /// All committed steps of one process, in creation order.
    pub fn steps_of(&self, process_id: Uuid) -> Vec<ProcessStep> {
        self.locked()
            .steps
            .iter()
            .filter(|step| step.process_id == process_id)
            .cloned()
            .collect()
    }

    /// One committed step by id.
    pub fn step(&self, step_id: Uuid) -> Option<ProcessStep> {
        self.locked()
            .steps
            .iter()
            .find(|step| step.id == step_id)
            .cloned()
    }

    /// Number of buffered, uncommitted operations.
    pub fn pending_count(&self) -> usize {
        self.locked().pending.len()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProcessRepository for InMemoryProcessRepository {
    async fn active_processes(
        &self,
        process_types: &HashSet<ProcessTypeId>,
    ) -> Result<Vec<(Uuid, ProcessTypeId)>, RepositoryError> {
        let inner = self.locked();
        Ok(inner
            .processes
            .iter()
            .filter(|process| process_types.contains(&process.process_type))
            .filter(|process| {
                inner.steps.iter().any(|step| {
                    step.process_id == process.id && step.status == StepStatus::Todo
                })
            })
            .map(|process| (process.id, process.process_type))
            .collect())
    }

    async fn process_steps(
        &self,
        process_id: Uuid,
    ) -> Result<Vec<(ProcessStepTypeId, Uuid)>, RepositoryError> {
        let inner = self.locked();
        Ok(inner
            .steps
            .iter()
            .filter(|step| step.process_id == process_id && step.status == StepStatus::Todo)
            .map(|step| (step.step_type, step.id))
            .collect())
    }

    async fn create_steps(
        &self,
        process_id: Uuid,
        step_types: Vec<ProcessStepTypeId>,
    ) -> Result<Vec<ProcessStep>, RepositoryError> {
        let mut inner = self.locked();
        let mut created = Vec::with_capacity(step_types.len());
        for step_type in step_types {
            let step = ProcessStep::new(process_id, step_type);
            inner.pending.push(PendingOp::Create(step.clone()));
            created.push(step);
        }
        Ok(created)
    }

    async fn update_step(
        &self,
        step_id: Uuid,
        mutate: StepMutation,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.locked();
        let known_committed = inner.steps.iter().any(|step| step.id == step_id);
        let known_pending = inner.pending.iter().any(|op| match op {
            PendingOp::Create(step) => step.id == step_id,
            PendingOp::Update { .. } => false,
        });
        if !known_committed && !known_pending {
            return Err(RepositoryError::StepNotFound(step_id));
        }
        inner.pending.push(PendingOp::Update { step_id, mutate });
        Ok(())
    }

    async fn commit(&self) -> Result<(), RepositoryError> {
        let mut inner = self.locked();
        let pending = std::mem::take(&mut inner.pending);
        for op in pending {
            match op {
                PendingOp::Create(step) => inner.steps.push(step),
                PendingOp::Update { step_id, mutate } => {
                    let Some(step) = inner.steps.iter_mut().find(|step| step.id == step_id)
                    else {
                        return Err(RepositoryError::StepNotFound(step_id));
                    };
                    mutate(step);
                    step.date_last_changed = Some(Utc::now());
                }
            }
        }
        Ok(())
    }

    fn discard_changes(&self) {
        self.locked().pending.clear();
    }
}
