//! Per-run execution state: the step frontier, the known-steps index,
//! and the process context tying them to one process run.

use crate::engine::ProcessExecutionError;
use crate::executors::ProcessTypeExecutor;
use crate::persistence::ProcessRepository;
use sk_protocol::{ProcessStepTypeId, StepStatus};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// The working set of step types currently eligible for execution.
///
/// Purely transient: built when a run starts, mutated as steps are
/// scheduled and resolved, discarded when the run ends. Iteration order
/// across [`Self::take_next`] calls is unspecified.
#[derive(Debug, Clone, Default)]
pub struct StepTypeSet {
    inner: HashSet<ProcessStepTypeId>,
}

impl StepTypeSet {
    /// Idempotent insert.
    pub fn insert(&mut self, step_type: ProcessStepTypeId) {
        self.inner.insert(step_type);
    }

    /// Idempotent delete; absent members are ignored.
    pub fn remove(&mut self, step_type: ProcessStepTypeId) {
        self.inner.remove(&step_type);
    }

    /// Removes and returns an arbitrary member, or `None` when empty.
    pub fn take_next(&mut self) -> Option<ProcessStepTypeId> {
        let next = self.inner.iter().next().copied()?;
        self.inner.remove(&next);
        Some(next)
    }

    pub fn contains(&self, step_type: ProcessStepTypeId) -> bool {
        self.inner.contains(&step_type)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<ProcessStepTypeId> for StepTypeSet {
    fn from_iter<I: IntoIterator<Item = ProcessStepTypeId>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// The pending steps of one process, indexed by step type.
///
/// Per type, ids keep the order the store returned them in; index 0 is
/// the authoritative record for first-wins duplicate resolution. Step
/// rows are materialized and grouped in memory, so the store's
/// sort-by-type guarantee is a throughput optimization, not a
/// correctness requirement.
#[derive(Debug, Clone, Default)]
pub struct StepTypeIndex {
    inner: HashMap<ProcessStepTypeId, Vec<Uuid>>,
}

impl StepTypeIndex {
    /// Group (step type, step id) rows into an index, preserving the
    /// per-type row order.
    pub fn from_rows(rows: impl IntoIterator<Item = (ProcessStepTypeId, Uuid)>) -> Self {
        let mut index = Self::default();
        for (step_type, step_id) in rows {
            index.register(step_type, step_id);
        }
        index
    }

    /// Append a step id to its type's list.
    pub fn register(&mut self, step_type: ProcessStepTypeId, step_id: Uuid) {
        self.inner.entry(step_type).or_default().push(step_id);
    }

    /// Remove a step type and return its ids, authoritative first.
    pub fn remove(&mut self, step_type: ProcessStepTypeId) -> Option<Vec<Uuid>> {
        self.inner.remove(&step_type)
    }

    pub fn contains(&self, step_type: ProcessStepTypeId) -> bool {
        self.inner.contains_key(&step_type)
    }

    /// The ids known for a step type, authoritative first.
    pub fn ids(&self, step_type: ProcessStepTypeId) -> Option<&[Uuid]> {
        self.inner.get(&step_type).map(Vec::as_slice)
    }

    /// All step types currently in the index, in unspecified order.
    pub fn step_types(&self) -> impl Iterator<Item = ProcessStepTypeId> + '_ {
        self.inner.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Everything one process run operates on: the known pending steps, the
/// frontier derived from them, and the store the run writes through.
///
/// Owned exclusively by a single run; never shared across runs.
pub struct ProcessContext {
    repository: Arc<dyn ProcessRepository>,
    executor: Arc<dyn ProcessTypeExecutor>,
    process_id: Uuid,
    known_steps: StepTypeIndex,
    frontier: StepTypeSet,
}

impl ProcessContext {
    /// Load the pending steps of a process and derive the initial
    /// frontier: every known step type the executor declares executable.
    pub async fn load(
        repository: Arc<dyn ProcessRepository>,
        executor: Arc<dyn ProcessTypeExecutor>,
        process_id: Uuid,
    ) -> Result<Self, ProcessExecutionError> {
        let rows = repository.process_steps(process_id).await?;
        let known_steps = StepTypeIndex::from_rows(rows);
        let frontier = known_steps
            .step_types()
            .filter(|step_type| executor.is_executable(*step_type))
            .collect();

        Ok(Self {
            repository,
            executor,
            process_id,
            known_steps,
            frontier,
        })
    }

    /// The pending steps as currently known to this run.
    pub fn known_steps(&self) -> &StepTypeIndex {
        &self.known_steps
    }

    /// Pop the next step type to execute, or `None` when the frontier
    /// is exhausted.
    pub fn take_next(&mut self) -> Option<ProcessStepTypeId> {
        self.frontier.take_next()
    }

    /// Schedule fresh `TODO` steps for every requested type not already
    /// known to this run.
    ///
    /// Rescheduling a known type is a no-op, so repeated partial runs
    /// never pile up duplicate records. Newly created executable types
    /// join the frontier.
    ///
    /// # Returns
    ///
    /// `true` when at least one record was created.
    pub async fn schedule(
        &mut self,
        step_types: impl IntoIterator<Item = ProcessStepTypeId>,
    ) -> Result<bool, ProcessExecutionError> {
        let new_types: Vec<ProcessStepTypeId> = step_types
            .into_iter()
            .filter(|step_type| !self.known_steps.contains(*step_type))
            .collect();
        if new_types.is_empty() {
            return Ok(false);
        }

        let created = self
            .repository
            .create_steps(self.process_id, new_types)
            .await?;
        for step in &created {
            tracing::debug!(
                process_id = %self.process_id,
                step_type = %step.step_type,
                "scheduled step"
            );
            self.known_steps.register(step.step_type, step.id);
            if self.executor.is_executable(step.step_type) {
                self.frontier.insert(step.step_type);
            }
        }
        Ok(true)
    }

    /// Resolve a step type to its final status.
    ///
    /// The first known id of the type receives `status` and the optional
    /// `message`; every other id sharing the type is forced to
    /// `DUPLICATE`. The type then leaves the known-steps index and the
    /// frontier.
    ///
    /// Two no-op guards: a `TODO` target writes nothing (steps already
    /// start as `TODO`), and an unknown step type writes nothing (stale
    /// skip or schedule references).
    ///
    /// # Returns
    ///
    /// `true` whenever at least one record's status was changed.
    pub async fn update_step_status(
        &mut self,
        step_type: ProcessStepTypeId,
        status: StepStatus,
        message: Option<String>,
    ) -> Result<bool, ProcessExecutionError> {
        if status == StepStatus::Todo {
            return Ok(false);
        }
        let Some(ids) = self.known_steps.remove(step_type) else {
            return Ok(false);
        };

        tracing::debug!(
            process_id = %self.process_id,
            %step_type,
            %status,
            duplicates = ids.len().saturating_sub(1),
            "resolving step"
        );

        let mut ids = ids.into_iter();
        if let Some(authoritative) = ids.next() {
            self.repository
                .update_step(
                    authoritative,
                    Box::new(move |step| {
                        step.status = status;
                        step.message = message;
                    }),
                )
                .await?;
        }
        for duplicate in ids {
            self.repository
                .update_step(
                    duplicate,
                    Box::new(|step| {
                        step.status = StepStatus::Duplicate;
                    }),
                )
                .await?;
        }

        self.frontier.remove(step_type);
        Ok(true)
    }

    /// Transition existing `TODO` steps of the given types to `SKIPPED`.
    ///
    /// # Returns
    ///
    /// `true` when at least one step was resolved.
    pub async fn skip_steps(
        &mut self,
        step_types: impl IntoIterator<Item = ProcessStepTypeId>,
    ) -> Result<bool, ProcessExecutionError> {
        let mut modified = false;
        for step_type in step_types {
            modified |= self
                .update_step_status(step_type, StepStatus::Skipped, None)
                .await?;
        }
        Ok(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_set_insert_is_idempotent() {
        let mut set = StepTypeSet::default();
        set.insert(ProcessStepTypeId::SendMail);
        set.insert(ProcessStepTypeId::SendMail);

        assert_eq!(set.len(), 1);
        assert!(set.contains(ProcessStepTypeId::SendMail));
    }

    #[test]
    fn test_step_type_set_remove_absent_is_silent() {
        let mut set = StepTypeSet::default();
        set.remove(ProcessStepTypeId::SendMail);
        assert!(set.is_empty());
    }

    #[test]
    fn test_step_type_set_take_next_drains_each_member_once() {
        let mut set: StepTypeSet = [
            ProcessStepTypeId::DeleteIdpSharedRealm,
            ProcessStepTypeId::DeleteIdpSharedServiceaccount,
            ProcessStepTypeId::DeleteCentralIdentityProvider,
        ]
        .into_iter()
        .collect();

        let mut taken = HashSet::new();
        while let Some(step_type) = set.take_next() {
            assert!(taken.insert(step_type), "member yielded twice");
        }

        assert_eq!(taken.len(), 3);
        assert!(set.is_empty());
        assert_eq!(set.take_next(), None);
    }

    #[test]
    fn test_step_type_index_preserves_per_type_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let other = Uuid::new_v4();

        let index = StepTypeIndex::from_rows([
            (ProcessStepTypeId::SendMail, first),
            (ProcessStepTypeId::ActivateApplication, other),
            (ProcessStepTypeId::SendMail, second),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.ids(ProcessStepTypeId::SendMail),
            Some([first, second].as_slice())
        );
        assert_eq!(
            index.ids(ProcessStepTypeId::ActivateApplication),
            Some([other].as_slice())
        );
    }

    #[test]
    fn test_step_type_index_register_appends() {
        let mut index = StepTypeIndex::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        index.register(ProcessStepTypeId::SendMail, first);
        index.register(ProcessStepTypeId::SendMail, second);

        let ids = index.remove(ProcessStepTypeId::SendMail).unwrap();
        assert_eq!(ids, vec![first, second]);
        assert!(index.is_empty());
    }
}
