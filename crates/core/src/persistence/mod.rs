//! Process store abstraction.
//!
//! The engine reads and writes process steps exclusively through the
//! [`ProcessRepository`] trait. Writes are buffered: nothing becomes
//! visible to other readers until `commit`, and `discard_changes` drops
//! whatever the current unit of work left behind.

pub mod memory;

pub use memory::{InMemoryProcessRepository, StoreSnapshot};

use async_trait::async_trait;
use sk_protocol::{ProcessStep, ProcessStepTypeId, ProcessTypeId};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// A buffered mutation applied to one step record at commit time.
pub type StepMutation = Box<dyn FnOnce(&mut ProcessStep) + Send>;

/// Errors surfaced by a process store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The underlying storage failed.
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// A mutation referenced a step id the store has never seen.
    #[error("Process step {0} does not exist")]
    StepNotFound(Uuid),
}

/// The persistence boundary the engine drives steps through.
///
/// Semantics expected from implementations:
///
/// - Reads (`active_processes`, `process_steps`) see committed state only.
/// - Writes (`create_steps`, `update_step`) are buffered until `commit`.
/// - `discard_changes` drops the buffer without touching committed state.
#[async_trait]
pub trait ProcessRepository: Send + Sync {
    /// All processes of the given types that still have at least one
    /// pending (`TODO`) step.
    async fn active_processes(
        &self,
        process_types: &HashSet<ProcessTypeId>,
    ) -> Result<Vec<(Uuid, ProcessTypeId)>, RepositoryError>;

    /// The pending (`TODO`) steps of one process as (step type, step id)
    /// pairs.
    ///
    /// Per step type, pairs come back in creation order; the first id of
    /// a type is the authoritative record for duplicate resolution.
    async fn process_steps(
        &self,
        process_id: Uuid,
    ) -> Result<Vec<(ProcessStepTypeId, Uuid)>, RepositoryError>;

    /// Buffer the creation of one fresh `TODO` step per given type.
    ///
    /// The created records are returned immediately so callers can index
    /// them, but they join the committed store only on `commit`.
    async fn create_steps(
        &self,
        process_id: Uuid,
        step_types: Vec<ProcessStepTypeId>,
    ) -> Result<Vec<ProcessStep>, RepositoryError>;

    /// Buffer a mutation of one existing step record.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::StepNotFound`] if the step id is neither
    /// committed nor pending creation.
    async fn update_step(&self, step_id: Uuid, mutate: StepMutation)
        -> Result<(), RepositoryError>;

    /// Apply all buffered operations to the committed store.
    async fn commit(&self) -> Result<(), RepositoryError>;

    /// Drop all buffered, uncommitted operations.
    fn discard_changes(&self);
}
