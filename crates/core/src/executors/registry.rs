//! Executor registry keyed by process type.
//!
//! The registry is built once at startup from the executors a deployment
//! ships, and stays immutable afterwards. Registering two executors for
//! the same process type is a configuration error, rejected at
//! construction rather than at first use.

use crate::executors::base::ProcessTypeExecutor;
use sk_protocol::ProcessTypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two executors claimed the same process type.
    #[error("Duplicate executor registered for process type {0}")]
    DuplicateExecutor(ProcessTypeId),
}

/// Immutable map from process type to its one registered executor.
pub struct ExecutorRegistry {
    executors: HashMap<ProcessTypeId, Arc<dyn ProcessTypeExecutor>>,
}

impl ExecutorRegistry {
    /// Build a registry from the given executor instances.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateExecutor`] if two instances report the
    /// same process type.
    pub fn new(
        instances: Vec<Arc<dyn ProcessTypeExecutor>>,
    ) -> Result<Self, RegistryError> {
        let mut executors: HashMap<ProcessTypeId, Arc<dyn ProcessTypeExecutor>> = HashMap::new();
        for executor in instances {
            let process_type = executor.process_type();
            if executors.insert(process_type, executor).is_some() {
                return Err(RegistryError::DuplicateExecutor(process_type));
            }
        }
        Ok(Self { executors })
    }

    /// Get the executor registered for a process type.
    ///
    /// # Returns
    ///
    /// `Some(Arc<dyn ProcessTypeExecutor>)` if registered, `None` otherwise.
    pub fn executor_for(&self, process_type: ProcessTypeId) -> Option<Arc<dyn ProcessTypeExecutor>> {
        self.executors.get(&process_type).cloned()
    }

    /// The set of process types executors are registered for.
    ///
    /// The execution service uses this to filter the active-process query
    /// down to processes it can actually drive.
    pub fn process_types(&self) -> HashSet<ProcessTypeId> {
        self.executors.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}
