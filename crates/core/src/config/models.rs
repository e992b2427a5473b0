//! Configuration models for a hosting worker.

use serde::{Deserialize, Serialize};
use sk_protocol::ProcessTypeId;
use std::path::PathBuf;

/// Settings a worker reads from its optional TOML file.
///
/// Every field is optional; command-line flags take precedence over file
/// values, and anything left unset falls back to the worker's built-in
/// defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Path of the JSON state file holding processes and steps.
    pub state_file: Option<PathBuf>,

    /// Default log filter directive, e.g. `info` or `sk_core=debug`.
    pub log_filter: Option<String>,

    /// Restrict execution to these process types. Unset means every
    /// type an executor is registered for.
    pub process_types: Option<Vec<ProcessTypeId>>,
}
