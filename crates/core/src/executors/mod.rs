//! Executor abstraction and management.
//!
//! This module provides the `ProcessTypeExecutor` trait (the plugin
//! contract of the engine), the `ExecutorRegistry` used to look one up
//! per process type, and the executors shipped with this crate.

pub mod base;
pub mod idp_deletion;
pub mod mailing;
pub mod registry;

pub use base::{InitializationResult, ProcessTypeExecutor, StepError, StepExecutionResult};
pub use idp_deletion::{
    IdentityProviderClient, IdpClientError, IdpDeletionData, IdpDeletionExecutor, IdpDeletionStore,
};
pub use mailing::{MailDelivery, MailDeliveryError, MailMessage, MailingExecutor, MailingStore};
pub use registry::{ExecutorRegistry, RegistryError};
