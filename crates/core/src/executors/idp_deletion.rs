//! Identity-provider deletion executor.
//!
//! Drives the teardown of a managed identity provider: shared realm
//! first, then the realm's service account, then the registration on the
//! central instance. Each outbound call goes through the
//! [`IdentityProviderClient`] port; the executor itself owns only the
//! step choreography.

use crate::engine::StepTypeIndex;
use crate::executors::base::{
    InitializationResult, ProcessTypeExecutor, StepError, StepExecutionResult,
};
use async_trait::async_trait;
use sk_protocol::{ProcessStepTypeId, ProcessTypeId, StepStatus};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Denormalized identity-provider data the deletion steps operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpDeletionData {
    /// Alias of the identity provider being torn down.
    pub idp_alias: String,

    /// Name of the shared realm backing the provider.
    pub shared_realm: String,

    /// Client id of the service account attached to the shared realm.
    pub service_account_client_id: String,
}

/// Errors from the identity-provider service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdpClientError {
    /// Transient outage. The affected step stays pending and is picked
    /// up again by a later worker invocation.
    #[error("Identity provider service unavailable: {0}")]
    Unavailable(String),

    /// Definitive rejection. The affected step fails and waits for a
    /// manual retrigger.
    #[error("Identity provider call rejected: {0}")]
    Failure(String),
}

/// Read access to the deletion data recorded for a process.
#[async_trait]
pub trait IdpDeletionStore: Send + Sync {
    /// The deletion data of one process, or `None` if the process was
    /// created without it.
    async fn deletion_data(
        &self,
        process_id: Uuid,
    ) -> Result<Option<IdpDeletionData>, IdpClientError>;
}

/// Outbound calls against the identity-provider service.
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    async fn delete_shared_realm(&self, data: &IdpDeletionData) -> Result<(), IdpClientError>;

    async fn delete_shared_service_account(
        &self,
        data: &IdpDeletionData,
    ) -> Result<(), IdpClientError>;

    async fn delete_central_identity_provider(
        &self,
        data: &IdpDeletionData,
    ) -> Result<(), IdpClientError>;
}

/// Executor for [`ProcessTypeId::IdentityProviderDeletion`] processes.
///
/// Executable steps are the three `DELETE_*` types; the `RETRIGGER_*`
/// siblings are known and schedulable but wait for manual administration,
/// so they never enter this executor's frontier. Deletion data is loaded
/// once per run during `initialize` and kept behind a mutex; the engine
/// drives one process at a time, so the lock is uncontended.
pub struct IdpDeletionExecutor {
    store: Arc<dyn IdpDeletionStore>,
    client: Arc<dyn IdentityProviderClient>,
    executable: HashSet<ProcessStepTypeId>,
    data: Mutex<Option<IdpDeletionData>>,
}

impl IdpDeletionExecutor {
    /// Create a new IdpDeletionExecutor over the given ports.
    pub fn new(store: Arc<dyn IdpDeletionStore>, client: Arc<dyn IdentityProviderClient>) -> Self {
        Self {
            store,
            client,
            executable: HashSet::from([
                ProcessStepTypeId::DeleteIdpSharedRealm,
                ProcessStepTypeId::DeleteIdpSharedServiceaccount,
                ProcessStepTypeId::DeleteCentralIdentityProvider,
            ]),
            data: Mutex::new(None),
        }
    }

    async fn loaded_data(&self) -> Result<IdpDeletionData, StepError> {
        self.data.lock().await.clone().ok_or_else(|| {
            StepError::Fatal("identity provider deletion data not loaded".to_string())
        })
    }
}

#[async_trait]
impl ProcessTypeExecutor for IdpDeletionExecutor {
    fn process_type(&self) -> ProcessTypeId {
        ProcessTypeId::IdentityProviderDeletion
    }

    fn executable_step_types(&self) -> &HashSet<ProcessStepTypeId> {
        &self.executable
    }

    /// All three deletion steps mutate a shared realm, so each requests
    /// an exclusive lock on the process.
    fn is_lock_requested(&self, step_type: ProcessStepTypeId) -> bool {
        self.executable.contains(&step_type)
    }

    async fn initialize(
        &self,
        process_id: Uuid,
        _known_steps: &StepTypeIndex,
    ) -> Result<InitializationResult, StepError> {
        let data = self
            .store
            .deletion_data(process_id)
            .await
            .map_err(|err| StepError::Service(err.to_string()))?
            .ok_or_else(|| {
                StepError::Fatal(format!(
                    "no identity provider deletion data recorded for process {process_id}"
                ))
            })?;
        *self.data.lock().await = Some(data);
        Ok(InitializationResult::new(false))
    }

    async fn execute_step(
        &self,
        step_type: ProcessStepTypeId,
        _known_steps: &StepTypeIndex,
        cancellation: CancellationToken,
    ) -> Result<StepExecutionResult, StepError> {
        if cancellation.is_cancelled() {
            return Err(StepError::Canceled);
        }
        let data = self.loaded_data().await?;

        let outcome = match step_type {
            ProcessStepTypeId::DeleteIdpSharedRealm => self
                .client
                .delete_shared_realm(&data)
                .await
                .map(|()| Some(ProcessStepTypeId::DeleteIdpSharedServiceaccount)),
            ProcessStepTypeId::DeleteIdpSharedServiceaccount => self
                .client
                .delete_shared_service_account(&data)
                .await
                .map(|()| Some(ProcessStepTypeId::DeleteCentralIdentityProvider)),
            ProcessStepTypeId::DeleteCentralIdentityProvider => self
                .client
                .delete_central_identity_provider(&data)
                .await
                .map(|()| None),
            other => {
                return Err(StepError::Fatal(format!(
                    "step type {other} is not executable for identity provider deletion"
                )))
            }
        };

        match outcome {
            Ok(next) => {
                let mut result = StepExecutionResult::new(false, StepStatus::Done);
                if let Some(next) = next {
                    result = result.with_schedule([next]);
                }
                Ok(result)
            }
            Err(IdpClientError::Unavailable(text)) => {
                tracing::debug!(
                    idp_alias = %data.idp_alias,
                    %step_type,
                    error = %text,
                    "identity provider unavailable, leaving step pending"
                );
                Ok(StepExecutionResult::new(false, StepStatus::Todo))
            }
            Err(IdpClientError::Failure(text)) => {
                let mut result =
                    StepExecutionResult::new(false, StepStatus::Failed).with_message(text);
                if let Some(retrigger) = step_type.retrigger_step() {
                    result = result.with_schedule([retrigger]);
                }
                Ok(result)
            }
        }
    }
}
