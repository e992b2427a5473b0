//! Mailing executor.
//!
//! The minimal counterpart to the identity-provider deletion executor: a
//! single `SEND_MAIL` step handed to a delivery port, with the standard
//! transient/definitive failure split.

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

/// One outbound mail as recorded by the business operation that started
/// the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub recipient: String,
    pub template: String,
    pub subject: String,
}

/// Errors from the mail delivery boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailDeliveryError {
    /// Transient outage; the step stays pending for a later run.
    #[error("Mail service unavailable: {0}")]
    Unavailable(String),

    /// Definitive rejection; the step fails and waits for a manual
    /// retrigger.
    #[error("Mail rejected: {0}")]
    Rejected(String),
}

/// Read access to the mail recorded for a process.
#[async_trait]
pub trait MailingStore: Send + Sync {
    async fn pending_mail(&self, process_id: Uuid)
        -> Result<Option<MailMessage>, MailDeliveryError>;
}

/// Outbound mail delivery.
#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailDeliveryError>;
}

/// Executor for [`ProcessTypeId::Mailing`] processes.
///
/// `initialize` only records which process the run is for; the mail
/// itself is fetched inside the step execution, so a transient store
/// outage surfaces as a pending step instead of an aborted run.
pub struct MailingExecutor {
    store: Arc<dyn MailingStore>,
    delivery: Arc<dyn MailDelivery>,
    executable: HashSet<ProcessStepTypeId>,
    current_process: Mutex<Option<Uuid>>,
}

impl MailingExecutor {
    /// Create a new MailingExecutor over the given ports.
    pub fn new(store: Arc<dyn MailingStore>, delivery: Arc<dyn MailDelivery>) -> Self {
        Self {
            store,
            delivery,
            executable: HashSet::from([ProcessStepTypeId::SendMail]),
            current_process: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProcessTypeExecutor for MailingExecutor {
    fn process_type(&self) -> ProcessTypeId {
        ProcessTypeId::Mailing
    }

    fn executable_step_types(&self) -> &HashSet<ProcessStepTypeId> {
        &self.executable
    }

    fn is_lock_requested(&self, _step_type: ProcessStepTypeId) -> bool {
        false
    }

    async fn initialize(
        &self,
        process_id: Uuid,
        _known_steps: &StepTypeIndex,
    ) -> Result<InitializationResult, StepError> {
        *self.current_process.lock().await = Some(process_id);
        Ok(InitializationResult::new(false))
    }

    async fn execute_step(
        &self,
        step_type: ProcessStepTypeId,
        _known_steps: &StepTypeIndex,
        cancellation: CancellationToken,
    ) -> Result<StepExecutionResult, StepError> {
        if step_type != ProcessStepTypeId::SendMail {
            return Err(StepError::Fatal(format!(
                "step type {step_type} is not executable for mailing"
            )));
        }
        if cancellation.is_cancelled() {
            return Err(StepError::Canceled);
        }
        let process_id = (*self.current_process.lock().await)
            .ok_or_else(|| StepError::Fatal("mailing executor not initialized".to_string()))?;

        let message = match self.store.pending_mail(process_id).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                // Nothing to send is broken process data, not a crash.
                return Ok(StepExecutionResult::new(false, StepStatus::Failed)
                    .with_message("no pending mail recorded for this process"));
            }
            Err(MailDeliveryError::Unavailable(_)) => {
                return Ok(StepExecutionResult::new(false, StepStatus::Todo))
            }
            Err(MailDeliveryError::Rejected(text)) => {
                return Ok(StepExecutionResult::new(false, StepStatus::Failed).with_message(text))
            }
        };

        match self.delivery.send(&message).await {
            Ok(()) => Ok(StepExecutionResult::new(false, StepStatus::Done)),
            Err(MailDeliveryError::Unavailable(text)) => {
                tracing::debug!(
                    recipient = %message.recipient,
                    error = %text,
                    "mail service unavailable, leaving step pending"
                );
                Ok(StepExecutionResult::new(false, StepStatus::Todo))
            }
            Err(MailDeliveryError::Rejected(text)) => {
                Ok(StepExecutionResult::new(false, StepStatus::Failed)
                    .with_message(text)
                    .with_schedule([ProcessStepTypeId::RetriggerSendMail]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubStore {
        mail: Option<MailMessage>,
    }

    #[async_trait]
    impl MailingStore for StubStore {
        async fn pending_mail(
            &self,
            _process_id: Uuid,
        ) -> Result<Option<MailMessage>, MailDeliveryError> {
            Ok(self.mail.clone())
        }
    }

    struct StubDelivery {
        outcome: Result<(), MailDeliveryError>,
    }

    #[async_trait]
    impl MailDelivery for StubDelivery {
        async fn send(&self, _message: &MailMessage) -> Result<(), MailDeliveryError> {
            self.outcome.clone()
        }
    }

    fn sample_mail() -> MailMessage {
        MailMessage {
            recipient: "ops@example.com".to_string(),
            template: "credential-expiry".to_string(),
            subject: "Your credential expires soon".to_string(),
        }
    }

    async fn initialized_executor(
        mail: Option<MailMessage>,
        outcome: Result<(), MailDeliveryError>,
    ) -> MailingExecutor {
        let executor = MailingExecutor::new(
            Arc::new(StubStore { mail }),
            Arc::new(StubDelivery { outcome }),
        );
        executor
            .initialize(Uuid::new_v4(), &StepTypeIndex::default())
            .await
            .unwrap();
        executor
    }

    #[tokio::test]
    async fn test_send_mail_success() {
        let executor = initialized_executor(Some(sample_mail()), Ok(())).await;

        let result = executor
            .execute_step(
                ProcessStepTypeId::SendMail,
                &StepTypeIndex::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, StepStatus::Done);
        assert!(result.schedule.is_none());
        assert!(result.message.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_delivery_leaves_step_pending() {
        let executor = initialized_executor(
            Some(sample_mail()),
            Err(MailDeliveryError::Unavailable("smtp timeout".to_string())),
        )
        .await;

        let result = executor
            .execute_step(
                ProcessStepTypeId::SendMail,
                &StepTypeIndex::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, StepStatus::Todo);
        assert!(!result.modified);
    }

    #[tokio::test]
    async fn test_rejected_delivery_fails_step_and_schedules_retrigger() {
        let executor = initialized_executor(
            Some(sample_mail()),
            Err(MailDeliveryError::Rejected(
                "recipient blocked".to_string(),
            )),
        )
        .await;

        let result = executor
            .execute_step(
                ProcessStepTypeId::SendMail,
                &StepTypeIndex::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.message.as_deref(), Some("recipient blocked"));
        assert_eq!(
            result.schedule,
            Some(HashSet::from([ProcessStepTypeId::RetriggerSendMail]))
        );
    }

    #[tokio::test]
    async fn test_missing_mail_fails_without_retrigger() {
        let executor = initialized_executor(None, Ok(())).await;

        let result = executor
            .execute_step(
                ProcessStepTypeId::SendMail,
                &StepTypeIndex::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(
            result.message.as_deref(),
            Some("no pending mail recorded for this process")
        );
        assert!(result.schedule.is_none());
    }

    #[tokio::test]
    async fn test_foreign_step_type_is_fatal() {
        let executor = initialized_executor(Some(sample_mail()), Ok(())).await;

        let result = executor
            .execute_step(
                ProcessStepTypeId::DeleteIdpSharedRealm,
                &StepTypeIndex::default(),
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(StepError::Fatal(_))));
    }

    #[tokio::test]
    async fn test_uninitialized_executor_is_fatal() {
        let executor = MailingExecutor::new(
            Arc::new(StubStore {
                mail: Some(sample_mail()),
            }),
            Arc::new(StubDelivery { outcome: Ok(()) }),
        );

        let result = executor
            .execute_step(
                ProcessStepTypeId::SendMail,
                &StepTypeIndex::default(),
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(StepError::Fatal(_))));
    }
}
