//! Dry-run ports for the demonstration worker.
//!
//! Stand-ins for the identity-provider admin API and the mail service:
//! every outbound call logs what it would have done and succeeds, so a
//! seeded state file can be driven to completion without any
//! infrastructure behind the worker.

use async_trait::async_trait;
use sk_core::executors::{
    IdentityProviderClient, IdpClientError, IdpDeletionData, IdpDeletionStore, MailDelivery,
    MailDeliveryError, MailMessage, MailingStore,
};
use uuid::Uuid;

/// Store answering every process with deletion data derived from its id.
pub struct DryRunIdpStore;

#[async_trait]
impl IdpDeletionStore for DryRunIdpStore {
    async fn deletion_data(
        &self,
        process_id: Uuid,
    ) -> Result<Option<IdpDeletionData>, IdpClientError> {
        let hex = process_id.simple().to_string();
        let short = &hex[..8];
        Ok(Some(IdpDeletionData {
            idp_alias: format!("idp-{short}"),
            shared_realm: format!("realm-{short}"),
            service_account_client_id: format!("sa-{short}"),
        }))
    }
}

/// Client that logs each teardown call instead of performing it.
pub struct DryRunIdpClient;

#[async_trait]
impl IdentityProviderClient for DryRunIdpClient {
    async fn delete_shared_realm(&self, data: &IdpDeletionData) -> Result<(), IdpClientError> {
        tracing::info!(realm = %data.shared_realm, "dry run: would delete shared realm");
        Ok(())
    }

    async fn delete_shared_service_account(
        &self,
        data: &IdpDeletionData,
    ) -> Result<(), IdpClientError> {
        tracing::info!(
            client_id = %data.service_account_client_id,
            "dry run: would delete shared service account"
        );
        Ok(())
    }

    async fn delete_central_identity_provider(
        &self,
        data: &IdpDeletionData,
    ) -> Result<(), IdpClientError> {
        tracing::info!(
            idp_alias = %data.idp_alias,
            "dry run: would delete central identity provider"
        );
        Ok(())
    }
}

/// Store answering every process with a notification mail.
pub struct DryRunMailStore;

#[async_trait]
impl MailingStore for DryRunMailStore {
    async fn pending_mail(
        &self,
        process_id: Uuid,
    ) -> Result<Option<MailMessage>, MailDeliveryError> {
        Ok(Some(MailMessage {
            recipient: "operator@example.com".to_string(),
            template: "process-notification".to_string(),
            subject: format!("Update for process {process_id}"),
        }))
    }
}

/// Delivery that logs the mail instead of sending it.
pub struct DryRunMailDelivery;

#[async_trait]
impl MailDelivery for DryRunMailDelivery {
    async fn send(&self, message: &MailMessage) -> Result<(), MailDeliveryError> {
        tracing::info!(
            recipient = %message.recipient,
            template = %message.template,
            subject = %message.subject,
            "dry run: would send mail"
        );
        Ok(())
    }
}
