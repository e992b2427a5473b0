//! Process records and process type identifiers.
//!
//! This module defines the structures for tracking long-running business
//! processes as they live in a process store.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies which kind of business process a [`Process`] record represents.
///
/// Every process type is served by at most one registered executor. A store
/// may contain processes of types no executor is registered for; those are
/// simply never picked up by the execution service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessTypeId {
    /// Onboarding checklist for a newly registered company.
    ApplicationChecklist,

    /// Activation and deactivation steps for an offer subscription.
    OfferSubscription,

    /// Outbound mail delivery.
    Mailing,

    /// Creation of a managed identity provider.
    IdentityProviderProvisioning,

    /// Teardown of a managed identity provider and its shared artifacts.
    IdentityProviderDeletion,

    /// Self description document creation through an external factory.
    SelfDescriptionCreation,
}

impl fmt::Display for ProcessTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApplicationChecklist => "APPLICATION_CHECKLIST",
            Self::OfferSubscription => "OFFER_SUBSCRIPTION",
            Self::Mailing => "MAILING",
            Self::IdentityProviderProvisioning => "IDENTITY_PROVIDER_PROVISIONING",
            Self::IdentityProviderDeletion => "IDENTITY_PROVIDER_DELETION",
            Self::SelfDescriptionCreation => "SELF_DESCRIPTION_CREATION",
        };
        f.pad(name)
    }
}

/// A persisted business process.
///
/// A process is little more than an identity plus a type tag; all execution
/// state lives in the process steps attached to it. A process counts as
/// active as long as at least one of its steps is still `TODO`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Process {
    /// Unique identifier for this process.
    ///
    /// Generated when the process is created and used to correlate
    /// all of its steps.
    pub id: Uuid,

    /// The kind of business process this record represents.
    pub process_type: ProcessTypeId,
}

impl Process {
    /// Creates a new process of the given type with a fresh id.
    pub fn new(process_type: ProcessTypeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            process_type,
        }
    }
}
