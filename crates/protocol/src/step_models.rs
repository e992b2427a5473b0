//! Process step records, step types, and step statuses.
//!
//! Steps are the unit of work the execution engine schedules and drives.
//! Each step carries a type drawn from a closed enumeration and a status
//! that moves from `TODO` to exactly one final state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies the kind of work a single process step stands for.
///
/// The enumeration is closed: executors, stores, and the engine all agree
/// on this set, and a step type never changes after the step is created.
/// Retrigger step types are the manual-restart counterparts of steps that
/// can fail; scheduling one is an operator action, executing one reschedules
/// the step it retriggers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStepTypeId {
    /// Request a business partner number for a new company.
    CreateBusinessPartnerNumber,

    /// Create the identity wallet for a new company.
    CreateIdentityWallet,

    /// Activate the application once all checks have passed.
    ActivateApplication,

    /// Send a single outbound mail.
    SendMail,

    /// Manual restart of a failed [`Self::SendMail`] step.
    RetriggerSendMail,

    /// Delete the shared realm of an identity provider.
    DeleteIdpSharedRealm,

    /// Delete the service account attached to the shared realm.
    DeleteIdpSharedServiceaccount,

    /// Delete the identity provider from the central instance.
    DeleteCentralIdentityProvider,

    /// Manual restart of a failed [`Self::DeleteIdpSharedRealm`] step.
    RetriggerDeleteIdpSharedRealm,

    /// Manual restart of a failed [`Self::DeleteIdpSharedServiceaccount`] step.
    RetriggerDeleteIdpSharedServiceaccount,

    /// Manual restart of a failed [`Self::DeleteCentralIdentityProvider`] step.
    RetriggerDeleteCentralIdentityProvider,
}

impl ProcessStepTypeId {
    /// Returns the retrigger step type for a step that failed, if the step
    /// supports manual restarts.
    ///
    /// # Returns
    ///
    /// `Some` with the retrigger counterpart, or `None` for step types that
    /// are not restartable (including retrigger steps themselves).
    pub fn retrigger_step(&self) -> Option<Self> {
        match self {
            Self::SendMail => Some(Self::RetriggerSendMail),
            Self::DeleteIdpSharedRealm => Some(Self::RetriggerDeleteIdpSharedRealm),
            Self::DeleteIdpSharedServiceaccount => {
                Some(Self::RetriggerDeleteIdpSharedServiceaccount)
            }
            Self::DeleteCentralIdentityProvider => {
                Some(Self::RetriggerDeleteCentralIdentityProvider)
            }
            _ => None,
        }
    }

    /// Returns the step a retrigger step restarts when executed.
    ///
    /// This is the inverse of [`Self::retrigger_step`]: `None` for every
    /// step type that is not a retrigger step.
    pub fn retriggered_step(&self) -> Option<Self> {
        match self {
            Self::RetriggerSendMail => Some(Self::SendMail),
            Self::RetriggerDeleteIdpSharedRealm => Some(Self::DeleteIdpSharedRealm),
            Self::RetriggerDeleteIdpSharedServiceaccount => {
                Some(Self::DeleteIdpSharedServiceaccount)
            }
            Self::RetriggerDeleteCentralIdentityProvider => {
                Some(Self::DeleteCentralIdentityProvider)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProcessStepTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateBusinessPartnerNumber => "CREATE_BUSINESS_PARTNER_NUMBER",
            Self::CreateIdentityWallet => "CREATE_IDENTITY_WALLET",
            Self::ActivateApplication => "ACTIVATE_APPLICATION",
            Self::SendMail => "SEND_MAIL",
            Self::RetriggerSendMail => "RETRIGGER_SEND_MAIL",
            Self::DeleteIdpSharedRealm => "DELETE_IDP_SHARED_REALM",
            Self::DeleteIdpSharedServiceaccount => "DELETE_IDP_SHARED_SERVICEACCOUNT",
            Self::DeleteCentralIdentityProvider => "DELETE_CENTRAL_IDENTITY_PROVIDER",
            Self::RetriggerDeleteIdpSharedRealm => "RETRIGGER_DELETE_IDP_SHARED_REALM",
            Self::RetriggerDeleteIdpSharedServiceaccount => {
                "RETRIGGER_DELETE_IDP_SHARED_SERVICEACCOUNT"
            }
            Self::RetriggerDeleteCentralIdentityProvider => {
                "RETRIGGER_DELETE_CENTRAL_IDENTITY_PROVIDER"
            }
        };
        f.pad(name)
    }
}

/// Represents the current lifecycle status of a single process step.
///
/// A step starts as `TODO` and moves to exactly one of the final states:
///
/// - `DONE`: The step ran to completion.
/// - `FAILED`: The step ran and hit a non-recoverable error.
/// - `SKIPPED`: An executor decided the step is not applicable.
/// - `DUPLICATE`: The step lost a first-wins race against an earlier
///   pending step of the same type.
///
/// Final states are never left again; a restart happens by scheduling a
/// fresh `TODO` step of the same type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Step is pending and eligible for execution.
    Todo,

    /// Step ran to completion.
    Done,

    /// Step hit a non-recoverable error.
    Failed,

    /// Step was deemed not applicable by its executor.
    Skipped,

    /// Step lost a first-wins race against another pending step.
    Duplicate,
}

impl StepStatus {
    /// Returns `true` for every status a step can never leave again.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Todo)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Todo => "TODO",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Duplicate => "DUPLICATE",
        };
        f.pad(name)
    }
}

/// A persisted process step.
///
/// Steps are append-mostly: the engine creates them as `TODO` and later
/// flips the status exactly once. Nothing else about a step ever changes
/// except the optional message and the change timestamp.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProcessStep {
    /// Unique identifier for this step.
    pub id: Uuid,

    /// The process this step belongs to.
    pub process_id: Uuid,

    /// The kind of work this step stands for. Immutable after creation.
    pub step_type: ProcessStepTypeId,

    /// Current lifecycle status.
    pub status: StepStatus,

    /// Optional human-readable detail, typically an error description
    /// attached when the step failed.
    pub message: Option<String>,

    /// When the step record was created.
    pub date_created: DateTime<Utc>,

    /// When the status or message last changed, if ever.
    pub date_last_changed: Option<DateTime<Utc>>,
}

impl ProcessStep {
    /// Creates a fresh `TODO` step for the given process.
    pub fn new(process_id: Uuid, step_type: ProcessStepTypeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            process_id,
            step_type,
            status: StepStatus::Todo,
            message: None,
            date_created: Utc::now(),
            date_last_changed: None,
        }
    }
}
