//! Wizard events and user-facing notifications.
//!
//! RULE: Every state transition, remote-call outcome and notification is
//! recorded as a `WizardEvent`, in the order it happened.

use crate::{
    route::WizardStep,
    state::CustomerType,
    types::{EntityId, KycId, SessionId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// A dismissible toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title:       String,
    pub description: String,
    pub variant:     NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title:       title.into(),
            description: description.into(),
            variant:     NotificationVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title:       title.into(),
            description: description.into(),
            variant:     NotificationVariant::Destructive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    // ── Lifecycle ──────────────────────────────────
    WizardStarted {
        session_id: SessionId,
        edit_customer: Option<EntityId>,
    },
    StepEntered {
        step: WizardStep,
        path: String,
    },
    GateBlocked {
        step: WizardStep,
        reason: String,
    },
    WizardCompleted {
        customer_id: Option<EntityId>,
    },
    WizardAbandoned {
        step: WizardStep,
    },

    // ── Staging ────────────────────────────────────
    CustomerTypeSelected {
        customer_type: CustomerType,
        dropped_kycs: usize,
    },
    KycStaged {
        list: String,
        kyc_id: KycId,
    },
    KycDuplicateIgnored {
        list: String,
        kyc_id: KycId,
    },
    KycRemoved {
        list: String,
        kyc_id: KycId,
    },
    ProductStaged {
        product_types: String,
    },
    CustomerLoaded {
        customer_id: EntityId,
    },

    // ── Remote protocol ────────────────────────────
    SaveCommitted {
        step: WizardStep,
        calls: Vec<String>,
    },
    SaveFailed {
        step: WizardStep,
        failed_call: String,
        message: Option<String>,
        compensated: Vec<String>,
    },
    SaveAbandoned {
        step: WizardStep,
        before_call: String,
    },
    ResponseDiscarded {
        step: WizardStep,
    },

    // ── Notifications ──────────────────────────────
    Notified {
        notification: Notification,
    },
}

impl WizardEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::WizardStarted { .. }        => "wizard_started",
            Self::StepEntered { .. }          => "step_entered",
            Self::GateBlocked { .. }          => "gate_blocked",
            Self::WizardCompleted { .. }      => "wizard_completed",
            Self::WizardAbandoned { .. }      => "wizard_abandoned",
            Self::CustomerTypeSelected { .. } => "customer_type_selected",
            Self::KycStaged { .. }            => "kyc_staged",
            Self::KycDuplicateIgnored { .. }  => "kyc_duplicate_ignored",
            Self::KycRemoved { .. }           => "kyc_removed",
            Self::ProductStaged { .. }        => "product_staged",
            Self::CustomerLoaded { .. }       => "customer_loaded",
            Self::SaveCommitted { .. }        => "save_committed",
            Self::SaveFailed { .. }           => "save_failed",
            Self::SaveAbandoned { .. }        => "save_abandoned",
            Self::ResponseDiscarded { .. }    => "response_discarded",
            Self::Notified { .. }             => "notified",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub seq:        u64,
    pub step:       WizardStep,
    pub event_type: String,
    pub payload:    String, // JSON-serialized WizardEvent
}
