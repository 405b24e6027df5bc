//! Snapshot serialization: the wizard as a UI sees it, to JSON.
//!
//! A snapshot is taken after every command in IPC mode. It captures
//! everything needed to render the current step without replaying the
//! command stream.

use crate::{
    event::Notification,
    reference::SelectOption,
    route::WizardStep,
    state::WizardState,
    types::SessionId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub session_id:      SessionId,
    pub step:            WizardStep,
    pub path:            String,
    pub edit_mode:       bool,
    pub closed:          bool,
    pub state_version:   u64,
    pub state:           WizardState,
    pub notifications:   Vec<Notification>,
    pub submitting:      bool,
    pub product_types:   Vec<SelectOption>,
    pub mandate_types:   Vec<SelectOption>,
    pub signatories:     Vec<SelectOption>,
}

impl WizardSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
