//! Completion gates: pure predicates deciding whether "Next" may navigate.

use crate::{
    route::WizardStep,
    state::{CustomerType, WizardState},
};
use serde::{Deserialize, Serialize};

pub const GATE_FAILURE_TITLE: &str = "Data Not Saved";
pub const GATE_FAILURE_DESCRIPTION: &str = "Please save data before proceeding";

/// Why forward navigation was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFailure {
    pub step:        WizardStep,
    pub title:       String,
    pub description: String,
}

impl GateFailure {
    fn not_saved(step: WizardStep) -> Self {
        Self {
            step,
            title:       GATE_FAILURE_TITLE.into(),
            description: GATE_FAILURE_DESCRIPTION.into(),
        }
    }

    fn with_description(step: WizardStep, description: &str) -> Self {
        Self {
            step,
            title:       GATE_FAILURE_TITLE.into(),
            description: description.into(),
        }
    }
}

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

pub fn kyc_gate(state: &WizardState) -> bool {
    let Some(customer_type) = state.customer_type() else {
        return false;
    };
    if state.account_owners().is_empty() {
        return false;
    }
    match customer_type {
        CustomerType::Retail   => true,
        CustomerType::Business => {
            filled(state.legal_entity_name()) && !state.other_kycs().is_empty()
        }
    }
}

pub fn product_gate(state: &WizardState) -> bool {
    state.product_input.is_complete()
}

/// The customer-creation call must have succeeded: either the customer and
/// business ids are both known, or the retail id is.
pub fn mandate_gate(state: &WizardState) -> bool {
    (filled(state.customer.as_deref()) && filled(state.business.as_deref()))
        || filled(state.retail.as_deref())
}

pub fn mandate_rule_gate(state: &WizardState) -> bool {
    filled(state.customer.as_deref())
}

/// Evaluate the gate guarding the move out of `step`.
pub fn check(step: WizardStep, state: &WizardState) -> Result<(), GateFailure> {
    let passed = match step {
        WizardStep::Kyc          => kyc_gate(state),
        WizardStep::Products     => product_gate(state),
        WizardStep::Mandates     => mandate_gate(state),
        WizardStep::MandateRules => mandate_rule_gate(state),
        WizardStep::Done         => false,
    };
    if passed {
        return Ok(());
    }
    Err(match step {
        WizardStep::Kyc if state.customer_type().is_none() => {
            GateFailure::with_description(step, "Please select a customer type before proceeding")
        }
        WizardStep::Done => GateFailure::with_description(step, "The wizard is already complete"),
        _ => GateFailure::not_saved(step),
    })
}
