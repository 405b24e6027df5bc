use crate::{
    kyc_step::KycList,
    mandate_rule_step::MandateRuleTuple,
    mandate_step::MandateTuple,
    state::{CustomerType, ProductInput},
    types::{EntityId, KycId},
};
use serde::{Deserialize, Serialize};

/// Everything a user can do to the wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum WizardCommand {
    // ── Navigation ────────────────────────────────
    Next,
    Back,
    Abandon,

    // ── KYC step ──────────────────────────────────
    SelectCustomerType { customer_type: CustomerType },
    SelectKyc { list: KycList, kyc_id: KycId },
    RemoveKyc { list: KycList, kyc_id: KycId },

    // ── Products step ─────────────────────────────
    SaveProduct { product: ProductInput },

    // ── Mandates step ─────────────────────────────
    SubmitMandates { mandates: Vec<MandateTuple> },

    // ── Mandate rules step ────────────────────────
    SubmitMandateRules { rules: Vec<MandateRuleTuple> },

    // ── Data loading ──────────────────────────────
    LoadReferenceData,
    LoadCustomer {
        customer_id: EntityId,
        #[serde(default)]
        return_to:   Option<String>,
    },
    DismissNotification { index: usize },
}

impl WizardCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Next                     => "next",
            Self::Back                     => "back",
            Self::Abandon                  => "abandon",
            Self::SelectCustomerType { .. } => "select_customer_type",
            Self::SelectKyc { .. }         => "select_kyc",
            Self::RemoveKyc { .. }         => "remove_kyc",
            Self::SaveProduct { .. }       => "save_product",
            Self::SubmitMandates { .. }    => "submit_mandates",
            Self::SubmitMandateRules { .. } => "submit_mandate_rules",
            Self::LoadReferenceData        => "load_reference_data",
            Self::LoadCustomer { .. }      => "load_customer",
            Self::DismissNotification { .. } => "dismiss_notification",
        }
    }
}
