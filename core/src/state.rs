//! Shared wizard state and its copy-on-write container.
//!
//! RULE: Nothing mutates a `WizardState` in place. Every write builds a new
//! snapshot and bumps the container version, so a snapshot handed to a
//! step stays valid (and unchanged) for as long as the step holds it.

use crate::{
    error::{WizardError, WizardResult},
    gateway::{CustomerData, MandateRecord, MandateRuleRecord},
    types::{EntityId, KycId},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Retail,
    Business,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retail   => "retail",
            Self::Business => "business",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retail"   => Some(Self::Retail),
            "business" => Some(Self::Business),
            _          => None,
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staged reference to an existing KYC record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRef {
    pub kyc_id:     KycId,
    pub kyc_type:   String,
    pub name:       String,
    pub created_by: String,
    pub status:     String,
}

/// Customer-type specific data. Each variant carries only the fields that
/// are valid for it, so a retail wizard can never hold director KYCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "customerType", rename_all = "lowercase")]
pub enum CustomerProfile {
    Retail {
        #[serde(rename = "accountOwners")]
        account_owners: Vec<KycRef>,
    },
    Business {
        #[serde(rename = "legalEntityName")]
        legal_entity_name: Option<String>,
        #[serde(rename = "accountOwners")]
        account_owners: Vec<KycRef>,
        #[serde(rename = "otherKYCs")]
        other_kycs: Vec<KycRef>,
    },
}

impl CustomerProfile {
    pub fn empty(customer_type: CustomerType) -> Self {
        match customer_type {
            CustomerType::Retail => Self::Retail {
                account_owners: Vec::new(),
            },
            CustomerType::Business => Self::Business {
                legal_entity_name: None,
                account_owners:    Vec::new(),
                other_kycs:        Vec::new(),
            },
        }
    }

    pub fn customer_type(&self) -> CustomerType {
        match self {
            Self::Retail { .. }   => CustomerType::Retail,
            Self::Business { .. } => CustomerType::Business,
        }
    }

    pub fn account_owners(&self) -> &[KycRef] {
        match self {
            Self::Retail { account_owners } | Self::Business { account_owners, .. } => {
                account_owners
            }
        }
    }

    /// Director KYCs; always empty for retail.
    pub fn other_kycs(&self) -> &[KycRef] {
        match self {
            Self::Retail { .. }               => &[],
            Self::Business { other_kycs, .. } => other_kycs,
        }
    }

    pub fn legal_entity_name(&self) -> Option<&str> {
        match self {
            Self::Retail { .. } => None,
            Self::Business {
                legal_entity_name, ..
            } => legal_entity_name.as_deref(),
        }
    }
}

/// Product selection as typed into the form (all strings, possibly empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub product_types:    String,
    pub account_currency: String,
    pub risk_rating:      String,
}

impl ProductInput {
    pub fn new(
        product_types: impl Into<String>,
        account_currency: impl Into<String>,
        risk_rating: impl Into<String>,
    ) -> Self {
        Self {
            product_types:    product_types.into(),
            account_currency: account_currency.into(),
            risk_rating:      risk_rating.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.product_types.trim().is_empty()
            && !self.account_currency.trim().is_empty()
            && !self.risk_rating.trim().is_empty()
    }
}

/// Product selection as confirmed by the server (edit mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedProduct {
    pub product_type_id:  EntityId,
    pub account_currency: String,
    pub risk_rating:      String,
}

impl ConfirmedProduct {
    pub fn is_complete(&self) -> bool {
        !self.product_type_id.is_empty()
            && !self.account_currency.is_empty()
            && !self.risk_rating.is_empty()
    }

    pub fn as_input(&self) -> ProductInput {
        ProductInput::new(
            self.product_type_id.clone(),
            self.account_currency.clone(),
            self.risk_rating.clone(),
        )
    }
}

/// Everything accumulated across the wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    /// `None` until the customer type is chosen on the first step.
    pub profile:       Option<CustomerProfile>,
    pub product_input: ProductInput,
    pub product:       Option<ConfirmedProduct>,
    pub mandates:      Vec<MandateRecord>,
    pub customer:      Option<EntityId>,
    pub business:      Option<EntityId>,
    pub retail:        Option<EntityId>,
    pub account:       Option<EntityId>,
    pub mandate_rules: Vec<MandateRuleRecord>,
    /// Full server record; only set in edit mode.
    pub customer_data: Option<CustomerData>,
}

impl WizardState {
    pub fn customer_type(&self) -> Option<CustomerType> {
        self.profile.as_ref().map(CustomerProfile::customer_type)
    }

    pub fn account_owners(&self) -> &[KycRef] {
        self.profile
            .as_ref()
            .map(CustomerProfile::account_owners)
            .unwrap_or(&[])
    }

    pub fn other_kycs(&self) -> &[KycRef] {
        self.profile
            .as_ref()
            .map(CustomerProfile::other_kycs)
            .unwrap_or(&[])
    }

    pub fn legal_entity_name(&self) -> Option<&str> {
        self.profile.as_ref().and_then(CustomerProfile::legal_entity_name)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.customer_data.is_some()
    }

    /// The product the save protocol should send: the staged input when it
    /// is complete, otherwise the server-confirmed product.
    pub fn effective_product(&self) -> Option<ProductInput> {
        if self.product_input.is_complete() {
            return Some(self.product_input.clone());
        }
        self.product
            .as_ref()
            .filter(|p| p.is_complete())
            .map(ConfirmedProduct::as_input)
    }

    /// Select (or switch) the customer type. Switching replaces the profile
    /// variant, dropping KYC entries staged for the previous type.
    pub fn with_customer_type(&self, customer_type: CustomerType) -> WizardState {
        if self.customer_type() == Some(customer_type) {
            return self.clone();
        }
        WizardState {
            profile: Some(CustomerProfile::empty(customer_type)),
            ..self.clone()
        }
    }
}

/// A shallow-merge write: every `Some` field replaces the current value.
#[derive(Debug, Clone, Default)]
pub struct WizardPatch {
    pub profile:       Option<CustomerProfile>,
    pub product_input: Option<ProductInput>,
    pub product:       Option<Option<ConfirmedProduct>>,
    pub mandates:      Option<Vec<MandateRecord>>,
    pub customer:      Option<Option<EntityId>>,
    pub business:      Option<Option<EntityId>>,
    pub retail:        Option<Option<EntityId>>,
    pub account:       Option<Option<EntityId>>,
    pub mandate_rules: Option<Vec<MandateRuleRecord>>,
    pub customer_data: Option<Option<CustomerData>>,
}

impl WizardPatch {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self.product_input.is_none()
            && self.product.is_none()
            && self.mandates.is_none()
            && self.customer.is_none()
            && self.business.is_none()
            && self.retail.is_none()
            && self.account.is_none()
            && self.mandate_rules.is_none()
            && self.customer_data.is_none()
    }

    fn merge_into(self, base: &WizardState) -> WizardState {
        let mut next = base.clone();
        if let Some(v) = self.profile       { next.profile = Some(v); }
        if let Some(v) = self.product_input { next.product_input = v; }
        if let Some(v) = self.product       { next.product = v; }
        if let Some(v) = self.mandates      { next.mandates = v; }
        if let Some(v) = self.customer      { next.customer = v; }
        if let Some(v) = self.business      { next.business = v; }
        if let Some(v) = self.retail        { next.retail = v; }
        if let Some(v) = self.account       { next.account = v; }
        if let Some(v) = self.mandate_rules { next.mandate_rules = v; }
        if let Some(v) = self.customer_data { next.customer_data = v; }
        next
    }
}

/// Owner of the current `WizardState` snapshot.
#[derive(Debug, Default)]
pub struct StateContainer {
    current: Arc<WizardState>,
    version: u64,
}

impl StateContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Cheap; later writes never change it.
    pub fn snapshot(&self) -> Arc<WizardState> {
        Arc::clone(&self.current)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Shallow-merge `patch` into the current state. Empty patches are no-ops.
    pub fn apply(&mut self, patch: WizardPatch) -> u64 {
        if patch.is_empty() {
            return self.version;
        }
        let next = patch.merge_into(&self.current);
        self.replace(next)
    }

    /// Derive the next state from the current one.
    pub fn update<F>(&mut self, f: F) -> u64
    where
        F: FnOnce(&WizardState) -> WizardState,
    {
        let next = f(&self.current);
        self.replace(next)
    }

    /// Like `update`, but refuses to write when the version moved since
    /// the caller read its snapshot.
    pub fn update_if_version<F>(&mut self, expected: u64, f: F) -> WizardResult<u64>
    where
        F: FnOnce(&WizardState) -> WizardState,
    {
        if self.version != expected {
            return Err(WizardError::StaleWrite {
                expected,
                actual: self.version,
            });
        }
        Ok(self.update(f))
    }

    /// `apply` guarded by the version the caller planned against.
    pub fn apply_if_version(&mut self, expected: u64, patch: WizardPatch) -> WizardResult<u64> {
        self.update_if_version(expected, |current| patch.merge_into(current))
    }

    /// Drop everything (wizard completed or abandoned).
    pub fn reset(&mut self) -> u64 {
        self.replace(WizardState::default())
    }

    fn replace(&mut self, next: WizardState) -> u64 {
        self.current = Arc::new(next);
        self.version += 1;
        self.version
    }
}
