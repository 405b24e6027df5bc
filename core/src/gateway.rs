//! The Remote Data Gateway contract.
//!
//! RULE: The wizard depends only on operation names, input fields and the
//! output fields it reads back. Transport, auth headers and caching belong
//! to whoever implements `RemoteGateway`.
//!
//! Field names serialize in camelCase so payloads line up with the
//! GraphQL operations of the back-office API.

use crate::types::{EntityId, KycId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every named query and mutation the wizard may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    // ── Queries ───────────────────────────────────
    IndividualKycs,
    BusinessKycs,
    ProductTypes,
    MandateTypes,
    Customer,

    // ── Mutations ─────────────────────────────────
    CreateMandate,
    UpdateMandate,
    DeleteMandate,
    CreateRetail,
    UpdateRetail,
    DeleteRetail,
    CreateBusiness,
    UpdateBusiness,
    DeleteBusiness,
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
    CreateAccount,
    UpdateAccount,
    DeleteAccount,
    CreateMandateRule,
    UpdateMandateRule,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IndividualKycs    => "individualKYCs",
            Self::BusinessKycs      => "businessKYCs",
            Self::ProductTypes      => "productTypes",
            Self::MandateTypes      => "mandateTypes",
            Self::Customer          => "customer",
            Self::CreateMandate     => "createMandate",
            Self::UpdateMandate     => "updateMandate",
            Self::DeleteMandate     => "deleteMandate",
            Self::CreateRetail      => "createRetail",
            Self::UpdateRetail      => "updateRetail",
            Self::DeleteRetail      => "deleteRetail",
            Self::CreateBusiness    => "createBusiness",
            Self::UpdateBusiness    => "updateBusiness",
            Self::DeleteBusiness    => "deleteBusiness",
            Self::CreateCustomer    => "createCustomer",
            Self::UpdateCustomer    => "updateCustomer",
            Self::DeleteCustomer    => "deleteCustomer",
            Self::CreateAccount     => "createAccount",
            Self::UpdateAccount     => "updateAccount",
            Self::DeleteAccount     => "deleteAccount",
            Self::CreateMandateRule => "createMandateRule",
            Self::UpdateMandateRule => "updateMandateRule",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::IndividualKycs
                | Self::BusinessKycs
                | Self::ProductTypes
                | Self::MandateTypes
                | Self::Customer
        )
    }

    /// Look an operation up by its wire name ("createCustomer").
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_OPERATIONS.iter().copied().find(|op| op.name() == name)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub const ALL_OPERATIONS: [Operation; 22] = [
    Operation::IndividualKycs,
    Operation::BusinessKycs,
    Operation::ProductTypes,
    Operation::MandateTypes,
    Operation::Customer,
    Operation::CreateMandate,
    Operation::UpdateMandate,
    Operation::DeleteMandate,
    Operation::CreateRetail,
    Operation::UpdateRetail,
    Operation::DeleteRetail,
    Operation::CreateBusiness,
    Operation::UpdateBusiness,
    Operation::DeleteBusiness,
    Operation::CreateCustomer,
    Operation::UpdateCustomer,
    Operation::DeleteCustomer,
    Operation::CreateAccount,
    Operation::UpdateAccount,
    Operation::DeleteAccount,
    Operation::CreateMandateRule,
    Operation::UpdateMandateRule,
];

/// A failed remote call. `message` is whatever the server said, if anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {}", .message.as_deref().unwrap_or("no message"))]
pub struct GatewayError {
    pub operation: Operation,
    pub message:   Option<String>,
}

impl GatewayError {
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: Some(message.into()),
        }
    }

    pub fn without_message(operation: Operation) -> Self {
        Self {
            operation,
            message: None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

// ── Reference data ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualKyc {
    #[serde(rename = "IndividualKYCId")]
    pub individual_kyc_id: KycId,
    pub kyc_type:          String,
    pub first_name:        String,
    pub last_name:         String,
    pub risk_rating:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessKyc {
    #[serde(rename = "businessKYCId")]
    pub business_kyc_id:   KycId,
    pub kyc_type:          String,
    pub legal_entity_name: String,
    pub risk_rating:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub product_type_id:   EntityId,
    pub product_type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateType {
    pub mandate_type_id:   EntityId,
    pub mandate_type_name: String,
    pub mandate_type_code: String,
}

// ── Mandate ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateInput {
    pub signatory:    String,
    pub mandate_type: String,
    pub category:     String,
    pub modified_by:  String,
    pub modified_on:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateRecord {
    pub mandate_id:   EntityId,
    pub signatory:    String,
    pub mandate_type: String,
    pub category:     String,
    pub modified_by:  String,
    pub modified_on:  String,
}

// ── Retail / Business ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailInput {
    pub retail_type:      String,
    pub individual_kyc:   KycId,
    pub product_types:    String,
    pub account_currency: String,
    pub risk_rating:      String,
    pub account_mandates: Vec<EntityId>,
    pub modified_by:      String,
    pub modified_on:      String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailRecord {
    pub retail_id: EntityId,
    #[serde(flatten)]
    pub fields:    RetailInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInput {
    pub legal_entity_name: String,
    pub business_kyc:      KycId,
    pub directors_kyc:     KycId,
    pub product_types:     String,
    pub account_currency:  String,
    pub risk_rating:       String,
    pub account_mandates:  Vec<EntityId>,
    pub modified_by:       String,
    pub modified_on:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub business_id: EntityId,
    #[serde(flatten)]
    pub fields:      BusinessInput,
}

// ── Customer ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub customer_type:    String,
    pub retail:           Option<EntityId>,
    pub business:         Option<EntityId>,
    pub accounts:         Vec<EntityId>,
    pub account_mandates: Vec<EntityId>,
    pub mandate_rules:    Vec<EntityId>,
    pub modified_by:      String,
    pub modified_on:      String,
}

/// Partial customer update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub customer_id:      EntityId,
    pub customer_type:    Option<String>,
    pub retail:           Option<EntityId>,
    pub business:         Option<EntityId>,
    pub accounts:         Option<Vec<EntityId>>,
    pub account_mandates: Option<Vec<EntityId>>,
    pub mandate_rules:    Option<Vec<EntityId>>,
    pub modified_by:      String,
    pub modified_on:      String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_id:      EntityId,
    pub customer_type:    String,
    pub retail:           Option<EntityId>,
    pub business:         Option<EntityId>,
    pub accounts:         Vec<EntityId>,
    pub account_mandates: Vec<EntityId>,
    pub mandate_rules:    Vec<EntityId>,
    pub modified_by:      String,
    pub modified_on:      String,
}

// ── Account ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    pub name:           String,
    pub account_owner:  EntityId,
    pub account_number: String,
    pub description:    String,
    pub account_type:   String,
    pub branch_id:      String,
    pub normal_balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id:     EntityId,
    #[serde(flatten)]
    pub fields: AccountInput,
}

// ── Mandate rule ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateRuleInput {
    pub customer_id:                EntityId,
    pub mandate_type:               String,
    pub signing_rule:               String,
    pub minimum_transaction_amount: String,
    pub maximum_transaction_amount: String,
    pub maximum_daily_limit:        String,
    pub modified_by:                String,
    pub modified_on:                String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateRuleRecord {
    pub mandate_rule_id: EntityId,
    #[serde(flatten)]
    pub fields:          MandateRuleInput,
}

/// The full server view of an existing customer, used to drive edit mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    pub customer:      CustomerRecord,
    pub retail:        Option<RetailRecord>,
    pub business:      Option<BusinessRecord>,
    pub mandates:      Vec<MandateRecord>,
    pub accounts:      Vec<AccountRecord>,
    pub mandate_rules: Vec<MandateRuleRecord>,
}

/// The back-office API as seen by the wizard.
///
/// Methods take `&mut self` so implementations may keep per-call state
/// (counters, fault scripts) without interior mutability.
pub trait RemoteGateway {
    // Queries
    fn individual_kycs(&mut self) -> GatewayResult<Vec<IndividualKyc>>;
    fn business_kycs(&mut self) -> GatewayResult<Vec<BusinessKyc>>;
    fn product_types(&mut self) -> GatewayResult<Vec<ProductType>>;
    fn mandate_types(&mut self) -> GatewayResult<Vec<MandateType>>;
    fn customer(&mut self, customer_id: &str) -> GatewayResult<Option<CustomerData>>;

    // Mandates
    fn create_mandate(&mut self, input: &MandateInput) -> GatewayResult<MandateRecord>;
    fn update_mandate(&mut self, mandate_id: &str, input: &MandateInput) -> GatewayResult<MandateRecord>;
    fn delete_mandate(&mut self, mandate_id: &str) -> GatewayResult<()>;

    // Retail
    fn create_retail(&mut self, input: &RetailInput) -> GatewayResult<RetailRecord>;
    fn update_retail(&mut self, retail_id: &str, input: &RetailInput) -> GatewayResult<RetailRecord>;
    fn delete_retail(&mut self, retail_id: &str) -> GatewayResult<()>;

    // Business
    fn create_business(&mut self, input: &BusinessInput) -> GatewayResult<BusinessRecord>;
    fn update_business(&mut self, business_id: &str, input: &BusinessInput) -> GatewayResult<BusinessRecord>;
    fn delete_business(&mut self, business_id: &str) -> GatewayResult<()>;

    // Customer
    fn create_customer(&mut self, input: &CustomerInput) -> GatewayResult<CustomerRecord>;
    fn update_customer(&mut self, update: &CustomerUpdate) -> GatewayResult<CustomerRecord>;
    fn delete_customer(&mut self, customer_id: &str) -> GatewayResult<()>;

    // Account
    fn create_account(&mut self, input: &AccountInput) -> GatewayResult<AccountRecord>;
    fn update_account(&mut self, account_id: &str, input: &AccountInput) -> GatewayResult<AccountRecord>;
    fn delete_account(&mut self, account_id: &str) -> GatewayResult<()>;

    // Mandate rules
    fn create_mandate_rule(&mut self, input: &MandateRuleInput) -> GatewayResult<MandateRuleRecord>;
    fn update_mandate_rule(
        &mut self,
        mandate_rule_id: &str,
        input: &MandateRuleInput,
    ) -> GatewayResult<MandateRuleRecord>;
}
