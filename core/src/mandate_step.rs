//! Mandate entry and the onboarding save protocol.
//!
//! EXECUTION ORDER (fixed; each call consumes the previous call's id):
//!   1. mandates        fan-out create/update, one call per tuple, barrier
//!   2. party           create/update Retail or Business
//!   3. customer        create/update Customer -> party id
//!   4. account         create/update Account  -> customer id
//!   5. attach_account  update Customer         -> account id
//!
//! Compensation deletes only what this run created. Updates of records
//! that existed before the run (edit mode) are left as written.

use crate::{
    audit::{AuditClock, AuditStamp},
    config::{AccountDefaults, WizardConfig},
    error::{ValidationErrors, WizardError, WizardResult},
    gateway::{
        AccountInput, BusinessInput, CustomerInput, CustomerUpdate, GatewayError, MandateInput,
        MandateRecord, Operation, RemoteGateway, RetailInput,
    },
    saga::{Saga, SagaOutcome, SagaReport, SagaStep},
    state::{CustomerType, ProductInput, WizardPatch, WizardState},
    types::{EntityId, KycId},
    activation::ActivationToken,
};
use serde::{Deserialize, Serialize};

/// One mandate row as entered on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateTuple {
    pub signatory:    String,
    pub mandate_type: String,
    pub category:     String,
}

impl MandateTuple {
    pub fn new(
        signatory: impl Into<String>,
        mandate_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            signatory:    signatory.into(),
            mandate_type: mandate_type.into(),
            category:     category.into(),
        }
    }
}

pub fn validate_mandates(tuples: &[MandateTuple], config: &WizardConfig) -> WizardResult<()> {
    let mut errors = ValidationErrors::new();
    if tuples.is_empty() {
        errors.push("mandates", "At least one mandate is required");
    }
    let min = config.min_field_len;
    for (i, t) in tuples.iter().enumerate() {
        let fields = [
            ("signatory", "Signatory", &t.signatory),
            ("mandateType", "Mandate Type", &t.mandate_type),
            ("category", "Category", &t.category),
        ];
        for (field, label, value) in fields {
            if value.trim().chars().count() < min {
                errors.push(format!("mandates.{i}.{field}"), format!("{label} is required"));
            }
        }
    }
    errors.into_result()
}

/// Which party entity the customer hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartyPlan {
    Retail {
        individual_kyc: KycId,
    },
    Business {
        legal_entity_name: String,
        business_kyc:      KycId,
        directors_kyc:     KycId,
    },
}

/// Server-side records that already exist: loaded in edit mode, or written
/// by an earlier save in this session. Existing records are updated, never
/// created again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingRecords {
    pub mandate_ids:   Vec<EntityId>,
    pub party_id:      Option<EntityId>,
    pub customer_id:   Option<EntityId>,
    pub customer_type: Option<String>,
    pub account_id:    Option<EntityId>,
}

impl ExistingRecords {
    fn from_state(state: &WizardState, customer_type: CustomerType) -> Self {
        let known = |id: &Option<EntityId>| id.clone().filter(|id| !id.trim().is_empty());
        // Only the party matching the planned type is reused.
        let party_id = match customer_type {
            CustomerType::Retail   => known(&state.retail),
            CustomerType::Business => known(&state.business),
        };
        Self {
            mandate_ids: state.mandates.iter().map(|m| m.mandate_id.clone()).collect(),
            party_id,
            customer_id: known(&state.customer),
            customer_type: state
                .customer_data
                .as_ref()
                .map(|data| data.customer.customer_type.clone()),
            account_id: known(&state.account),
        }
    }

    /// True once the customer exists server-side.
    pub fn is_edit(&self) -> bool {
        self.customer_id.is_some()
    }
}

/// Everything the protocol needs, captured from one state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingPlan {
    pub customer_type: CustomerType,
    pub party:         PartyPlan,
    pub product:       ProductInput,
    pub tuples:        Vec<MandateTuple>,
    pub existing:      ExistingRecords,
    pub stamp:         AuditStamp,
    pub account:       AccountDefaults,
}

impl OnboardingPlan {
    fn customer_type_wire(&self) -> String {
        self.existing
            .customer_type
            .clone()
            .unwrap_or_else(|| self.customer_type.as_str().to_string())
    }
}

/// Check preconditions and capture the plan for a mandate submit.
pub fn plan_onboarding(
    state: &WizardState,
    tuples: &[MandateTuple],
    config: &WizardConfig,
    clock: &AuditClock,
) -> WizardResult<OnboardingPlan> {
    validate_mandates(tuples, config)?;
    let customer_type = state.customer_type().ok_or(WizardError::CustomerTypeNotSelected)?;

    let mut errors = ValidationErrors::new();
    let owner = state.account_owners().first().map(|k| k.kyc_id.clone());
    if owner.is_none() {
        errors.push("accountOwners", "An account owner must be selected");
    }
    let product = state.effective_product();
    if product.is_none() {
        errors.push("productInput", "Product details must be saved first");
    }
    let party = match customer_type {
        CustomerType::Retail => PartyPlan::Retail {
            individual_kyc: owner.clone().unwrap_or_default(),
        },
        CustomerType::Business => {
            let legal = state.legal_entity_name().unwrap_or_default().trim().to_string();
            if legal.is_empty() {
                errors.push("legalEntityName", "Legal entity name is required");
            }
            let director = state.other_kycs().first().map(|k| k.kyc_id.clone());
            if director.is_none() {
                errors.push("otherKYCs", "A director KYC must be selected");
            }
            PartyPlan::Business {
                legal_entity_name: legal,
                business_kyc:      owner.clone().unwrap_or_default(),
                directors_kyc:     director.unwrap_or_default(),
            }
        }
    };
    errors.into_result()?;

    Ok(OnboardingPlan {
        customer_type,
        party,
        product: product.unwrap_or_default(),
        tuples: tuples.to_vec(),
        existing: ExistingRecords::from_state(state, customer_type),
        stamp: clock.stamp(&config.operator_id),
        account: config.account.clone(),
    })
}

/// Ids and records accumulated while the protocol runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnboardingContext {
    pub mandates:         Vec<MandateRecord>,
    /// Mandates created (not updated) by this run.
    pub created_mandates: Vec<EntityId>,
    pub party_id:         Option<EntityId>,
    pub party_created:    bool,
    pub customer_id:      Option<EntityId>,
    pub customer_created: bool,
    pub account_id:       Option<EntityId>,
    pub account_created:  bool,
    pub account_attached: bool,
    /// Every successful call, in issue order.
    pub calls:            Vec<Operation>,
}

impl OnboardingContext {
    fn mandate_ids(&self) -> Vec<EntityId> {
        self.mandates.iter().map(|m| m.mandate_id.clone()).collect()
    }

    fn require<'c>(value: &'c Option<EntityId>, op: Operation, what: &str) -> Result<&'c str, GatewayError> {
        value
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::new(op, format!("{what} id is not available")))
    }
}

// ── Steps ──────────────────────────────────────────────────────────

struct MandateBatch<'p> {
    plan: &'p OnboardingPlan,
}

impl SagaStep<OnboardingContext> for MandateBatch<'_> {
    fn name(&self) -> &'static str {
        "mandates"
    }

    /// Every tuple is issued even after a failure; the batch only fails at
    /// the barrier, once all calls have returned.
    fn execute(&self, ctx: &mut OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let mut first_error = None;
        for (i, tuple) in self.plan.tuples.iter().enumerate() {
            let input = MandateInput {
                signatory:    tuple.signatory.trim().to_string(),
                mandate_type: tuple.mandate_type.trim().to_string(),
                category:     tuple.category.trim().to_string(),
                modified_by:  self.plan.stamp.modified_by.clone(),
                modified_on:  self.plan.stamp.modified_on.clone(),
            };
            let result = match self.plan.existing.mandate_ids.get(i) {
                Some(existing) => gateway
                    .update_mandate(existing, &input)
                    .map(|record| (record, Operation::UpdateMandate)),
                None => gateway
                    .create_mandate(&input)
                    .map(|record| (record, Operation::CreateMandate)),
            };
            match result {
                Ok((record, op)) => {
                    if op == Operation::CreateMandate {
                        ctx.created_mandates.push(record.mandate_id.clone());
                    }
                    ctx.calls.push(op);
                    ctx.mandates.push(record);
                }
                Err(e) => {
                    log::warn!("mandate {i} failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn compensate(&self, ctx: &OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let mut first_error = None;
        for id in ctx.created_mandates.iter().rev() {
            if let Err(e) = gateway.delete_mandate(id) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

struct UpsertParty<'p> {
    plan: &'p OnboardingPlan,
}

impl SagaStep<OnboardingContext> for UpsertParty<'_> {
    fn name(&self) -> &'static str {
        "party"
    }

    fn execute(&self, ctx: &mut OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let plan = self.plan;
        let mandates = ctx.mandate_ids();
        let existing = plan.existing.party_id.as_deref();
        let (id, op) = match &plan.party {
            PartyPlan::Retail { individual_kyc } => {
                let input = RetailInput {
                    retail_type:      plan.customer_type_wire(),
                    individual_kyc:   individual_kyc.clone(),
                    product_types:    plan.product.product_types.clone(),
                    account_currency: plan.product.account_currency.clone(),
                    risk_rating:      plan.product.risk_rating.clone(),
                    account_mandates: mandates,
                    modified_by:      plan.stamp.modified_by.clone(),
                    modified_on:      plan.stamp.modified_on.clone(),
                };
                match existing {
                    Some(retail_id) => (gateway.update_retail(retail_id, &input)?.retail_id, Operation::UpdateRetail),
                    None => (gateway.create_retail(&input)?.retail_id, Operation::CreateRetail),
                }
            }
            PartyPlan::Business {
                legal_entity_name,
                business_kyc,
                directors_kyc,
            } => {
                let input = BusinessInput {
                    legal_entity_name: legal_entity_name.clone(),
                    business_kyc:      business_kyc.clone(),
                    directors_kyc:     directors_kyc.clone(),
                    product_types:     plan.product.product_types.clone(),
                    account_currency:  plan.product.account_currency.clone(),
                    risk_rating:       plan.product.risk_rating.clone(),
                    account_mandates:  mandates,
                    modified_by:       plan.stamp.modified_by.clone(),
                    modified_on:       plan.stamp.modified_on.clone(),
                };
                match existing {
                    Some(business_id) => (
                        gateway.update_business(business_id, &input)?.business_id,
                        Operation::UpdateBusiness,
                    ),
                    None => (gateway.create_business(&input)?.business_id, Operation::CreateBusiness),
                }
            }
        };
        ctx.party_created = existing.is_none();
        ctx.party_id = Some(id);
        ctx.calls.push(op);
        Ok(())
    }

    fn compensate(&self, ctx: &OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let (true, Some(id)) = (ctx.party_created, ctx.party_id.as_deref()) else {
            return Ok(());
        };
        match self.plan.party {
            PartyPlan::Retail { .. }   => gateway.delete_retail(id),
            PartyPlan::Business { .. } => gateway.delete_business(id),
        }
    }
}

struct UpsertCustomer<'p> {
    plan: &'p OnboardingPlan,
}

impl SagaStep<OnboardingContext> for UpsertCustomer<'_> {
    fn name(&self) -> &'static str {
        "customer"
    }

    fn execute(&self, ctx: &mut OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let plan = self.plan;
        let op = if plan.existing.customer_id.is_some() {
            Operation::UpdateCustomer
        } else {
            Operation::CreateCustomer
        };
        let party_id = OnboardingContext::require(&ctx.party_id, op, "party")?.to_string();
        let (retail, business) = match plan.party {
            PartyPlan::Retail { .. }   => (Some(party_id), None),
            PartyPlan::Business { .. } => (None, Some(party_id)),
        };

        let record = match &plan.existing.customer_id {
            Some(customer_id) => gateway.update_customer(&CustomerUpdate {
                customer_id:      customer_id.clone(),
                customer_type:    Some(plan.customer_type_wire()),
                retail,
                business,
                accounts:         None,
                account_mandates: Some(ctx.mandate_ids()),
                mandate_rules:    None,
                modified_by:      plan.stamp.modified_by.clone(),
                modified_on:      plan.stamp.modified_on.clone(),
            })?,
            None => gateway.create_customer(&CustomerInput {
                customer_type:    plan.customer_type_wire(),
                retail,
                business,
                accounts:         Vec::new(),
                account_mandates: ctx.mandate_ids(),
                mandate_rules:    Vec::new(),
                modified_by:      plan.stamp.modified_by.clone(),
                modified_on:      plan.stamp.modified_on.clone(),
            })?,
        };
        if record.customer_id.is_empty() {
            return Err(GatewayError::new(op, "response did not include a customer id"));
        }
        ctx.customer_created = plan.existing.customer_id.is_none();
        ctx.customer_id = Some(record.customer_id);
        ctx.calls.push(op);
        Ok(())
    }

    fn compensate(&self, ctx: &OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        match (ctx.customer_created, ctx.customer_id.as_deref()) {
            (true, Some(id)) => gateway.delete_customer(id),
            _ => Ok(()),
        }
    }
}

struct UpsertAccount<'p> {
    plan: &'p OnboardingPlan,
}

impl UpsertAccount<'_> {
    fn input(&self, customer_id: &str) -> AccountInput {
        let plan = self.plan;
        let (name, kind, account_type) = match &plan.party {
            PartyPlan::Retail { .. } => (
                customer_id.to_string(),
                "Retail",
                plan.account.retail_account_type.clone(),
            ),
            PartyPlan::Business {
                legal_entity_name, ..
            } => (
                format!("{legal_entity_name} Account"),
                "Business",
                plan.account.business_account_type.clone(),
            ),
        };
        AccountInput {
            name,
            account_owner:  customer_id.to_string(),
            account_number: customer_id.to_string(),
            description:    format!("{kind} Account for {customer_id}"),
            account_type,
            branch_id:      format!("{}{customer_id}", plan.account.branch_prefix),
            normal_balance: plan.account.normal_balance.clone(),
        }
    }
}

impl SagaStep<OnboardingContext> for UpsertAccount<'_> {
    fn name(&self) -> &'static str {
        "account"
    }

    fn execute(&self, ctx: &mut OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let existing = self.plan.existing.account_id.as_deref();
        let op = if existing.is_some() {
            Operation::UpdateAccount
        } else {
            Operation::CreateAccount
        };
        let customer_id = OnboardingContext::require(&ctx.customer_id, op, "customer")?;
        let input = self.input(customer_id);
        let record = match existing {
            Some(account_id) => gateway.update_account(account_id, &input)?,
            None => gateway.create_account(&input)?,
        };
        ctx.account_created = existing.is_none();
        ctx.account_id = Some(record.id);
        ctx.calls.push(op);
        Ok(())
    }

    fn compensate(&self, ctx: &OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        match (ctx.account_created, ctx.account_id.as_deref()) {
            (true, Some(id)) => gateway.delete_account(id),
            _ => Ok(()),
        }
    }
}

struct AttachAccount<'p> {
    plan: &'p OnboardingPlan,
}

impl SagaStep<OnboardingContext> for AttachAccount<'_> {
    fn name(&self) -> &'static str {
        "attach_account"
    }

    fn execute(&self, ctx: &mut OnboardingContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        let op = Operation::UpdateCustomer;
        let customer_id = OnboardingContext::require(&ctx.customer_id, op, "customer")?.to_string();
        let account_id = OnboardingContext::require(&ctx.account_id, op, "account")?.to_string();
        gateway.update_customer(&CustomerUpdate {
            customer_id,
            accounts: Some(vec![account_id]),
            modified_by: self.plan.stamp.modified_by.clone(),
            modified_on: self.plan.stamp.modified_on.clone(),
            ..Default::default()
        })?;
        ctx.account_attached = true;
        ctx.calls.push(op);
        Ok(())
    }
}

/// Run the full protocol for `plan`.
pub fn run_onboarding(
    plan: &OnboardingPlan,
    gateway: &mut dyn RemoteGateway,
    token: &ActivationToken,
    compensate_on_failure: bool,
) -> (SagaReport, OnboardingContext) {
    let saga = Saga::new("onboarding")
        .compensate_on_failure(compensate_on_failure)
        .step(MandateBatch { plan })
        .step(UpsertParty { plan })
        .step(UpsertCustomer { plan })
        .step(UpsertAccount { plan })
        .step(AttachAccount { plan });
    let mut ctx = OnboardingContext::default();
    let report = saga.run(&mut ctx, gateway, token);
    (report, ctx)
}

/// The state write that follows a protocol run, if any.
///
/// Committed: every id. Failed with compensation disabled: whatever was
/// created before the failure, written as if each call had stored its id
/// directly. Failures with compensation enabled and abandoned runs write
/// nothing, even when every compensation call itself failed.
pub fn onboarding_patch(
    plan: &OnboardingPlan,
    ctx: &OnboardingContext,
    report: &SagaReport,
    compensate_on_failure: bool,
) -> Option<WizardPatch> {
    match &report.outcome {
        SagaOutcome::Committed => {}
        SagaOutcome::Failed { .. } if !compensate_on_failure => {}
        SagaOutcome::Failed { .. } | SagaOutcome::Abandoned { .. } => return None,
    }

    let mandates_done = report.completed.contains(&"mandates");
    let mut patch = WizardPatch::default();
    if mandates_done {
        patch.mandates = Some(ctx.mandates.clone());
    }
    if let Some(party_id) = &ctx.party_id {
        match plan.party {
            PartyPlan::Retail { .. }   => patch.retail = Some(Some(party_id.clone())),
            PartyPlan::Business { .. } => patch.business = Some(Some(party_id.clone())),
        }
    }
    if let Some(customer_id) = &ctx.customer_id {
        patch.customer = Some(Some(customer_id.clone()));
    }
    if let Some(account_id) = &ctx.account_id {
        patch.account = Some(Some(account_id.clone()));
    }
    (!patch.is_empty()).then_some(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CustomerProfile, KycRef};

    fn kyc(id: &str) -> KycRef {
        KycRef {
            kyc_id:     id.into(),
            kyc_type:   "individual".into(),
            name:       String::new(),
            created_by: "ops".into(),
            status:     "Pending".into(),
        }
    }

    #[test]
    fn mandate_validation_names_the_row() {
        let config = WizardConfig::default_test();
        let err = validate_mandates(
            &[
                MandateTuple::new("SIG-1", "SOLE", "A12345"),
                MandateTuple::new("SIG-2", "", "A12345"),
            ],
            &config,
        )
        .unwrap_err();
        let WizardError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("mandates.1.mandateType"));
        assert_eq!(errors.errors.len(), 1);
        assert!(validate_mandates(&[], &config).is_err());
    }

    #[test]
    fn business_plan_reports_every_missing_precondition() {
        let config = WizardConfig::default_test();
        let state = WizardState {
            profile: Some(CustomerProfile::Business {
                legal_entity_name: None,
                account_owners:    vec![kyc("BK1")],
                other_kycs:        vec![],
            }),
            ..Default::default()
        };
        let err = plan_onboarding(
            &state,
            &[MandateTuple::new("SIG-1", "SOLE", "A12345")],
            &config,
            &AuditClock::System,
        )
        .unwrap_err();
        let WizardError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("legalEntityName"));
        assert!(errors.has_field("otherKYCs"));
        assert!(errors.has_field("productInput"));
        assert!(!errors.has_field("accountOwners"));
    }

    #[test]
    fn account_input_follows_naming_rules() {
        let config = WizardConfig::default_test();
        let state = WizardState {
            profile: Some(CustomerProfile::Business {
                legal_entity_name: Some("Acme Ltd".into()),
                account_owners:    vec![kyc("BK1")],
                other_kycs:        vec![kyc("DK1")],
            }),
            product_input: ProductInput::new("CUR", "USD", "Low"),
            ..Default::default()
        };
        let plan = plan_onboarding(
            &state,
            &[MandateTuple::new("SIG-1", "SOLE", "A12345")],
            &config,
            &AuditClock::System,
        )
        .unwrap();
        let input = UpsertAccount { plan: &plan }.input("c-9");
        assert_eq!(input.name, "Acme Ltd Account");
        assert_eq!(input.description, "Business Account for c-9");
        assert_eq!(input.branch_id, "BRANCH-c-9");
        assert_eq!(input.normal_balance, "CREDIT");
        assert_eq!(input.account_type, "Business");
    }

    fn saved_retail_state() -> WizardState {
        WizardState {
            profile: Some(CustomerProfile::Retail {
                account_owners: vec![kyc("K1")],
            }),
            product_input: ProductInput::new("CUR", "USD", "Low"),
            mandates: vec![MandateRecord {
                mandate_id:   "m-1".into(),
                signatory:    "SIG-1".into(),
                mandate_type: "SOLE".into(),
                category:     "A12345".into(),
                modified_by:  "ops".into(),
                modified_on:  "2024-01-15T09:30:00".into(),
            }],
            retail: Some("r-1".into()),
            customer: Some("c-1".into()),
            account: Some("a-1".into()),
            ..Default::default()
        }
    }

    /// Ids already saved in this session are reused, so a resubmit updates.
    #[test]
    fn plan_reuses_ids_saved_earlier() {
        let plan = plan_onboarding(
            &saved_retail_state(),
            &[MandateTuple::new("SIG-1", "SOLE", "A12345")],
            &WizardConfig::default_test(),
            &AuditClock::System,
        )
        .unwrap();
        assert_eq!(plan.existing.mandate_ids, vec!["m-1".to_string()]);
        assert_eq!(plan.existing.party_id.as_deref(), Some("r-1"));
        assert_eq!(plan.existing.customer_id.as_deref(), Some("c-1"));
        assert_eq!(plan.existing.account_id.as_deref(), Some("a-1"));
        assert!(plan.existing.is_edit());
    }

    #[test]
    fn party_of_another_type_is_not_reused() {
        let state = WizardState {
            retail: None,
            business: Some("b-1".into()),
            ..saved_retail_state()
        };
        let plan = plan_onboarding(
            &state,
            &[MandateTuple::new("SIG-1", "SOLE", "A12345")],
            &WizardConfig::default_test(),
            &AuditClock::System,
        )
        .unwrap();
        assert!(plan.existing.party_id.is_none());
    }

    /// A failed run whose compensations all failed still writes nothing when
    /// compensation was enabled.
    #[test]
    fn failed_compensation_does_not_write_partial_ids() {
        let plan = plan_onboarding(
            &WizardState {
                retail: None,
                customer: None,
                account: None,
                mandates: Vec::new(),
                ..saved_retail_state()
            },
            &[MandateTuple::new("SIG-1", "SOLE", "A12345")],
            &WizardConfig::default_test(),
            &AuditClock::System,
        )
        .unwrap();
        let ctx = OnboardingContext {
            party_id: Some("r-9".into()),
            party_created: true,
            ..Default::default()
        };
        let report = SagaReport {
            completed: vec!["mandates", "party"],
            outcome:   SagaOutcome::Failed {
                step:                "customer",
                error:               GatewayError::new(Operation::CreateCustomer, "down"),
                compensated:         Vec::new(),
                compensation_errors: vec![
                    ("party", GatewayError::new(Operation::DeleteRetail, "down")),
                    ("mandates", GatewayError::new(Operation::DeleteMandate, "down")),
                ],
            },
        };

        assert!(onboarding_patch(&plan, &ctx, &report, true).is_none());
        let patch = onboarding_patch(&plan, &ctx, &report, false).unwrap();
        assert_eq!(patch.retail, Some(Some("r-9".to_string())));
    }
}
