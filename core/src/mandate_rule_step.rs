//! Mandate-rule entry: signing rules and transaction limits per mandate
//! type, attached to the customer created by the mandate step.

use crate::{
    activation::ActivationToken,
    audit::{AuditClock, AuditStamp},
    config::WizardConfig,
    error::{ValidationErrors, WizardResult},
    gateway::{
        CustomerUpdate, GatewayError, MandateRuleInput, MandateRuleRecord, Operation, RemoteGateway,
    },
    saga::{Saga, SagaReport, SagaStep},
    state::WizardState,
    types::EntityId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandateRuleTuple {
    pub mandate_type:               String,
    pub signing_rule:               String,
    pub minimum_transaction_amount: String,
    pub maximum_transaction_amount: String,
    pub maximum_daily_limit:        String,
}

fn parse_amount(errors: &mut ValidationErrors, field: String, label: &str, raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push(field, format!("{label} is required"));
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            errors.push(field, format!("{label} must be a non-negative amount"));
            None
        }
    }
}

pub fn validate_rules(rules: &[MandateRuleTuple]) -> WizardResult<()> {
    let mut errors = ValidationErrors::new();
    if rules.is_empty() {
        errors.push("mandateRules", "At least one mandate rule is required");
    }
    for (i, rule) in rules.iter().enumerate() {
        let prefix = format!("mandateRules.{i}");
        if rule.mandate_type.trim().is_empty() {
            errors.push(format!("{prefix}.mandateType"), "Mandate Type is required");
        }
        if rule.signing_rule.trim().is_empty() {
            errors.push(format!("{prefix}.signingRule"), "Signing Rule is required");
        }
        let min = parse_amount(
            &mut errors,
            format!("{prefix}.minimumTransactionAmount"),
            "Minimum Transaction Amount",
            &rule.minimum_transaction_amount,
        );
        let max = parse_amount(
            &mut errors,
            format!("{prefix}.maximumTransactionAmount"),
            "Maximum Transaction Amount",
            &rule.maximum_transaction_amount,
        );
        let daily = parse_amount(
            &mut errors,
            format!("{prefix}.maximumDailyLimit"),
            "Maximum Daily Limit",
            &rule.maximum_daily_limit,
        );
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                errors.push(
                    format!("{prefix}.minimumTransactionAmount"),
                    "Minimum must not exceed maximum",
                );
            }
        }
        if let (Some(max), Some(daily)) = (max, daily) {
            if max > daily {
                errors.push(
                    format!("{prefix}.maximumDailyLimit"),
                    "Daily limit must cover the maximum transaction amount",
                );
            }
        }
    }
    errors.into_result()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RulePlan {
    pub customer_id: EntityId,
    pub rules:       Vec<MandateRuleTuple>,
    /// Rule ids already attached to the customer (edit mode), by position.
    pub existing:    Vec<EntityId>,
    pub stamp:       AuditStamp,
}

pub fn plan_rules(
    state: &WizardState,
    rules: &[MandateRuleTuple],
    config: &WizardConfig,
    clock: &AuditClock,
) -> WizardResult<RulePlan> {
    validate_rules(rules)?;
    let customer_id = state
        .customer
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ValidationErrors::single("customer", "Mandates must be saved before mandate rules")
        })?;
    let existing = state
        .mandate_rules
        .iter()
        .map(|r| r.mandate_rule_id.clone())
        .collect();
    Ok(RulePlan {
        customer_id,
        rules: rules.to_vec(),
        existing,
        stamp: clock.stamp(&config.operator_id),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleContext {
    pub rules: Vec<MandateRuleRecord>,
    pub calls: Vec<Operation>,
}

struct RuleBatch<'p> {
    plan: &'p RulePlan,
}

impl SagaStep<RuleContext> for RuleBatch<'_> {
    fn name(&self) -> &'static str {
        "mandate_rules"
    }

    fn execute(&self, ctx: &mut RuleContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        for (i, rule) in self.plan.rules.iter().enumerate() {
            let input = MandateRuleInput {
                customer_id:                self.plan.customer_id.clone(),
                mandate_type:               rule.mandate_type.trim().to_string(),
                signing_rule:               rule.signing_rule.trim().to_string(),
                minimum_transaction_amount: rule.minimum_transaction_amount.trim().to_string(),
                maximum_transaction_amount: rule.maximum_transaction_amount.trim().to_string(),
                maximum_daily_limit:        rule.maximum_daily_limit.trim().to_string(),
                modified_by:                self.plan.stamp.modified_by.clone(),
                modified_on:                self.plan.stamp.modified_on.clone(),
            };
            let (record, op) = match self.plan.existing.get(i) {
                Some(id) => (gateway.update_mandate_rule(id, &input)?, Operation::UpdateMandateRule),
                None => (gateway.create_mandate_rule(&input)?, Operation::CreateMandateRule),
            };
            ctx.rules.push(record);
            ctx.calls.push(op);
        }
        Ok(())
    }
}

struct AttachRules<'p> {
    plan: &'p RulePlan,
}

impl SagaStep<RuleContext> for AttachRules<'_> {
    fn name(&self) -> &'static str {
        "attach_rules"
    }

    fn execute(&self, ctx: &mut RuleContext, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        gateway.update_customer(&CustomerUpdate {
            customer_id:   self.plan.customer_id.clone(),
            mandate_rules: Some(ctx.rules.iter().map(|r| r.mandate_rule_id.clone()).collect()),
            modified_by:   self.plan.stamp.modified_by.clone(),
            modified_on:   self.plan.stamp.modified_on.clone(),
            ..Default::default()
        })?;
        ctx.calls.push(Operation::UpdateCustomer);
        Ok(())
    }
}

/// Mandate rules have no delete operation, so nothing is compensated.
pub fn run_rules(
    plan: &RulePlan,
    gateway: &mut dyn RemoteGateway,
    token: &ActivationToken,
) -> (SagaReport, RuleContext) {
    let saga = Saga::new("mandate_rules")
        .compensate_on_failure(false)
        .step(RuleBatch { plan })
        .step(AttachRules { plan });
    let mut ctx = RuleContext::default();
    let report = saga.run(&mut ctx, gateway, token);
    (report, ctx)
}
