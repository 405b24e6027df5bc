//! Deterministic fault injection for any `RemoteGateway`.
//!
//! RULE: Injected failures are reproducible. Random failures come from a
//! PCG stream seeded once; scripted faults fire on the nth call of an
//! operation, counted per operation from 1.

use crate::{
    activation::ActivationHandle,
    gateway::{
        AccountInput, AccountRecord, BusinessInput, BusinessKyc, BusinessRecord, CustomerData,
        CustomerInput, CustomerRecord, CustomerUpdate, GatewayError, GatewayResult, IndividualKyc,
        MandateInput, MandateRecord, MandateRuleInput, MandateRuleRecord, MandateType, Operation,
        ProductType, RemoteGateway, RetailInput, RetailRecord,
    },
};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::collections::HashMap;

/// Seeded random stream for fault decisions.
pub struct FaultRng {
    inner: Pcg64Mcg,
}

impl FaultRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultAction {
    /// The call fails with this server message.
    Fail(String),
    /// The call fails and the server gives no message.
    FailWithoutMessage,
    /// The call succeeds, then the wizard step is abandoned.
    AbandonAfter,
}

pub struct FaultInjectingGateway<G> {
    inner:        G,
    rng:          FaultRng,
    failure_rate: f64,
    scripted:     HashMap<(Operation, u32), FaultAction>,
    counts:       HashMap<Operation, u32>,
    abandon:      Option<ActivationHandle>,
    injected:     Vec<(Operation, FaultAction)>,
}

impl<G: RemoteGateway> FaultInjectingGateway<G> {
    pub fn new(inner: G, seed: u64) -> Self {
        Self {
            inner,
            rng: FaultRng::new(seed),
            failure_rate: 0.0,
            scripted: HashMap::new(),
            counts: HashMap::new(),
            abandon: None,
            injected: Vec::new(),
        }
    }

    /// Probability that any mutation fails. Queries are never failed randomly.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Fire `action` on the `nth` call (1-based) of `op`.
    pub fn script(mut self, op: Operation, nth: u32, action: FaultAction) -> Self {
        self.scripted.insert((op, nth.max(1)), action);
        self
    }

    /// Handle invalidated by `FaultAction::AbandonAfter`.
    pub fn set_abandon_handle(&mut self, handle: ActivationHandle) {
        self.abandon = Some(handle);
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Every fault fired so far, in order.
    pub fn injected(&self) -> &[(Operation, FaultAction)] {
        &self.injected
    }

    /// Decide what happens to this call before it reaches the inner gateway.
    fn before(&mut self, op: Operation) -> GatewayResult<Option<FaultAction>> {
        let count = self.counts.entry(op).or_insert(0);
        *count += 1;
        let nth = *count;

        if let Some(action) = self.scripted.get(&(op, nth)).cloned() {
            self.injected.push((op, action.clone()));
            return match action {
                FaultAction::Fail(message) => {
                    log::debug!("fault: {op} call {nth} failed (scripted)");
                    Err(GatewayError::new(op, message))
                }
                FaultAction::FailWithoutMessage => Err(GatewayError::without_message(op)),
                FaultAction::AbandonAfter => Ok(Some(FaultAction::AbandonAfter)),
            };
        }

        if op.is_mutation() && self.failure_rate > 0.0 && self.rng.chance(self.failure_rate) {
            let action = FaultAction::Fail("injected failure".into());
            self.injected.push((op, action));
            log::debug!("fault: {op} call {nth} failed (random)");
            return Err(GatewayError::new(op, "injected failure"));
        }
        Ok(None)
    }

    fn after(&self, pending: Option<FaultAction>) {
        if let (Some(FaultAction::AbandonAfter), Some(handle)) = (pending, &self.abandon) {
            log::debug!("fault: abandoning wizard step after call");
            handle.invalidate();
        }
    }

    fn call<T>(
        &mut self,
        op: Operation,
        f: impl FnOnce(&mut G) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let pending = self.before(op)?;
        let result = f(&mut self.inner);
        if result.is_ok() {
            self.after(pending);
        }
        result
    }
}

impl<G: RemoteGateway> RemoteGateway for FaultInjectingGateway<G> {
    fn individual_kycs(&mut self) -> GatewayResult<Vec<IndividualKyc>> {
        self.call(Operation::IndividualKycs, |g| g.individual_kycs())
    }

    fn business_kycs(&mut self) -> GatewayResult<Vec<BusinessKyc>> {
        self.call(Operation::BusinessKycs, |g| g.business_kycs())
    }

    fn product_types(&mut self) -> GatewayResult<Vec<ProductType>> {
        self.call(Operation::ProductTypes, |g| g.product_types())
    }

    fn mandate_types(&mut self) -> GatewayResult<Vec<MandateType>> {
        self.call(Operation::MandateTypes, |g| g.mandate_types())
    }

    fn customer(&mut self, customer_id: &str) -> GatewayResult<Option<CustomerData>> {
        self.call(Operation::Customer, |g| g.customer(customer_id))
    }

    fn create_mandate(&mut self, input: &MandateInput) -> GatewayResult<MandateRecord> {
        self.call(Operation::CreateMandate, |g| g.create_mandate(input))
    }

    fn update_mandate(&mut self, mandate_id: &str, input: &MandateInput) -> GatewayResult<MandateRecord> {
        self.call(Operation::UpdateMandate, |g| g.update_mandate(mandate_id, input))
    }

    fn delete_mandate(&mut self, mandate_id: &str) -> GatewayResult<()> {
        self.call(Operation::DeleteMandate, |g| g.delete_mandate(mandate_id))
    }

    fn create_retail(&mut self, input: &RetailInput) -> GatewayResult<RetailRecord> {
        self.call(Operation::CreateRetail, |g| g.create_retail(input))
    }

    fn update_retail(&mut self, retail_id: &str, input: &RetailInput) -> GatewayResult<RetailRecord> {
        self.call(Operation::UpdateRetail, |g| g.update_retail(retail_id, input))
    }

    fn delete_retail(&mut self, retail_id: &str) -> GatewayResult<()> {
        self.call(Operation::DeleteRetail, |g| g.delete_retail(retail_id))
    }

    fn create_business(&mut self, input: &BusinessInput) -> GatewayResult<BusinessRecord> {
        self.call(Operation::CreateBusiness, |g| g.create_business(input))
    }

    fn update_business(&mut self, business_id: &str, input: &BusinessInput) -> GatewayResult<BusinessRecord> {
        self.call(Operation::UpdateBusiness, |g| g.update_business(business_id, input))
    }

    fn delete_business(&mut self, business_id: &str) -> GatewayResult<()> {
        self.call(Operation::DeleteBusiness, |g| g.delete_business(business_id))
    }

    fn create_customer(&mut self, input: &CustomerInput) -> GatewayResult<CustomerRecord> {
        self.call(Operation::CreateCustomer, |g| g.create_customer(input))
    }

    fn update_customer(&mut self, update: &CustomerUpdate) -> GatewayResult<CustomerRecord> {
        self.call(Operation::UpdateCustomer, |g| g.update_customer(update))
    }

    fn delete_customer(&mut self, customer_id: &str) -> GatewayResult<()> {
        self.call(Operation::DeleteCustomer, |g| g.delete_customer(customer_id))
    }

    fn create_account(&mut self, input: &AccountInput) -> GatewayResult<AccountRecord> {
        self.call(Operation::CreateAccount, |g| g.create_account(input))
    }

    fn update_account(&mut self, account_id: &str, input: &AccountInput) -> GatewayResult<AccountRecord> {
        self.call(Operation::UpdateAccount, |g| g.update_account(account_id, input))
    }

    fn delete_account(&mut self, account_id: &str) -> GatewayResult<()> {
        self.call(Operation::DeleteAccount, |g| g.delete_account(account_id))
    }

    fn create_mandate_rule(&mut self, input: &MandateRuleInput) -> GatewayResult<MandateRuleRecord> {
        self.call(Operation::CreateMandateRule, |g| g.create_mandate_rule(input))
    }

    fn update_mandate_rule(
        &mut self,
        mandate_rule_id: &str,
        input: &MandateRuleInput,
    ) -> GatewayResult<MandateRuleRecord> {
        self.call(Operation::UpdateMandateRule, |g| g.update_mandate_rule(mandate_rule_id, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_rng_is_deterministic() {
        let mut a = FaultRng::new(12345);
        let mut b = FaultRng::new(12345);
        for _ in 0..32 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn fault_rng_stays_in_unit_interval() {
        let mut rng = FaultRng::new(7);
        for _ in 0..1000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }
}
