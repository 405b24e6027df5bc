//! `RemoteGateway` over the local store. Store errors surface as
//! `GatewayError`s carrying the database message, the way a remote API
//! reports a failed mutation.

use super::BackOfficeStore;
use crate::{
    error::WizardResult,
    gateway::{
        AccountInput, AccountRecord, BusinessInput, BusinessKyc, BusinessRecord, CustomerData,
        CustomerInput, CustomerRecord, CustomerUpdate, GatewayError, GatewayResult, IndividualKyc,
        MandateInput, MandateRecord, MandateRuleInput, MandateRuleRecord, MandateType, Operation,
        ProductType, RemoteGateway, RetailInput, RetailRecord,
    },
};

fn remote<T>(op: Operation, result: WizardResult<T>) -> GatewayResult<T> {
    result.map_err(|e| {
        log::warn!("{op}: {e}");
        GatewayError::new(op, e.to_string())
    })
}

fn found<T>(op: Operation, what: &str, id: &str, result: WizardResult<Option<T>>) -> GatewayResult<T> {
    remote(op, result)?.ok_or_else(|| GatewayError::new(op, format!("{what} {id} does not exist")))
}

fn deleted(op: Operation, what: &str, id: &str, result: WizardResult<bool>) -> GatewayResult<()> {
    if remote(op, result)? {
        Ok(())
    } else {
        Err(GatewayError::new(op, format!("{what} {id} does not exist")))
    }
}

impl RemoteGateway for BackOfficeStore {
    fn individual_kycs(&mut self) -> GatewayResult<Vec<IndividualKyc>> {
        remote(Operation::IndividualKycs, self.list_individual_kycs())
    }

    fn business_kycs(&mut self) -> GatewayResult<Vec<BusinessKyc>> {
        remote(Operation::BusinessKycs, self.list_business_kycs())
    }

    fn product_types(&mut self) -> GatewayResult<Vec<ProductType>> {
        remote(Operation::ProductTypes, self.list_product_types())
    }

    fn mandate_types(&mut self) -> GatewayResult<Vec<MandateType>> {
        remote(Operation::MandateTypes, self.list_mandate_types())
    }

    fn customer(&mut self, customer_id: &str) -> GatewayResult<Option<CustomerData>> {
        remote(Operation::Customer, self.customer_data(customer_id))
    }

    // ── Mandates ───────────────────────────────────────────────

    fn create_mandate(&mut self, input: &MandateInput) -> GatewayResult<MandateRecord> {
        let record = remote(Operation::CreateMandate, self.insert_mandate(input))?;
        log::debug!("createMandate -> {}", record.mandate_id);
        Ok(record)
    }

    fn update_mandate(&mut self, mandate_id: &str, input: &MandateInput) -> GatewayResult<MandateRecord> {
        found(
            Operation::UpdateMandate,
            "Mandate",
            mandate_id,
            self.replace_mandate(mandate_id, input),
        )
    }

    fn delete_mandate(&mut self, mandate_id: &str) -> GatewayResult<()> {
        deleted(Operation::DeleteMandate, "Mandate", mandate_id, self.remove_mandate(mandate_id))
    }

    // ── Parties ────────────────────────────────────────────────

    fn create_retail(&mut self, input: &RetailInput) -> GatewayResult<RetailRecord> {
        let record = remote(Operation::CreateRetail, self.insert_retail(input))?;
        log::debug!("createRetail -> {}", record.retail_id);
        Ok(record)
    }

    fn update_retail(&mut self, retail_id: &str, input: &RetailInput) -> GatewayResult<RetailRecord> {
        found(Operation::UpdateRetail, "Retail", retail_id, self.replace_retail(retail_id, input))
    }

    fn delete_retail(&mut self, retail_id: &str) -> GatewayResult<()> {
        deleted(Operation::DeleteRetail, "Retail", retail_id, self.remove_retail(retail_id))
    }

    fn create_business(&mut self, input: &BusinessInput) -> GatewayResult<BusinessRecord> {
        let record = remote(Operation::CreateBusiness, self.insert_business(input))?;
        log::debug!("createBusiness -> {}", record.business_id);
        Ok(record)
    }

    fn update_business(&mut self, business_id: &str, input: &BusinessInput) -> GatewayResult<BusinessRecord> {
        found(
            Operation::UpdateBusiness,
            "Business",
            business_id,
            self.replace_business(business_id, input),
        )
    }

    fn delete_business(&mut self, business_id: &str) -> GatewayResult<()> {
        deleted(Operation::DeleteBusiness, "Business", business_id, self.remove_business(business_id))
    }

    // ── Customer ───────────────────────────────────────────────

    fn create_customer(&mut self, input: &CustomerInput) -> GatewayResult<CustomerRecord> {
        let op = Operation::CreateCustomer;
        match (&input.retail, &input.business) {
            (Some(id), _) => {
                found(op, "Retail", id, self.find_retail(id))?;
            }
            (None, Some(id)) => {
                found(op, "Business", id, self.find_business(id))?;
            }
            (None, None) => {
                return Err(GatewayError::new(
                    op,
                    "Customer must reference a retail or business record",
                ));
            }
        }
        let record = remote(op, self.insert_customer(input))?;
        log::debug!("createCustomer -> {}", record.customer_id);
        Ok(record)
    }

    fn update_customer(&mut self, update: &CustomerUpdate) -> GatewayResult<CustomerRecord> {
        found(
            Operation::UpdateCustomer,
            "Customer",
            &update.customer_id,
            self.patch_customer(update),
        )
    }

    fn delete_customer(&mut self, customer_id: &str) -> GatewayResult<()> {
        deleted(Operation::DeleteCustomer, "Customer", customer_id, self.remove_customer(customer_id))
    }

    // ── Account ────────────────────────────────────────────────

    fn create_account(&mut self, input: &AccountInput) -> GatewayResult<AccountRecord> {
        let record = remote(Operation::CreateAccount, self.insert_account(input))?;
        log::debug!("createAccount -> {}", record.id);
        Ok(record)
    }

    fn update_account(&mut self, account_id: &str, input: &AccountInput) -> GatewayResult<AccountRecord> {
        found(Operation::UpdateAccount, "Account", account_id, self.replace_account(account_id, input))
    }

    fn delete_account(&mut self, account_id: &str) -> GatewayResult<()> {
        deleted(Operation::DeleteAccount, "Account", account_id, self.remove_account(account_id))
    }

    // ── Mandate rules ──────────────────────────────────────────

    fn create_mandate_rule(&mut self, input: &MandateRuleInput) -> GatewayResult<MandateRuleRecord> {
        let op = Operation::CreateMandateRule;
        found(op, "Customer", &input.customer_id, self.find_customer(&input.customer_id))?;
        remote(op, self.insert_mandate_rule(input))
    }

    fn update_mandate_rule(
        &mut self,
        mandate_rule_id: &str,
        input: &MandateRuleInput,
    ) -> GatewayResult<MandateRuleRecord> {
        found(
            Operation::UpdateMandateRule,
            "Mandate rule",
            mandate_rule_id,
            self.replace_mandate_rule(mandate_rule_id, input),
        )
    }
}
