use super::{decode_ids, encode_ids, new_id, BackOfficeStore};
use crate::{
    error::WizardResult,
    gateway::{CustomerData, CustomerInput, CustomerRecord, CustomerUpdate},
};
use rusqlite::{params, OptionalExtension};

impl BackOfficeStore {
    // ── Customer ───────────────────────────────────────────────

    pub fn insert_customer(&self, input: &CustomerInput) -> WizardResult<CustomerRecord> {
        let customer_id = new_id();
        self.conn.execute(
            "INSERT INTO customer (customer_id, customer_type, retail_id, business_id, accounts,
                                   account_mandates, mandate_rules, modified_by, modified_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                customer_id,
                input.customer_type,
                input.retail,
                input.business,
                encode_ids(&input.accounts)?,
                encode_ids(&input.account_mandates)?,
                encode_ids(&input.mandate_rules)?,
                input.modified_by,
                input.modified_on
            ],
        )?;
        self.log_operation("createCustomer", &customer_id, input)?;
        Ok(CustomerRecord {
            customer_id,
            customer_type:    input.customer_type.clone(),
            retail:           input.retail.clone(),
            business:         input.business.clone(),
            accounts:         input.accounts.clone(),
            account_mandates: input.account_mandates.clone(),
            mandate_rules:    input.mandate_rules.clone(),
            modified_by:      input.modified_by.clone(),
            modified_on:      input.modified_on.clone(),
        })
    }

    /// Apply the `Some` fields of `update`. Returns `None` for an unknown customer.
    pub fn patch_customer(&self, update: &CustomerUpdate) -> WizardResult<Option<CustomerRecord>> {
        let Some(mut record) = self.find_customer(&update.customer_id)? else {
            return Ok(None);
        };
        if let Some(t) = &update.customer_type {
            record.customer_type = t.clone();
        }
        if let Some(r) = &update.retail {
            record.retail = Some(r.clone());
        }
        if let Some(b) = &update.business {
            record.business = Some(b.clone());
        }
        if let Some(a) = &update.accounts {
            record.accounts = a.clone();
        }
        if let Some(m) = &update.account_mandates {
            record.account_mandates = m.clone();
        }
        if let Some(r) = &update.mandate_rules {
            record.mandate_rules = r.clone();
        }
        record.modified_by = update.modified_by.clone();
        record.modified_on = update.modified_on.clone();

        self.conn.execute(
            "UPDATE customer SET customer_type = ?2, retail_id = ?3, business_id = ?4, accounts = ?5,
                    account_mandates = ?6, mandate_rules = ?7, modified_by = ?8, modified_on = ?9
             WHERE customer_id = ?1",
            params![
                record.customer_id,
                record.customer_type,
                record.retail,
                record.business,
                encode_ids(&record.accounts)?,
                encode_ids(&record.account_mandates)?,
                encode_ids(&record.mandate_rules)?,
                record.modified_by,
                record.modified_on
            ],
        )?;
        self.log_operation("updateCustomer", &record.customer_id, update)?;
        Ok(Some(record))
    }

    pub fn remove_customer(&self, customer_id: &str) -> WizardResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM customer WHERE customer_id = ?1", params![customer_id])?;
        if changed > 0 {
            self.log_operation("deleteCustomer", customer_id, &customer_id)?;
        }
        Ok(changed > 0)
    }

    pub fn find_customer(&self, customer_id: &str) -> WizardResult<Option<CustomerRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT customer_id, customer_type, retail_id, business_id, accounts,
                        account_mandates, mandate_rules, modified_by, modified_on
                 FROM customer WHERE customer_id = ?1",
                params![customer_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, customer_type, retail, business, accounts, mandates, rules, by, on)) = row else {
            return Ok(None);
        };
        Ok(Some(CustomerRecord {
            customer_id: id,
            customer_type,
            retail,
            business,
            accounts: decode_ids(&accounts)?,
            account_mandates: decode_ids(&mandates)?,
            mandate_rules: decode_ids(&rules)?,
            modified_by: by,
            modified_on: on,
        }))
    }

    /// The customer with every record it references resolved.
    pub fn customer_data(&self, customer_id: &str) -> WizardResult<Option<CustomerData>> {
        let Some(customer) = self.find_customer(customer_id)? else {
            return Ok(None);
        };
        let retail = match &customer.retail {
            Some(id) => self.find_retail(id)?,
            None => None,
        };
        let business = match &customer.business {
            Some(id) => self.find_business(id)?,
            None => None,
        };
        let mandates = self.mandates_by_ids(&customer.account_mandates)?;
        let accounts = self.accounts_by_ids(&customer.accounts)?;
        let mandate_rules = self.mandate_rules_by_ids(&customer.mandate_rules)?;
        Ok(Some(CustomerData {
            customer,
            retail,
            business,
            mandates,
            accounts,
            mandate_rules,
        }))
    }
}
