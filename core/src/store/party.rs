use super::{decode_ids, encode_ids, new_id, BackOfficeStore};
use crate::{
    error::WizardResult,
    gateway::{BusinessInput, BusinessRecord, RetailInput, RetailRecord},
};
use rusqlite::{params, OptionalExtension};

impl BackOfficeStore {
    // ── Retail ─────────────────────────────────────────────────

    pub fn insert_retail(&self, input: &RetailInput) -> WizardResult<RetailRecord> {
        let retail_id = new_id();
        self.conn.execute(
            "INSERT INTO retail (retail_id, retail_type, individual_kyc, product_types, account_currency,
                                 risk_rating, account_mandates, modified_by, modified_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                retail_id,
                input.retail_type,
                input.individual_kyc,
                input.product_types,
                input.account_currency,
                input.risk_rating,
                encode_ids(&input.account_mandates)?,
                input.modified_by,
                input.modified_on
            ],
        )?;
        self.log_operation("createRetail", &retail_id, input)?;
        Ok(RetailRecord {
            retail_id,
            fields: input.clone(),
        })
    }

    pub fn replace_retail(&self, retail_id: &str, input: &RetailInput) -> WizardResult<Option<RetailRecord>> {
        let changed = self.conn.execute(
            "UPDATE retail SET retail_type = ?2, individual_kyc = ?3, product_types = ?4,
                    account_currency = ?5, risk_rating = ?6, account_mandates = ?7,
                    modified_by = ?8, modified_on = ?9
             WHERE retail_id = ?1",
            params![
                retail_id,
                input.retail_type,
                input.individual_kyc,
                input.product_types,
                input.account_currency,
                input.risk_rating,
                encode_ids(&input.account_mandates)?,
                input.modified_by,
                input.modified_on
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.log_operation("updateRetail", retail_id, input)?;
        Ok(Some(RetailRecord {
            retail_id: retail_id.to_string(),
            fields:    input.clone(),
        }))
    }

    pub fn remove_retail(&self, retail_id: &str) -> WizardResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM retail WHERE retail_id = ?1", params![retail_id])?;
        if changed > 0 {
            self.log_operation("deleteRetail", retail_id, &retail_id)?;
        }
        Ok(changed > 0)
    }

    pub fn find_retail(&self, retail_id: &str) -> WizardResult<Option<RetailRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT retail_id, retail_type, individual_kyc, product_types, account_currency,
                        risk_rating, account_mandates, modified_by, modified_on
                 FROM retail WHERE retail_id = ?1",
                params![retail_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, retail_type, kyc, product, currency, risk, mandates, by, on)) = row else {
            return Ok(None);
        };
        Ok(Some(RetailRecord {
            retail_id: id,
            fields:    RetailInput {
                retail_type,
                individual_kyc:   kyc,
                product_types:    product,
                account_currency: currency,
                risk_rating:      risk,
                account_mandates: decode_ids(&mandates)?,
                modified_by:      by,
                modified_on:      on,
            },
        }))
    }

    // ── Business ───────────────────────────────────────────────

    pub fn insert_business(&self, input: &BusinessInput) -> WizardResult<BusinessRecord> {
        let business_id = new_id();
        self.conn.execute(
            "INSERT INTO business (business_id, legal_entity_name, business_kyc, directors_kyc,
                                   product_types, account_currency, risk_rating, account_mandates,
                                   modified_by, modified_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                business_id,
                input.legal_entity_name,
                input.business_kyc,
                input.directors_kyc,
                input.product_types,
                input.account_currency,
                input.risk_rating,
                encode_ids(&input.account_mandates)?,
                input.modified_by,
                input.modified_on
            ],
        )?;
        self.log_operation("createBusiness", &business_id, input)?;
        Ok(BusinessRecord {
            business_id,
            fields: input.clone(),
        })
    }

    pub fn replace_business(
        &self,
        business_id: &str,
        input: &BusinessInput,
    ) -> WizardResult<Option<BusinessRecord>> {
        let changed = self.conn.execute(
            "UPDATE business SET legal_entity_name = ?2, business_kyc = ?3, directors_kyc = ?4,
                    product_types = ?5, account_currency = ?6, risk_rating = ?7,
                    account_mandates = ?8, modified_by = ?9, modified_on = ?10
             WHERE business_id = ?1",
            params![
                business_id,
                input.legal_entity_name,
                input.business_kyc,
                input.directors_kyc,
                input.product_types,
                input.account_currency,
                input.risk_rating,
                encode_ids(&input.account_mandates)?,
                input.modified_by,
                input.modified_on
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.log_operation("updateBusiness", business_id, input)?;
        Ok(Some(BusinessRecord {
            business_id: business_id.to_string(),
            fields:      input.clone(),
        }))
    }

    pub fn remove_business(&self, business_id: &str) -> WizardResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM business WHERE business_id = ?1", params![business_id])?;
        if changed > 0 {
            self.log_operation("deleteBusiness", business_id, &business_id)?;
        }
        Ok(changed > 0)
    }

    pub fn find_business(&self, business_id: &str) -> WizardResult<Option<BusinessRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT business_id, legal_entity_name, business_kyc, directors_kyc, product_types,
                        account_currency, risk_rating, account_mandates, modified_by, modified_on
                 FROM business WHERE business_id = ?1",
                params![business_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, legal, business_kyc, directors, product, currency, risk, mandates, by, on)) = row
        else {
            return Ok(None);
        };
        Ok(Some(BusinessRecord {
            business_id: id,
            fields:      BusinessInput {
                legal_entity_name: legal,
                business_kyc,
                directors_kyc:     directors,
                product_types:     product,
                account_currency:  currency,
                risk_rating:       risk,
                account_mandates:  decode_ids(&mandates)?,
                modified_by:       by,
                modified_on:       on,
            },
        }))
    }
}
