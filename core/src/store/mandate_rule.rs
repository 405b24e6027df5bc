use super::{new_id, BackOfficeStore};
use crate::{
    error::WizardResult,
    gateway::{MandateRuleInput, MandateRuleRecord},
};
use rusqlite::{params, OptionalExtension};

impl BackOfficeStore {
    // ── Mandate rule ───────────────────────────────────────────

    pub fn insert_mandate_rule(&self, input: &MandateRuleInput) -> WizardResult<MandateRuleRecord> {
        let mandate_rule_id = new_id();
        self.conn.execute(
            "INSERT INTO mandate_rule (mandate_rule_id, customer_id, mandate_type, signing_rule,
                                       minimum_transaction_amount, maximum_transaction_amount,
                                       maximum_daily_limit, modified_by, modified_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                mandate_rule_id,
                input.customer_id,
                input.mandate_type,
                input.signing_rule,
                input.minimum_transaction_amount,
                input.maximum_transaction_amount,
                input.maximum_daily_limit,
                input.modified_by,
                input.modified_on
            ],
        )?;
        self.log_operation("createMandateRule", &mandate_rule_id, input)?;
        Ok(MandateRuleRecord {
            mandate_rule_id,
            fields: input.clone(),
        })
    }

    pub fn replace_mandate_rule(
        &self,
        mandate_rule_id: &str,
        input: &MandateRuleInput,
    ) -> WizardResult<Option<MandateRuleRecord>> {
        let changed = self.conn.execute(
            "UPDATE mandate_rule SET customer_id = ?2, mandate_type = ?3, signing_rule = ?4,
                    minimum_transaction_amount = ?5, maximum_transaction_amount = ?6,
                    maximum_daily_limit = ?7, modified_by = ?8, modified_on = ?9
             WHERE mandate_rule_id = ?1",
            params![
                mandate_rule_id,
                input.customer_id,
                input.mandate_type,
                input.signing_rule,
                input.minimum_transaction_amount,
                input.maximum_transaction_amount,
                input.maximum_daily_limit,
                input.modified_by,
                input.modified_on
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.log_operation("updateMandateRule", mandate_rule_id, input)?;
        Ok(Some(MandateRuleRecord {
            mandate_rule_id: mandate_rule_id.to_string(),
            fields:          input.clone(),
        }))
    }

    pub fn find_mandate_rule(&self, mandate_rule_id: &str) -> WizardResult<Option<MandateRuleRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT mandate_rule_id, customer_id, mandate_type, signing_rule,
                        minimum_transaction_amount, maximum_transaction_amount,
                        maximum_daily_limit, modified_by, modified_on
                 FROM mandate_rule WHERE mandate_rule_id = ?1",
                params![mandate_rule_id],
                |row| {
                    Ok(MandateRuleRecord {
                        mandate_rule_id: row.get(0)?,
                        fields:          MandateRuleInput {
                            customer_id:                row.get(1)?,
                            mandate_type:               row.get(2)?,
                            signing_rule:               row.get(3)?,
                            minimum_transaction_amount: row.get(4)?,
                            maximum_transaction_amount: row.get(5)?,
                            maximum_daily_limit:        row.get(6)?,
                            modified_by:                row.get(7)?,
                            modified_on:                row.get(8)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn mandate_rules_by_ids(&self, ids: &[String]) -> WizardResult<Vec<MandateRuleRecord>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(r) = self.find_mandate_rule(id)? {
                out.push(r);
            }
        }
        Ok(out)
    }
}
