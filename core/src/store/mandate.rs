use super::{new_id, BackOfficeStore};
use crate::{
    error::WizardResult,
    gateway::{MandateInput, MandateRecord},
};
use rusqlite::{params, OptionalExtension, Row};

fn mandate_from_row(row: &Row<'_>) -> rusqlite::Result<MandateRecord> {
    Ok(MandateRecord {
        mandate_id:   row.get(0)?,
        signatory:    row.get(1)?,
        mandate_type: row.get(2)?,
        category:     row.get(3)?,
        modified_by:  row.get(4)?,
        modified_on:  row.get(5)?,
    })
}

impl BackOfficeStore {
    // ── Mandate ────────────────────────────────────────────────

    pub fn insert_mandate(&self, input: &MandateInput) -> WizardResult<MandateRecord> {
        let mandate_id = new_id();
        self.conn.execute(
            "INSERT INTO mandate (mandate_id, signatory, mandate_type, category, modified_by, modified_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                mandate_id,
                input.signatory,
                input.mandate_type,
                input.category,
                input.modified_by,
                input.modified_on
            ],
        )?;
        self.log_operation("createMandate", &mandate_id, input)?;
        Ok(MandateRecord {
            mandate_id,
            signatory:    input.signatory.clone(),
            mandate_type: input.mandate_type.clone(),
            category:     input.category.clone(),
            modified_by:  input.modified_by.clone(),
            modified_on:  input.modified_on.clone(),
        })
    }

    /// Returns `None` when no mandate has this id.
    pub fn replace_mandate(
        &self,
        mandate_id: &str,
        input: &MandateInput,
    ) -> WizardResult<Option<MandateRecord>> {
        let changed = self.conn.execute(
            "UPDATE mandate SET signatory = ?2, mandate_type = ?3, category = ?4,
                    modified_by = ?5, modified_on = ?6
             WHERE mandate_id = ?1",
            params![
                mandate_id,
                input.signatory,
                input.mandate_type,
                input.category,
                input.modified_by,
                input.modified_on
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.log_operation("updateMandate", mandate_id, input)?;
        self.find_mandate(mandate_id)
    }

    pub fn remove_mandate(&self, mandate_id: &str) -> WizardResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM mandate WHERE mandate_id = ?1", params![mandate_id])?;
        if changed > 0 {
            self.log_operation("deleteMandate", mandate_id, &mandate_id)?;
        }
        Ok(changed > 0)
    }

    pub fn find_mandate(&self, mandate_id: &str) -> WizardResult<Option<MandateRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT mandate_id, signatory, mandate_type, category, modified_by, modified_on
                 FROM mandate WHERE mandate_id = ?1",
                params![mandate_id],
                mandate_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Mandates in the order of `ids`; unknown ids are skipped.
    pub fn mandates_by_ids(&self, ids: &[String]) -> WizardResult<Vec<MandateRecord>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(m) = self.find_mandate(id)? {
                out.push(m);
            }
        }
        Ok(out)
    }
}
