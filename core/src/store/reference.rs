use super::BackOfficeStore;
use crate::{
    error::WizardResult,
    gateway::{BusinessKyc, IndividualKyc, MandateType, ProductType},
    reference::ReferenceData,
};
use rusqlite::params;

impl BackOfficeStore {
    // ── Reference data ─────────────────────────────────────────

    /// Migrated in-memory store holding `data` (used in tests).
    pub fn in_memory_seeded(data: &ReferenceData) -> WizardResult<Self> {
        let store = Self::in_memory()?;
        store.migrate()?;
        store.seed_reference(data)?;
        Ok(store)
    }

    /// Load lookup lists. Existing rows with the same id are replaced.
    pub fn seed_reference(&self, data: &ReferenceData) -> WizardResult<()> {
        for k in &data.individual_kycs {
            self.conn.execute(
                "INSERT OR REPLACE INTO individual_kyc (kyc_id, kyc_type, first_name, last_name, risk_rating)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![k.individual_kyc_id, k.kyc_type, k.first_name, k.last_name, k.risk_rating],
            )?;
        }
        for k in &data.business_kycs {
            self.conn.execute(
                "INSERT OR REPLACE INTO business_kyc (kyc_id, kyc_type, legal_entity_name, risk_rating)
                 VALUES (?1, ?2, ?3, ?4)",
                params![k.business_kyc_id, k.kyc_type, k.legal_entity_name, k.risk_rating],
            )?;
        }
        for p in &data.product_types {
            self.conn.execute(
                "INSERT OR REPLACE INTO product_type (product_type_id, product_type_name) VALUES (?1, ?2)",
                params![p.product_type_id, p.product_type_name],
            )?;
        }
        for m in &data.mandate_types {
            self.conn.execute(
                "INSERT OR REPLACE INTO mandate_type (mandate_type_id, mandate_type_name, mandate_type_code)
                 VALUES (?1, ?2, ?3)",
                params![m.mandate_type_id, m.mandate_type_name, m.mandate_type_code],
            )?;
        }
        log::debug!(
            "seeded reference data: {} individual, {} business, {} product, {} mandate types",
            data.individual_kycs.len(),
            data.business_kycs.len(),
            data.product_types.len(),
            data.mandate_types.len()
        );
        Ok(())
    }

    pub fn list_individual_kycs(&self) -> WizardResult<Vec<IndividualKyc>> {
        let mut stmt = self.conn.prepare(
            "SELECT kyc_id, kyc_type, first_name, last_name, risk_rating
             FROM individual_kyc ORDER BY kyc_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(IndividualKyc {
                    individual_kyc_id: row.get(0)?,
                    kyc_type:          row.get(1)?,
                    first_name:        row.get(2)?,
                    last_name:         row.get(3)?,
                    risk_rating:       row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_business_kycs(&self) -> WizardResult<Vec<BusinessKyc>> {
        let mut stmt = self.conn.prepare(
            "SELECT kyc_id, kyc_type, legal_entity_name, risk_rating
             FROM business_kyc ORDER BY kyc_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BusinessKyc {
                    business_kyc_id:   row.get(0)?,
                    kyc_type:          row.get(1)?,
                    legal_entity_name: row.get(2)?,
                    risk_rating:       row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_product_types(&self) -> WizardResult<Vec<ProductType>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_type_id, product_type_name FROM product_type ORDER BY product_type_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProductType {
                    product_type_id:   row.get(0)?,
                    product_type_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_mandate_types(&self) -> WizardResult<Vec<MandateType>> {
        let mut stmt = self.conn.prepare(
            "SELECT mandate_type_id, mandate_type_name, mandate_type_code
             FROM mandate_type ORDER BY mandate_type_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MandateType {
                    mandate_type_id:   row.get(0)?,
                    mandate_type_name: row.get(1)?,
                    mandate_type_code: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
