use super::{new_id, BackOfficeStore};
use crate::{
    error::WizardResult,
    gateway::{AccountInput, AccountRecord},
};
use rusqlite::{params, OptionalExtension};

impl BackOfficeStore {
    // ── Account ────────────────────────────────────────────────

    pub fn insert_account(&self, input: &AccountInput) -> WizardResult<AccountRecord> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO account (account_id, name, account_owner, account_number, description,
                                  account_type, branch_id, normal_balance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                input.name,
                input.account_owner,
                input.account_number,
                input.description,
                input.account_type,
                input.branch_id,
                input.normal_balance
            ],
        )?;
        self.log_operation("createAccount", &id, input)?;
        Ok(AccountRecord {
            id,
            fields: input.clone(),
        })
    }

    pub fn replace_account(&self, account_id: &str, input: &AccountInput) -> WizardResult<Option<AccountRecord>> {
        let changed = self.conn.execute(
            "UPDATE account SET name = ?2, account_owner = ?3, account_number = ?4, description = ?5,
                    account_type = ?6, branch_id = ?7, normal_balance = ?8
             WHERE account_id = ?1",
            params![
                account_id,
                input.name,
                input.account_owner,
                input.account_number,
                input.description,
                input.account_type,
                input.branch_id,
                input.normal_balance
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.log_operation("updateAccount", account_id, input)?;
        Ok(Some(AccountRecord {
            id:     account_id.to_string(),
            fields: input.clone(),
        }))
    }

    pub fn remove_account(&self, account_id: &str) -> WizardResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM account WHERE account_id = ?1", params![account_id])?;
        if changed > 0 {
            self.log_operation("deleteAccount", account_id, &account_id)?;
        }
        Ok(changed > 0)
    }

    pub fn find_account(&self, account_id: &str) -> WizardResult<Option<AccountRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT account_id, name, account_owner, account_number, description,
                        account_type, branch_id, normal_balance
                 FROM account WHERE account_id = ?1",
                params![account_id],
                |row| {
                    Ok(AccountRecord {
                        id:     row.get(0)?,
                        fields: AccountInput {
                            name:           row.get(1)?,
                            account_owner:  row.get(2)?,
                            account_number: row.get(3)?,
                            description:    row.get(4)?,
                            account_type:   row.get(5)?,
                            branch_id:      row.get(6)?,
                            normal_balance: row.get(7)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn accounts_by_ids(&self, ids: &[String]) -> WizardResult<Vec<AccountRecord>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(a) = self.find_account(id)? {
                out.push(a);
            }
        }
        Ok(out)
    }
}
