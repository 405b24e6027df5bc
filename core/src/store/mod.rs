//! SQLite back-office store.
//!
//! RULE: Only the store talks to the database.
//! The wizard reaches it through `RemoteGateway`; it never executes SQL.

use crate::{error::WizardResult, event::EventLogEntry, route::WizardStep};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod account;
mod customer;
mod gateway;
mod mandate;
mod mandate_rule;
mod party;
mod reference;

pub struct BackOfficeStore {
    conn: Connection,
}

/// One row of the mutation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLogEntry {
    pub id:        i64,
    pub operation: String,
    pub entity_id: String,
    pub payload:   String, // JSON-serialized input
}

impl BackOfficeStore {
    pub fn open(path: &str) -> WizardResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> WizardResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> WizardResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_reference.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_onboarding.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> WizardResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, seq, step, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.session_id,
                entry.seq as i64,
                entry.step.name(),
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_session(&self, session_id: &str) -> WizardResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, seq, step, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY seq ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                let step: String = row.get(3)?;
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    session_id: row.get(1)?,
                    seq:        row.get::<_, i64>(2)? as u64,
                    step:       WizardStep::from_name(&step).unwrap_or(WizardStep::Kyc),
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Operation log ──────────────────────────────────────────

    pub(crate) fn log_operation<T: Serialize>(
        &self,
        operation: &str,
        entity_id: &str,
        payload: &T,
    ) -> WizardResult<()> {
        self.conn.execute(
            "INSERT INTO operation_log (operation, entity_id, payload) VALUES (?1, ?2, ?3)",
            params![operation, entity_id, serde_json::to_string(payload)?],
        )?;
        Ok(())
    }

    /// Every mutation applied to the store, oldest first.
    pub fn operation_log(&self) -> WizardResult<Vec<OperationLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, operation, entity_id, payload FROM operation_log ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(OperationLogEntry {
                    id:        row.get(0)?,
                    operation: row.get(1)?,
                    entity_id: row.get(2)?,
                    payload:   row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Operation names only, oldest first.
    pub fn operation_names(&self) -> WizardResult<Vec<String>> {
        Ok(self
            .operation_log()?
            .into_iter()
            .map(|e| e.operation)
            .collect())
    }

    // ── Inspection ─────────────────────────────────────────────

    fn count(&self, table: &str) -> WizardResult<u32> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n as u32)
    }

    pub fn mandate_count(&self) -> WizardResult<u32> {
        self.count("mandate")
    }

    pub fn customer_count(&self) -> WizardResult<u32> {
        self.count("customer")
    }

    pub fn retail_count(&self) -> WizardResult<u32> {
        self.count("retail")
    }

    pub fn business_count(&self) -> WizardResult<u32> {
        self.count("business")
    }

    pub fn account_count(&self) -> WizardResult<u32> {
        self.count("account")
    }

    pub fn mandate_rule_count(&self) -> WizardResult<u32> {
        self.count("mandate_rule")
    }

    /// Mandates that no customer references.
    pub fn orphaned_mandates(&self) -> WizardResult<Vec<String>> {
        let mut referenced = HashSet::new();
        let mut stmt = self.conn.prepare("SELECT account_mandates FROM customer")?;
        let lists = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for list in lists {
            referenced.extend(decode_ids(&list)?);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT mandate_id FROM mandate ORDER BY rowid ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().filter(|id| !referenced.contains(id)).collect())
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn encode_ids(ids: &[String]) -> WizardResult<String> {
    Ok(serde_json::to_string(ids)?)
}

pub(crate) fn decode_ids(json: &str) -> WizardResult<Vec<String>> {
    Ok(serde_json::from_str(json)?)
}
