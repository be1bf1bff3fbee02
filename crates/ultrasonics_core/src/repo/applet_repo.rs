//! Applet plan and last-run persistence.
//!
//! # Responsibility
//! - Store pipeline plans keyed by applet id.
//! - Record the outcome of the most recent run next to the plan.
//!
//! # Invariants
//! - `plan` and `lastrun` are written by column-scoped statements; an upsert
//!   of the plan never resets `lastrun` and vice versa.
//! - A missing applet on read is `None`, not an error.
//! - Delete is idempotent.

use crate::codec;
use crate::model::applet::{AppletId, AppletRecord};
use crate::model::value::Value;
use crate::repo::error::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const APPLETS_TABLE: &str = "applets";

/// Repository interface for applet records.
pub trait AppletRepository {
    /// Lists every applet ordered by id.
    ///
    /// All or nothing: one row that fails to decode fails the whole call with
    /// `MalformedRecord` keyed by that row's id, and no partial list is
    /// returned. Repair or delete the row to restore listing.
    fn list_applets(&self) -> StoreResult<Vec<AppletRecord>>;
    /// Inserts a plan or replaces the plan of an existing applet.
    fn upsert_applet_plan(&self, id: &AppletId, plan: &Value) -> StoreResult<()>;
    fn load_applet_plan(&self, id: &AppletId) -> StoreResult<Option<Value>>;
    fn load_applet(&self, id: &AppletId) -> StoreResult<Option<AppletRecord>>;
    /// Returns whether a row was removed.
    fn delete_applet(&self, id: &AppletId) -> StoreResult<bool>;
    fn update_applet_last_run(&self, id: &AppletId, outcome: &Value) -> StoreResult<()>;
}

/// SQLite-backed applet repository.
pub struct SqliteAppletRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAppletRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AppletRepository for SqliteAppletRepository<'_> {
    fn list_applets(&self) -> StoreResult<Vec<AppletRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, plan, lastrun FROM applets ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut applets = Vec::new();
        while let Some(row) = rows.next()? {
            applets.push(parse_applet_row(row)?);
        }

        Ok(applets)
    }

    fn upsert_applet_plan(&self, id: &AppletId, plan: &Value) -> StoreResult<()> {
        validate_id(id)?;
        let encoded = codec::encode(plan).map_err(StoreError::InvalidValue)?;

        self.conn.execute(
            "INSERT INTO applets (id, plan, lastrun) VALUES (?1, ?2, NULL)
             ON CONFLICT(id) DO UPDATE SET plan = excluded.plan;",
            params![id.as_str(), encoded],
        )?;
        Ok(())
    }

    fn load_applet_plan(&self, id: &AppletId) -> StoreResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT plan FROM applets WHERE id = ?1;",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => codec::decode(&text)
                .map(Some)
                .map_err(|err| StoreError::malformed(APPLETS_TABLE, id.as_str(), err)),
            None => Ok(None),
        }
    }

    fn load_applet(&self, id: &AppletId) -> StoreResult<Option<AppletRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, plan, lastrun FROM applets WHERE id = ?1;")?;
        let mut rows = stmt.query([id.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_applet_row(row)?));
        }

        Ok(None)
    }

    fn delete_applet(&self, id: &AppletId) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM applets WHERE id = ?1;", [id.as_str()])?;
        Ok(changed > 0)
    }

    fn update_applet_last_run(&self, id: &AppletId, outcome: &Value) -> StoreResult<()> {
        let encoded = codec::encode(outcome).map_err(StoreError::InvalidValue)?;

        let changed = self.conn.execute(
            "UPDATE applets SET lastrun = ?1 WHERE id = ?2;",
            params![encoded, id.as_str()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("applet {id}")));
        }

        Ok(())
    }
}

fn parse_applet_row(row: &Row<'_>) -> StoreResult<AppletRecord> {
    let id = AppletId::new(row.get::<_, String>("id")?);
    let plan_text: String = row.get("plan")?;
    let lastrun_text: Option<String> = row.get("lastrun")?;

    let plan = codec::decode(&plan_text)
        .map_err(|err| StoreError::malformed(APPLETS_TABLE, id.as_str(), err))?;
    let last_run = codec::decode_optional(lastrun_text.as_deref())
        .map_err(|err| StoreError::malformed(APPLETS_TABLE, id.as_str(), err))?;

    Ok(AppletRecord { id, plan, last_run })
}

fn validate_id(id: &AppletId) -> StoreResult<()> {
    if id.as_str().trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "applet id cannot be empty".to_string(),
        ));
    }
    Ok(())
}
