//! First-run detection and default seeding.
//!
//! # Responsibility
//! - Report whether the store was never seeded, freshly seeded, or
//!   established.
//! - Create and seed the `settings` table exactly once.
//!
//! # Invariants
//! - The `settings` table only ever appears through `initialize_if_absent`.
//! - Seeding is a single immediate transaction: either every row lands or
//!   the table does not exist afterwards.
//! - `new_install` only moves from `1` to `0`.

use crate::db::table_exists;
use crate::model::settings::{ProcessMetadata, SettingsSchema, NEW_INSTALL_KEY, VERSION_KEY};
use crate::repo::error::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeSet;

pub(crate) const SETTINGS_TABLE: &str = "settings";

const CREATE_SETTINGS_SQL: &str = "CREATE TABLE settings (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT
);";

/// Install lifecycle as seen from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// Settings table does not exist; seeding has never run.
    Unknown,
    /// Seeded and not yet confirmed by the user.
    New,
    /// Seeded and confirmed.
    Established,
}

/// Result of `initialize_if_absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Table was created and seeded by this call.
    Seeded,
    /// Table already existed; only the version check ran.
    Existing {
        stored_version: Option<String>,
        version_matches: bool,
    },
}

/// Repository interface for install state tracking.
pub trait InstallRepository {
    fn is_new_install(&self) -> StoreResult<InstallState>;
    fn initialize_if_absent(
        &mut self,
        metadata: &ProcessMetadata,
        schema: &SettingsSchema,
    ) -> StoreResult<InitOutcome>;
    /// Returns `false` when there was no `new_install` row to update.
    fn mark_not_new(&mut self) -> StoreResult<bool>;
}

/// SQLite-backed install tracker.
pub struct SqliteInstallRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteInstallRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl InstallRepository for SqliteInstallRepository<'_> {
    fn is_new_install(&self) -> StoreResult<InstallState> {
        if !table_exists(self.conn, SETTINGS_TABLE)? {
            return Ok(InstallState::Unknown);
        }

        let flag: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1;",
                [NEW_INSTALL_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match flag.flatten().as_deref() {
            Some("1") => Ok(InstallState::New),
            _ => Ok(InstallState::Established),
        }
    }

    fn initialize_if_absent(
        &mut self,
        metadata: &ProcessMetadata,
        schema: &SettingsSchema,
    ) -> StoreResult<InitOutcome> {
        let running_version = validate_seed_input(metadata, schema)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if table_exists(&tx, SETTINGS_TABLE)? {
            let stored_version: Option<Option<String>> = tx
                .query_row(
                    "SELECT value FROM settings WHERE key = ?1;",
                    [VERSION_KEY],
                    |row| row.get(0),
                )
                .optional()?;
            let stored_version = stored_version.flatten();
            let version_matches = stored_version.as_deref() == Some(running_version);
            return Ok(InitOutcome::Existing {
                stored_version,
                version_matches,
            });
        }

        tx.execute_batch(CREATE_SETTINGS_SQL)?;
        {
            let mut insert = tx.prepare("INSERT INTO settings (key, value) VALUES (?1, ?2);")?;
            for (key, value) in metadata.iter() {
                if key == NEW_INSTALL_KEY {
                    continue;
                }
                insert.execute(params![key, value])?;
            }
            insert.execute(params![NEW_INSTALL_KEY, "1"])?;
            for (key, value) in schema.default_rows() {
                insert.execute(params![key, value])?;
            }
        }
        tx.commit()?;

        Ok(InitOutcome::Seeded)
    }

    fn mark_not_new(&mut self) -> StoreResult<bool> {
        if !table_exists(self.conn, SETTINGS_TABLE)? {
            return Ok(false);
        }

        let changed = self.conn.execute(
            "UPDATE settings SET value = '0' WHERE key = ?1;",
            [NEW_INSTALL_KEY],
        )?;
        Ok(changed > 0)
    }
}

fn validate_seed_input<'a>(
    metadata: &'a ProcessMetadata,
    schema: &SettingsSchema,
) -> StoreResult<&'a str> {
    let version = match metadata.version() {
        Some(version) if !version.trim().is_empty() => version,
        _ => {
            return Err(StoreError::InvalidInput(
                "process metadata must include a non-empty `version`".to_string(),
            ))
        }
    };

    let mut seen: BTreeSet<&str> = metadata
        .iter()
        .map(|(key, _)| key)
        .filter(|key| *key != NEW_INSTALL_KEY)
        .collect();
    seen.insert(NEW_INSTALL_KEY);

    for setting in schema.configurable() {
        if setting.name.trim().is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "configurable setting `{}` has an empty name",
                setting.label
            )));
        }
        if !seen.insert(setting.name.as_str()) {
            return Err(StoreError::InvalidInput(format!(
                "setting name `{}` collides with another settings key",
                setting.name
            )));
        }
    }

    Ok(version)
}
