//! Store facade used by the plugin host, scheduler and web handlers.
//!
//! # Responsibility
//! - Own the SQLite connection for the whole process lifetime.
//! - Expose install, settings, plugin and applet operations as typed calls.
//! - Emit one structured log event per failed operation.
//!
//! # Invariants
//! - Every operation holds the connection lock for exactly one unit of work
//!   and releases it on all exit paths.
//! - The lock serializes writers, so concurrent plan upserts and last-run
//!   updates on the same applet never clobber each other's column.
//! - Expected absence (`None`, `VersionLookup::Missing`) is not logged as an
//!   error.

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::model::applet::{AppletId, AppletRecord};
use crate::model::plugin::{PluginRecord, VersionLookup};
use crate::model::settings::{InstallDefaults, ProcessMetadata, SettingsSchema};
use crate::model::value::Value;
use crate::repo::applet_repo::{AppletRepository, SqliteAppletRepository};
use crate::repo::error::{StoreError, StoreResult};
use crate::repo::install_repo::{
    InitOutcome, InstallRepository, InstallState, SqliteInstallRepository,
};
use crate::repo::plugin_repo::{PluginRepository, SqlitePluginRepository};
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-wide persistence handle.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (and migrates) the database described by `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(config)?))
    }

    /// Opens a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        event: &'static str,
        op: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = match self.conn.lock() {
            Ok(guard) => guard,
            Err(_) => {
                let err = StoreError::LockPoisoned;
                log_failure(event, &err);
                return Err(err);
            }
        };

        let result = op(&mut *guard);
        if let Err(err) = &result {
            log_failure(event, err);
        }
        result
    }

    // --- install ---

    pub fn is_new_install(&self) -> StoreResult<InstallState> {
        self.with_conn("install_state", |conn| {
            SqliteInstallRepository::new(conn).is_new_install()
        })
    }

    /// Seeds settings on first use; on later calls only checks the version.
    ///
    /// A stored version different from `metadata`'s is logged as a warning
    /// and reported in the outcome; it never fails the call.
    pub fn initialize_if_absent(
        &self,
        metadata: &ProcessMetadata,
        schema: &SettingsSchema,
    ) -> StoreResult<InitOutcome> {
        let outcome = self.with_conn("install_init", |conn| {
            SqliteInstallRepository::new(conn).initialize_if_absent(metadata, schema)
        })?;

        match &outcome {
            InitOutcome::Seeded => info!(
                "event=install_init module=install status=ok action=seeded settings={}",
                schema.configurable().count()
            ),
            InitOutcome::Existing {
                version_matches: true,
                ..
            } => debug!("event=install_init module=install status=ok action=version_check"),
            InitOutcome::Existing {
                stored_version,
                version_matches: false,
            } => warn!(
                "event=version_mismatch module=install status=warn stored_version={} running_version={}",
                stored_version.as_deref().unwrap_or("none"),
                metadata.version().unwrap_or("none")
            ),
        }

        Ok(outcome)
    }

    /// Pulls metadata and schema from the host and runs `initialize_if_absent`.
    pub fn bootstrap(&self, defaults: &dyn InstallDefaults) -> StoreResult<InitOutcome> {
        self.initialize_if_absent(&defaults.process_metadata(), &defaults.settings_schema())
    }

    /// Moves the install from new to established.
    ///
    /// A missing settings table or flag row is a logged no-op.
    pub fn mark_not_new(&self) -> StoreResult<()> {
        let updated = self.with_conn("install_confirm", |conn| {
            SqliteInstallRepository::new(conn).mark_not_new()
        })?;

        if updated {
            info!("event=install_confirm module=install status=ok");
        } else {
            warn!("event=install_confirm module=install status=skipped reason=flag_absent");
        }
        Ok(())
    }

    // --- global settings ---

    /// Returns every stored settings row, including process metadata.
    pub fn load_settings_raw(&self) -> StoreResult<BTreeMap<String, String>> {
        self.with_conn("settings_load", |conn| {
            SqliteSettingsRepository::new(conn).load_raw()
        })
    }

    /// Returns `schema` with stored values applied to its configurable entries.
    pub fn load_settings(&self, schema: &SettingsSchema) -> StoreResult<SettingsSchema> {
        self.with_conn("settings_load", |conn| {
            SqliteSettingsRepository::new(conn).load_merged(schema)
        })
    }

    /// Updates existing settings keys; unknown keys are ignored.
    pub fn save_settings<K, V>(&self, entries: &[(K, V)]) -> StoreResult<usize>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let changed = self.with_conn("settings_save", |conn| {
            SqliteSettingsRepository::new(conn).save(entries)
        })?;
        info!(
            "event=settings_save module=settings status=ok requested={} updated={}",
            entries.len(),
            changed
        );
        Ok(changed)
    }

    // --- plugins ---

    pub fn create_plugin(&self, name: &str, version: &str) -> StoreResult<i64> {
        let id = self.with_conn("plugin_create", |conn| {
            SqlitePluginRepository::new(conn).create_plugin(name, version)
        })?;
        info!(
            "event=plugin_create module=plugins status=ok plugin={} version={} id={}",
            name, version, id
        );
        Ok(id)
    }

    pub fn update_plugin(&self, name: &str, version: &str, settings: &Value) -> StoreResult<()> {
        self.with_conn("plugin_update", |conn| {
            SqlitePluginRepository::new(conn).update_plugin_settings(name, version, settings)
        })?;
        info!(
            "event=plugin_update module=plugins status=ok plugin={} version={}",
            name, version
        );
        Ok(())
    }

    pub fn find_plugin_versions(&self, name: &str) -> StoreResult<VersionLookup> {
        self.with_conn("plugin_versions", |conn| {
            SqlitePluginRepository::new(conn).find_plugin_versions(name)
        })
    }

    pub fn load_plugin(&self, name: &str, version: &str) -> StoreResult<Option<Value>> {
        self.with_conn("plugin_load", |conn| {
            SqlitePluginRepository::new(conn).load_plugin_settings(name, version)
        })
    }

    pub fn list_plugins(&self) -> StoreResult<Vec<PluginRecord>> {
        self.with_conn("plugin_list", |conn| {
            SqlitePluginRepository::new(conn).list_plugins()
        })
    }

    // --- applets ---

    pub fn list_applets(&self) -> StoreResult<Vec<AppletRecord>> {
        self.with_conn("applet_list", |conn| {
            SqliteAppletRepository::new(conn).list_applets()
        })
    }

    /// Stores `plan` for `id`, keeping any recorded last run.
    pub fn upsert_applet_plan(&self, id: &AppletId, plan: &Value) -> StoreResult<()> {
        self.with_conn("applet_upsert", |conn| {
            SqliteAppletRepository::new(conn).upsert_applet_plan(id, plan)
        })?;
        info!(
            "event=applet_upsert module=applets status=ok applet_id={}",
            id
        );
        Ok(())
    }

    pub fn load_applet_plan(&self, id: &AppletId) -> StoreResult<Option<Value>> {
        self.with_conn("applet_load", |conn| {
            SqliteAppletRepository::new(conn).load_applet_plan(id)
        })
    }

    pub fn load_applet(&self, id: &AppletId) -> StoreResult<Option<AppletRecord>> {
        self.with_conn("applet_load", |conn| {
            SqliteAppletRepository::new(conn).load_applet(id)
        })
    }

    /// Deletes an applet; deleting a missing id succeeds.
    pub fn delete_applet(&self, id: &AppletId) -> StoreResult<bool> {
        let removed = self.with_conn("applet_delete", |conn| {
            SqliteAppletRepository::new(conn).delete_applet(id)
        })?;
        info!(
            "event=applet_delete module=applets status=ok applet_id={} removed={}",
            id, removed
        );
        Ok(removed)
    }

    /// Records the outcome of the latest run, leaving the plan untouched.
    pub fn update_applet_last_run(&self, id: &AppletId, outcome: &Value) -> StoreResult<()> {
        self.with_conn("applet_lastrun", |conn| {
            SqliteAppletRepository::new(conn).update_applet_last_run(id, outcome)
        })?;
        info!(
            "event=applet_lastrun module=applets status=ok applet_id={}",
            id
        );
        Ok(())
    }
}

fn log_failure(event: &'static str, err: &StoreError) {
    match err {
        StoreError::NotFound(_) => debug!(
            "event={} module=store status=not_found error={}",
            event, err
        ),
        StoreError::InvalidInput(_)
        | StoreError::InvalidValue(_)
        | StoreError::DuplicatePlugin { .. }
        | StoreError::NotInitialized => warn!(
            "event={} module=store status=rejected error_code={} error={}",
            event,
            err.error_code(),
            err
        ),
        _ => error!(
            "event={} module=store status=error error_code={} error={}",
            event,
            err.error_code(),
            err
        ),
    }
}
