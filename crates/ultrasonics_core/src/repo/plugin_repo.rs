//! Plugin registry persistence.
//!
//! # Responsibility
//! - Register plugins by `(name, version)` and keep per-version settings.
//! - Answer "which versions of this plugin are known".
//!
//! # Invariants
//! - `(name, version)` is unique; duplicates are rejected on create.
//! - Versions are compared as decimals: every entry point normalizes them
//!   before touching SQL, and only canonical text is stored.
//! - Update/load act on exactly one row or report `ConstraintAmbiguity`.
//! - Version lists come back in creation order.

use crate::codec;
use crate::model::plugin::{normalize_plugin_version, PluginRecord, VersionLookup};
use crate::model::value::Value;
use crate::repo::error::{StoreError, StoreResult};
use rusqlite::{params, Connection, ErrorCode};

const PLUGINS_TABLE: &str = "plugins";

/// Repository interface for versioned plugin records.
pub trait PluginRepository {
    /// Inserts a plugin version with no settings and returns its surrogate id.
    fn create_plugin(&self, name: &str, version: &str) -> StoreResult<i64>;
    /// Replaces the settings of one plugin version.
    fn update_plugin_settings(&self, name: &str, version: &str, settings: &Value)
        -> StoreResult<()>;
    /// Lists every stored version for `name`.
    fn find_plugin_versions(&self, name: &str) -> StoreResult<VersionLookup>;
    /// Loads settings for one plugin version; `None` when never configured.
    fn load_plugin_settings(&self, name: &str, version: &str) -> StoreResult<Option<Value>>;
    /// Lists every plugin row ordered by name, then creation order.
    fn list_plugins(&self) -> StoreResult<Vec<PluginRecord>>;
}

/// SQLite-backed plugin registry.
pub struct SqlitePluginRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePluginRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn count_matching(&self, name: &str, version: &str) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM plugins WHERE name = ?1 AND version = ?2;",
            params![name, version],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl PluginRepository for SqlitePluginRepository<'_> {
    fn create_plugin(&self, name: &str, version: &str) -> StoreResult<i64> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "plugin name cannot be empty".to_string(),
            ));
        }
        let version = canonical_version(version)?;

        if self.count_matching(name, &version)? > 0 {
            return Err(duplicate(name, &version));
        }

        match self.conn.execute(
            "INSERT INTO plugins (name, version, settings) VALUES (?1, ?2, NULL);",
            params![name, version],
        ) {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(duplicate(name, &version))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_plugin_settings(
        &self,
        name: &str,
        version: &str,
        settings: &Value,
    ) -> StoreResult<()> {
        let version = canonical_version(version)?;
        let encoded = codec::encode(settings).map_err(StoreError::InvalidValue)?;

        let matched = self.count_matching(name, &version)?;
        if matched != 1 {
            return Err(ambiguity(name, &version, matched));
        }

        self.conn.execute(
            "UPDATE plugins SET settings = ?1 WHERE name = ?2 AND version = ?3;",
            params![encoded, name, version],
        )?;
        Ok(())
    }

    fn find_plugin_versions(&self, name: &str) -> StoreResult<VersionLookup> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM plugins WHERE name = ?1 ORDER BY id ASC;")?;
        let mut rows = stmt.query([name])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(row.get::<_, String>("version")?);
        }

        Ok(VersionLookup::from(versions))
    }

    fn load_plugin_settings(&self, name: &str, version: &str) -> StoreResult<Option<Value>> {
        let version = canonical_version(version)?;
        let mut stmt = self.conn.prepare(
            "SELECT settings FROM plugins WHERE name = ?1 AND version = ?2 ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![name, version])?;
        let mut blobs: Vec<Option<String>> = Vec::new();
        while let Some(row) = rows.next()? {
            blobs.push(row.get("settings")?);
        }

        match blobs.as_slice() {
            [] => Err(StoreError::NotFound(format!("plugin {name}@{version}"))),
            [settings] => codec::decode_optional(settings.as_deref()).map_err(|err| {
                StoreError::malformed(PLUGINS_TABLE, format!("{name}@{version}"), err)
            }),
            many => Err(ambiguity(name, &version, many.len())),
        }
    }

    fn list_plugins(&self) -> StoreResult<Vec<PluginRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, version, settings FROM plugins ORDER BY name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut plugins = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let version: String = row.get("version")?;
            let raw: Option<String> = row.get("settings")?;
            let settings = codec::decode_optional(raw.as_deref()).map_err(|err| {
                StoreError::malformed(PLUGINS_TABLE, format!("{name}@{version}"), err)
            })?;
            plugins.push(PluginRecord {
                id: row.get("id")?,
                name,
                version,
                settings,
            });
        }

        Ok(plugins)
    }
}

fn canonical_version(version: &str) -> StoreResult<String> {
    normalize_plugin_version(version).ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "plugin version `{version}` is not a decimal version"
        ))
    })
}

fn duplicate(name: &str, version: &str) -> StoreError {
    StoreError::DuplicatePlugin {
        name: name.to_string(),
        version: version.to_string(),
    }
}

fn ambiguity(name: &str, version: &str, matched: usize) -> StoreError {
    StoreError::ConstraintAmbiguity {
        name: name.to_string(),
        version: version.to_string(),
        matched,
    }
}
