//! Global settings persistence.
//!
//! # Responsibility
//! - Read the flat `settings` table verbatim or merged into a schema.
//! - Update existing keys in place.
//!
//! # Invariants
//! - `save` never inserts rows; only install seeding does.
//! - The merged view contains schema descriptors only, so process metadata
//!   (`version`, `new_install`) never reaches the settings page.

use crate::db::table_exists;
use crate::model::settings::{SettingDescriptor, SettingsSchema};
use crate::repo::error::{StoreError, StoreResult};
use crate::repo::install_repo::SETTINGS_TABLE;
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::BTreeMap;

/// Repository interface for global settings.
pub trait SettingsRepository {
    /// Returns every stored `key -> value` row.
    fn load_raw(&self) -> StoreResult<BTreeMap<String, String>>;
    /// Returns a copy of `schema` with stored values applied.
    fn load_merged(&self, schema: &SettingsSchema) -> StoreResult<SettingsSchema>;
    /// Updates existing keys; returns how many rows changed.
    fn save<K, V>(&mut self, entries: &[(K, V)]) -> StoreResult<usize>
    where
        K: AsRef<str>,
        V: AsRef<str>;
}

/// SQLite-backed global settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    fn ensure_initialized(&self) -> StoreResult<()> {
        if table_exists(self.conn, SETTINGS_TABLE)? {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load_raw(&self) -> StoreResult<BTreeMap<String, String>> {
        self.ensure_initialized()?;

        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM settings ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut data = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get("key")?;
            let value: Option<String> = row.get("value")?;
            data.insert(key, value.unwrap_or_default());
        }

        Ok(data)
    }

    fn load_merged(&self, schema: &SettingsSchema) -> StoreResult<SettingsSchema> {
        let stored = self.load_raw()?;
        Ok(merge_into_schema(schema, &stored))
    }

    fn save<K, V>(&mut self, entries: &[(K, V)]) -> StoreResult<usize>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.ensure_initialized()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut changed = 0;
        {
            let mut update = tx.prepare("UPDATE settings SET value = ?1 WHERE key = ?2;")?;
            for (key, value) in entries {
                let (key, value): (&str, &str) = (key.as_ref(), value.as_ref());
                changed += update.execute(params![value, key])?;
            }
        }
        tx.commit()?;

        Ok(changed)
    }
}

/// Applies stored values to the configurable descriptors of `schema`.
pub fn merge_into_schema(
    schema: &SettingsSchema,
    stored: &BTreeMap<String, String>,
) -> SettingsSchema {
    let mut merged = schema.clone();
    for descriptor in &mut merged.descriptors {
        if let SettingDescriptor::Configurable(setting) = descriptor {
            if let Some(value) = stored.get(&setting.name) {
                setting.value.clone_from(value);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::merge_into_schema;
    use crate::model::settings::{default_global_settings, SettingDescriptor};
    use std::collections::BTreeMap;

    #[test]
    fn merge_overrides_configurable_and_skips_metadata() {
        let schema = default_global_settings();
        let stored = BTreeMap::from([
            ("api_url".to_string(), "https://custom/".to_string()),
            ("version".to_string(), "0.3.0".to_string()),
        ]);

        let merged = merge_into_schema(&schema, &stored);

        assert_eq!(merged.find("api_url").unwrap().value, "https://custom/");
        assert!(merged.find("version").is_none());
        assert_eq!(merged.descriptors.len(), schema.descriptors.len());
        assert_eq!(merged.descriptors[..4], schema.descriptors[..4]);
    }

    #[test]
    fn merge_keeps_default_when_row_missing() {
        let schema = default_global_settings();
        let merged = merge_into_schema(&schema, &BTreeMap::new());

        assert_eq!(merged, schema);
        assert!(matches!(
            merged.descriptors.last(),
            Some(SettingDescriptor::Configurable(_))
        ));
    }
}
