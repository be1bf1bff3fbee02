//! Global settings schema and process metadata.
//!
//! # Responsibility
//! - Describe the canonical, caller-owned settings page layout.
//! - Expose which descriptors are persisted and their defaults.
//!
//! # Invariants
//! - Only `SettingDescriptor::Configurable` entries are persisted.
//! - Display descriptors are never looked up by name.
//! - `ProcessMetadata` always carries a `version` entry once validated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the running process version.
pub const VERSION_KEY: &str = "version";
/// Metadata key reserved for the install tracker.
pub const NEW_INSTALL_KEY: &str = "new_install";

/// Display-only descriptor flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    /// Informational paragraph.
    #[serde(rename = "string")]
    Paragraph,
    /// External hyperlink.
    Link,
}

/// Input widget for a configurable descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    /// Free-text input.
    Text,
    /// Single choice among `options`.
    Radio,
    /// Multiple choice among `options`.
    Select,
}

/// Persisted, user-editable setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurableSetting {
    #[serde(rename = "type")]
    pub kind: SettingKind,
    pub label: String,
    /// Persistence key in the `settings` table.
    pub name: String,
    /// Compiled-in default, replaced by the stored value on load.
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ConfigurableSetting {
    pub fn text(
        label: impl Into<String>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            kind: SettingKind::Text,
            label: label.into(),
            name: name.into(),
            value: default.into(),
            options: Vec::new(),
        }
    }
}

/// One entry of the settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingDescriptor {
    Configurable(ConfigurableSetting),
    Display {
        #[serde(rename = "type")]
        kind: DisplayKind,
        value: String,
    },
}

impl SettingDescriptor {
    pub fn paragraph(value: impl Into<String>) -> Self {
        Self::Display {
            kind: DisplayKind::Paragraph,
            value: value.into(),
        }
    }

    pub fn link(value: impl Into<String>) -> Self {
        Self::Display {
            kind: DisplayKind::Link,
            value: value.into(),
        }
    }

    pub fn as_configurable(&self) -> Option<&ConfigurableSetting> {
        match self {
            Self::Configurable(setting) => Some(setting),
            Self::Display { .. } => None,
        }
    }
}

/// Ordered settings page definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsSchema {
    pub descriptors: Vec<SettingDescriptor>,
}

impl SettingsSchema {
    pub fn new(descriptors: Vec<SettingDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Iterates over persisted descriptors in page order.
    pub fn configurable(&self) -> impl Iterator<Item = &ConfigurableSetting> {
        self.descriptors
            .iter()
            .filter_map(SettingDescriptor::as_configurable)
    }

    /// Returns the configurable descriptor persisted under `name`.
    pub fn find(&self, name: &str) -> Option<&ConfigurableSetting> {
        self.configurable().find(|setting| setting.name == name)
    }

    /// `(name, default)` rows seeded at first install.
    pub fn default_rows(&self) -> Vec<(String, String)> {
        self.configurable()
            .map(|setting| (setting.name.clone(), setting.value.clone()))
            .collect()
    }
}

/// Built-in settings page shipped with the application.
pub fn default_global_settings() -> SettingsSchema {
    SettingsSchema::new(vec![
        SettingDescriptor::paragraph(
            "Many plugins use third party apis, which often require sensitive api keys to \
             access (Spotify, last.fm, Deezer, etc). The ultrasonics-api program acts as a \
             proxy server for these apis, while keeping secret api keys secret.",
        ),
        SettingDescriptor::paragraph(
            "You can host this yourself alongside ultrasonics, and set up all the required api \
             keys for the services you want to use. Alternatively, use the official hosted \
             server for faster setup.",
        ),
        SettingDescriptor::paragraph(
            "If you don't need or want to use any of these services, just leave the url empty.",
        ),
        SettingDescriptor::link("https://github.com/XDGFX/ultrasonics-api"),
        SettingDescriptor::Configurable(ConfigurableSetting::text(
            "ultrasonics-api URL",
            "api_url",
            "https://ultrasonics-api.herokuapp.com/api/",
        )),
    ])
}

/// Process facts written once at first install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessMetadata {
    entries: BTreeMap<String, String>,
}

impl ProcessMetadata {
    /// Creates metadata carrying the running process version.
    pub fn new(version: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(VERSION_KEY.to_string(), version.into());
        Self { entries }
    }

    /// Adds or replaces one metadata entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn version(&self) -> Option<&str> {
        self.entries.get(VERSION_KEY).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ProcessMetadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Defaults the plugin host hands to the store at install time.
pub trait InstallDefaults {
    fn process_metadata(&self) -> ProcessMetadata;
    fn settings_schema(&self) -> SettingsSchema;
}

/// Host defaults built from a version string and the built-in settings page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDefaults {
    version: String,
}

impl BuiltinDefaults {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl InstallDefaults for BuiltinDefaults {
    fn process_metadata(&self) -> ProcessMetadata {
        ProcessMetadata::new(self.version.clone())
    }

    fn settings_schema(&self) -> SettingsSchema {
        default_global_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::{default_global_settings, ProcessMetadata, SettingDescriptor, SettingKind};

    #[test]
    fn default_schema_persists_only_api_url() {
        let schema = default_global_settings();
        let rows = schema.default_rows();

        assert_eq!(schema.descriptors.len(), 5);
        assert_eq!(
            rows,
            vec![(
                "api_url".to_string(),
                "https://ultrasonics-api.herokuapp.com/api/".to_string()
            )]
        );
        assert_eq!(schema.find("api_url").unwrap().kind, SettingKind::Text);
    }

    #[test]
    fn descriptors_serialize_with_type_field() {
        let schema = default_global_settings();
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json[0]["type"], "string");
        assert_eq!(json[3]["type"], "link");
        assert_eq!(json[4]["type"], "text");
        assert_eq!(json[4]["name"], "api_url");

        let parsed: Vec<SettingDescriptor> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, schema.descriptors);
    }

    #[test]
    fn metadata_from_iter_exposes_version() {
        let metadata: ProcessMetadata = [("version", "0.3.0"), ("build", "abc")]
            .into_iter()
            .collect();
        assert_eq!(metadata.version(), Some("0.3.0"));
        assert!(ProcessMetadata::default().version().is_none());
    }
}
