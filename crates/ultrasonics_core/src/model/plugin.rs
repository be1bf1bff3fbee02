//! Plugin registry records.
//!
//! # Invariants
//! - A plugin is identified by `(name, version)`; each version keeps its own
//!   settings.
//! - `version` is a decimal number stored in canonical text form, so `1`,
//!   `1.0` and `01.00` all name the same version `1.0`.

use crate::model::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<int>\d+)(?:\.(?P<frac>\d+))?$").expect("valid plugin version regex")
});

/// Returns the canonical form of a decimal plugin version.
///
/// Leading integer zeros and trailing fraction zeros are dropped and the
/// fraction is never empty: `"1"` and `"1.50"` become `"1.0"` and `"1.5"`.
/// Returns `None` for anything that is not a single decimal number.
pub fn normalize_plugin_version(version: &str) -> Option<String> {
    let captures = VERSION_RE.captures(version.trim())?;
    let int = captures["int"].trim_start_matches('0');
    let frac = captures
        .name("frac")
        .map_or("", |frac| frac.as_str().trim_end_matches('0'));

    Some(format!(
        "{}.{}",
        if int.is_empty() { "0" } else { int },
        if frac.is_empty() { "0" } else { frac }
    ))
}

/// Returns whether `version` is an accepted plugin version string.
pub fn is_valid_plugin_version(version: &str) -> bool {
    normalize_plugin_version(version).is_some()
}

/// Persisted plugin row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Surrogate key assigned by storage.
    pub id: i64,
    pub name: String,
    /// Canonical decimal text, see `normalize_plugin_version`.
    pub version: String,
    /// `None` until the user configures this plugin version.
    pub settings: Option<Value>,
}

/// Result of looking up every stored version of one plugin name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionLookup {
    /// No row exists for the name.
    Missing,
    /// Stored versions in creation order; never empty.
    Found(Vec<String>),
}

impl VersionLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns stored versions, empty for `Missing`.
    pub fn versions(&self) -> &[String] {
        match self {
            Self::Missing => &[],
            Self::Found(versions) => versions.as_slice(),
        }
    }

    /// Compares decimally, so `contains("1")` matches a stored `1.0`.
    pub fn contains(&self, version: &str) -> bool {
        normalize_plugin_version(version)
            .is_some_and(|version| self.versions().iter().any(|known| *known == version))
    }
}

impl From<Vec<String>> for VersionLookup {
    fn from(value: Vec<String>) -> Self {
        if value.is_empty() {
            Self::Missing
        } else {
            Self::Found(value)
        }
    }
}
