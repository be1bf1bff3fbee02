//! Applet records: pipeline plan plus most recent run outcome.
//!
//! # Invariants
//! - `id` is the only identity of an applet.
//! - `plan` and `last_run` are written independently; writing one never
//!   resets the other.

use crate::model::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Caller-visible applet identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppletId(String);

impl AppletId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identifier for a new applet.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for AppletId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppletId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AppletId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Persisted applet row with decoded columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppletRecord {
    pub id: AppletId,
    pub plan: Value,
    /// Absent until the applet has executed at least once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<Value>,
}
