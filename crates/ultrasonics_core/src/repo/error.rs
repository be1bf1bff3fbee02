//! Error taxonomy shared by every repository and the `Store` facade.
//!
//! # Invariants
//! - Absence that callers expect (`load_plan` on a missing id, an unknown
//!   plugin name) is returned as `None`/`VersionLookup::Missing`, not as an
//!   error.
//! - `error_code()` values are stable and used in log lines.

use crate::codec::CodecError;
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Backing engine could not be opened, read or written.
    StorageUnavailable(DbError),
    /// A stored blob failed to decode.
    MalformedRecord {
        table: &'static str,
        key: String,
        source: CodecError,
    },
    /// The record the operation targets does not exist.
    NotFound(String),
    /// Zero or several rows matched where exactly one was expected.
    ConstraintAmbiguity {
        name: String,
        version: String,
        matched: usize,
    },
    /// `(name, version)` is already registered.
    DuplicatePlugin { name: String, version: String },
    /// The settings table has not been seeded yet.
    NotInitialized,
    /// Caller input was rejected before touching storage.
    InvalidInput(String),
    /// Caller value cannot be encoded.
    InvalidValue(CodecError),
    /// A previous holder of the connection lock panicked.
    LockPoisoned,
}

impl StoreError {
    /// Stable machine-readable code used in log events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::NotFound(_) => "not_found",
            Self::ConstraintAmbiguity { .. } => "constraint_ambiguity",
            Self::DuplicatePlugin { .. } => "duplicate_plugin",
            Self::NotInitialized => "not_initialized",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidValue(_) => "invalid_value",
            Self::LockPoisoned => "lock_poisoned",
        }
    }

    pub(crate) fn malformed(table: &'static str, key: impl Into<String>, source: CodecError) -> Self {
        Self::MalformedRecord {
            table,
            key: key.into(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::MalformedRecord { table, key, source } => {
                write!(f, "malformed record `{key}` in {table}: {source}")
            }
            Self::NotFound(subject) => write!(f, "not found: {subject}"),
            Self::ConstraintAmbiguity {
                name,
                version,
                matched,
            } => write!(
                f,
                "expected exactly one plugin row for {name}@{version}, matched {matched}"
            ),
            Self::DuplicatePlugin { name, version } => {
                write!(f, "plugin already registered: {name}@{version}")
            }
            Self::NotInitialized => write!(f, "settings have not been initialized"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidValue(err) => write!(f, "value cannot be stored: {err}"),
            Self::LockPoisoned => write!(f, "store connection lock is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::MalformedRecord { source, .. } => Some(source),
            Self::InvalidValue(err) => Some(err),
            Self::NotFound(_)
            | Self::ConstraintAmbiguity { .. }
            | Self::DuplicatePlugin { .. }
            | Self::NotInitialized
            | Self::InvalidInput(_)
            | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use crate::codec::CodecError;
    use std::error::Error;

    #[test]
    fn malformed_record_keeps_codec_source() {
        let err = StoreError::malformed("applets", "a1", CodecError::UnsupportedFormat(7));

        assert_eq!(err.error_code(), "malformed_record");
        assert!(err.to_string().contains("`a1` in applets"));
        assert!(err.source().is_some());
    }

    #[test]
    fn sqlite_errors_map_to_storage_unavailable() {
        let err = StoreError::from(rusqlite::Error::InvalidQuery);
        assert_eq!(err.error_code(), "storage_unavailable");
    }
}
