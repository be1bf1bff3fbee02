//! Text codec for persisted settings, plans and run outcomes.
//!
//! # Responsibility
//! - Convert `Value` to and from the text stored in SQLite columns.
//! - Detect truncated or hand-edited records instead of guessing.
//!
//! # Invariants
//! - Encoded text is a JSON envelope `{"format":N,"value":<tagged value>}`.
//! - `decode(&encode(v)?)? == v` for every value `encode` accepts.
//! - Values nested deeper than `MAX_NESTING_DEPTH` are refused on encode, so
//!   nothing is written that the parser's recursion limit would refuse later.
//! - NULL or blank column text means "no value", never an empty list/map.

use crate::model::value::Value;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Envelope format written by this binary.
pub const CODEC_FORMAT: u32 = 1;

/// Deepest list/map nesting accepted by `encode`.
///
/// Each level costs two JSON levels (tag object + container); 32 keeps the
/// envelope well under serde_json's recursion limit of 128.
pub const MAX_NESTING_DEPTH: usize = 32;

pub type CodecResult<T> = Result<T, CodecError>;

/// Failure to encode or decode a stored value.
#[derive(Debug)]
pub enum CodecError {
    /// Text is not a well-formed envelope of a known value shape.
    Malformed(serde_json::Error),
    /// Envelope was written by an unknown format revision.
    UnsupportedFormat(u32),
    /// NaN and infinities cannot round-trip through the text format.
    NonFiniteFloat,
    /// Lists/maps nest deeper than `MAX_NESTING_DEPTH`.
    TooDeep { limit: usize },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed encoded value: {err}"),
            Self::UnsupportedFormat(format) => write!(
                f,
                "encoded value format {format} is not supported (expected {CODEC_FORMAT})"
            ),
            Self::NonFiniteFloat => write!(f, "non-finite float values cannot be encoded"),
            Self::TooDeep { limit } => {
                write!(f, "value nests deeper than {limit} lists/maps")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::UnsupportedFormat(_) | Self::NonFiniteFloat | Self::TooDeep { .. } => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: u32,
    value: &'a Value,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    format: u32,
    value: Value,
}

/// Encodes a value into its persisted text form.
///
/// # Errors
/// - `CodecError::NonFiniteFloat` when any nested float is NaN or infinite.
/// - `CodecError::TooDeep` when lists/maps nest past `MAX_NESTING_DEPTH`.
pub fn encode(value: &Value) -> CodecResult<String> {
    if value.nests_deeper_than(MAX_NESTING_DEPTH) {
        return Err(CodecError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    if !value.is_finite() {
        return Err(CodecError::NonFiniteFloat);
    }

    let text = serde_json::to_string(&EnvelopeRef {
        format: CODEC_FORMAT,
        value,
    })?;
    Ok(text)
}

/// Decodes persisted text back into a value.
///
/// # Errors
/// - `CodecError::Malformed` for anything that is not a complete envelope.
/// - `CodecError::UnsupportedFormat` for envelopes from another revision.
pub fn decode(text: &str) -> CodecResult<Value> {
    let envelope: Envelope = serde_json::from_str(text)?;
    if envelope.format != CODEC_FORMAT {
        return Err(CodecError::UnsupportedFormat(envelope.format));
    }

    Ok(envelope.value)
}

/// Decodes a nullable column, mapping NULL and blank text to `None`.
pub fn decode_optional(text: Option<&str>) -> CodecResult<Option<Value>> {
    match text {
        Some(raw) if !raw.trim().is_empty() => decode(raw).map(Some),
        _ => Ok(None),
    }
}
