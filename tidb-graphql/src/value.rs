//! Value codecs: ENUM/SET literal parsing and canonicalization, vector
//! literal decode/encode, UUID text↔binary, and base64↔bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tidb_graphql_error::{codes, PlanError};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

/// A bound SQL parameter value. This is the closed set of things a `?`
/// placeholder can carry; every filter/order-by/cursor value eventually becomes
/// one of these before it's handed to the `Queryer`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

/// Validates `input` against a column's declared ENUM values and returns the
/// canonical (declared-case) representation. MySQL ENUM comparisons are
/// effectively exact-match against the declaration list.
pub fn parse_enum_literal(declared: &[String], input: &str) -> Result<String, PlanError> {
    declared
        .iter()
        .find(|d| d.as_str() == input)
        .cloned()
        .ok_or_else(|| {
            PlanError::new(
                codes::CONSISTENCY_VALUE_COERCION,
                format!("`{input}` is not a declared ENUM value (allowed: {})", declared.join(", ")),
            )
        })
}

/// Canonicalizes a list of SET member values into MySQL's CSV representation,
/// ordered to match the column's declaration order (not the caller's order),
/// deduplicating repeats. Every input value must appear in `declared`.
pub fn canonicalize_set(declared: &[String], inputs: &[String]) -> Result<String, PlanError> {
    for input in inputs {
        if !declared.iter().any(|d| d == input) {
            return Err(PlanError::new(
                codes::CONSISTENCY_VALUE_COERCION,
                format!("`{input}` is not a declared SET value (allowed: {})", declared.join(", ")),
            ));
        }
    }
    Ok(declared
        .iter()
        .filter(|d| inputs.iter().any(|i| &i == d))
        .cloned()
        .collect::<Vec<_>>()
        .join(","))
}

/// Decodes a vector literal (JSON array of floats, as TiDB returns/accepts for
/// `VECTOR` columns) into its component values.
pub fn decode_vector_literal(text: &str) -> Result<Vec<f64>, PlanError> {
    let parsed: Vec<f64> = serde_json::from_str(text).map_err(|e| {
        PlanError::new(
            codes::CONSISTENCY_VALUE_COERCION,
            format!("invalid vector literal `{text}`: {e}"),
        )
    })?;
    if parsed.iter().any(|v| !v.is_finite()) {
        return Err(PlanError::new(
            codes::CONSISTENCY_VALUE_COERCION,
            "vector components must be finite numbers".to_string(),
        ));
    }
    Ok(parsed)
}

/// Encodes vector components as the JSON-array string literal bound as a single
/// `?` parameter. Vector literals are serialized as a JSON array in a single
/// string bind.
pub fn encode_vector_literal(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Validates a vector argument against a column's declared dimension.
pub fn validate_vector_dimension(values: &[f64], expected_dimension: u32) -> Result<(), PlanError> {
    if expected_dimension != 0 && values.len() as u32 != expected_dimension {
        return Err(PlanError::new(
            codes::CONSISTENCY_VECTOR_LENGTH,
            format!(
                "vector has {} components but column expects {}",
                values.len(),
                expected_dimension
            ),
        ));
    }
    Ok(())
}

/// Parses UUID text and encodes it to 16 raw bytes, for columns stored as
/// `BINARY(16)`.
pub fn uuid_to_bytes(text: &str) -> Result<Vec<u8>, PlanError> {
    let uuid = Uuid::parse_str(text).map_err(|e| {
        PlanError::new(codes::CONSISTENCY_VALUE_COERCION, format!("invalid UUID `{text}`: {e}"))
    })?;
    Ok(uuid.as_bytes().to_vec())
}

/// Decodes 16 raw bytes into canonical lowercase-hyphenated UUID text.
pub fn bytes_to_uuid(bytes: &[u8]) -> Result<String, PlanError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        PlanError::new(
            codes::CONSISTENCY_VALUE_COERCION,
            format!("expected 16 bytes for UUID, got {}", bytes.len()),
        )
    })?;
    Ok(Uuid::from_bytes(arr).hyphenated().to_string())
}

/// Canonicalizes UUID text to lowercase-hyphenated form, for columns stored as
/// `CHAR(36)` text rather than binary.
pub fn canonicalize_uuid_text(text: &str) -> Result<String, PlanError> {
    let uuid = Uuid::parse_str(text).map_err(|e| {
        PlanError::new(codes::CONSISTENCY_VALUE_COERCION, format!("invalid UUID `{text}`: {e}"))
    })?;
    Ok(uuid.hyphenated().to_string())
}

/// Decodes a base64 string (as supplied by a GraphQL client for a `Bytes`
/// scalar) into raw bytes. URL-safe, no padding — matches the cursor codec's
/// encoding so both surfaces share one alphabet.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, PlanError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(text))
        .map_err(|e| PlanError::new(codes::CONSISTENCY_VALUE_COERCION, format!("invalid base64: {e}")))
}

/// Encodes raw bytes as URL-safe base64 without padding.
pub fn encode_base64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Which temporal SQL type a literal is being validated against
/// (`DateTime`/`Date`/`Time`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    DateTime,
    Date,
    Time,
}

/// Rejects a `DateTime`/`Date`/`Time` literal that isn't well-formed before it
/// reaches the SQL text, rather than letting TiDB surface an opaque parse
/// error at execution time. `DateTime` requires RFC 3339; `Date`/`Time` use
/// the plain SQL `YYYY-MM-DD`/`HH:MM:SS[.ffffff]` forms.
pub fn validate_temporal_literal(kind: TemporalKind, text: &str) -> Result<(), PlanError> {
    let err = |e: time::error::Parse| PlanError::new(codes::CONSISTENCY_VALUE_COERCION, format!("invalid {kind:?} literal `{text}`: {e}"));
    match kind {
        TemporalKind::DateTime => {
            OffsetDateTime::parse(text, &Rfc3339).map_err(err)?;
        }
        TemporalKind::Date => {
            let fmt = format_description!("[year]-[month]-[day]");
            Date::parse(text, &fmt).map_err(err)?;
        }
        TemporalKind::Time => {
            let fmt = format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
            Time::parse(text, &fmt).map_err(err)?;
        }
    }
    Ok(())
}
