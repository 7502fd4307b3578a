//! Classifies SQL type strings into a closed set of GraphQL scalar categories
//! and answers `isNumeric`/`isComparable`.
//!
//! Classification is driven by the column's base `dataType` (e.g. `varchar`,
//! `int`, `enum`) plus the full `columnType` string for the cases that need more
//! than the base type — `tinyint(1)` as Boolean and `vector(N)` dimensioned types.
//! An explicit [`Column::override_type`](crate::schema::Column::override_type)
//! always wins over this derivation.

use lazy_static::lazy_static;
use regex::Regex;
use strum_macros::{Display, EnumString};

lazy_static! {
    static ref VECTOR_DIMENSION: Regex = Regex::new(r"^vector\((\d+)\)").unwrap();
}

/// The closed set of GraphQL scalar categories a SQL column can map to.
///
/// This is intentionally closed — new SQL types are mapped into one of these
/// categories rather than growing the set, so every downstream `match` on
/// `ScalarCategory` stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ScalarCategory {
    Int,
    Float,
    Decimal,
    String,
    Boolean,
    Bytes,
    Uuid,
    Enum,
    Set,
    Vector,
    DateTime,
    Date,
    Time,
    Json,
}

impl ScalarCategory {
    /// Whether the generic ordering operators (`lt`, `lte`, `gt`, `gte`) are
    /// valid for this category, per the per-category operator tables used by
    /// the filter compiler.
    pub fn is_comparable(self) -> bool {
        !matches!(
            self,
            ScalarCategory::Bytes | ScalarCategory::Uuid | ScalarCategory::Set | ScalarCategory::Json | ScalarCategory::Vector
        )
    }

    /// Whether this category represents a numeric SQL type.
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarCategory::Int | ScalarCategory::Float | ScalarCategory::Decimal)
    }
}

/// Classifies a column's base `dataType` and full `columnType` into a
/// [`ScalarCategory`]. Callers should check
/// [`Column::override_type`](crate::schema::Column::override_type) first; this
/// function implements only the derivation half of that classification.
pub fn classify(data_type: &str, column_type: &str) -> ScalarCategory {
    let dt = data_type.to_ascii_lowercase();
    let ct = column_type.to_ascii_lowercase();

    if dt == "tinyint" && ct.starts_with("tinyint(1)") {
        return ScalarCategory::Boolean;
    }

    match dt.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => ScalarCategory::Int,
        "float" | "double" | "real" => ScalarCategory::Float,
        "decimal" | "numeric" => ScalarCategory::Decimal,
        "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" => ScalarCategory::String,
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => ScalarCategory::Bytes,
        "enum" => ScalarCategory::Enum,
        "set" => ScalarCategory::Set,
        "vector" => ScalarCategory::Vector,
        "datetime" | "timestamp" => ScalarCategory::DateTime,
        "date" => ScalarCategory::Date,
        "time" => ScalarCategory::Time,
        "json" => ScalarCategory::Json,
        "bit" if ct.starts_with("bit(1)") => ScalarCategory::Boolean,
        _ => ScalarCategory::String,
    }
}

/// Parses a `vector(N)` columnType, returning `N` (0 if unspecified).
pub fn vector_dimension(column_type: &str) -> Option<u32> {
    let ct = column_type.to_ascii_lowercase();
    if !ct.starts_with("vector") {
        return None;
    }
    match VECTOR_DIMENSION.captures(&ct) {
        Some(caps) => Some(caps[1].parse().unwrap_or(0)),
        None => Some(0),
    }
}
