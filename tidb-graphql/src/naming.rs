//! Bidirectional SQL↔GraphQL name transforms.
//!
//! Table and column names in `INFORMATION_SCHEMA` are `snake_case`; GraphQL field
//! and type names are `camelCase`/`PascalCase`. This module converts between the
//! two, applies pluralization for list/connection field names, and lets a caller
//! register per-table and per-column overrides that win over the derived name.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Irregular English plurals the naive suffix rules below get wrong. Not
    /// exhaustive — an override table (see [`NamingOverrides`]) covers the rest.
    static ref IRREGULAR_PLURALS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("person", "people");
        m.insert("child", "children");
        m.insert("mouse", "mice");
        m.insert("goose", "geese");
        m.insert("man", "men");
        m.insert("woman", "women");
        m.insert("tooth", "teeth");
        m.insert("foot", "feet");
        m
    };
    static ref IRREGULAR_SINGULARS: HashMap<&'static str, &'static str> = {
        IRREGULAR_PLURALS.iter().map(|(k, v)| (*v, *k)).collect()
    };
}

/// Per-table and per-column GraphQL naming overrides, populated from DDL comments
/// or caller configuration. Always takes precedence over the derived name.
#[derive(Debug, Clone, Default)]
pub struct NamingOverrides {
    /// table name -> GraphQL type name (singular, PascalCase)
    pub type_names: HashMap<String, String>,
    /// table name -> GraphQL field name (plural, camelCase) for the root connection field
    pub list_field_names: HashMap<String, String>,
    /// table name -> GraphQL field name (singular, camelCase) for the root PK field
    pub singular_field_names: HashMap<String, String>,
    /// (table name, column name) -> GraphQL field name
    pub column_field_names: HashMap<(String, String), String>,
}

/// Converts between SQL identifiers and GraphQL names, consulting
/// [`NamingOverrides`] before falling back to derived conventions.
#[derive(Debug, Clone, Default)]
pub struct Namer {
    overrides: NamingOverrides,
}

impl Namer {
    pub fn new(overrides: NamingOverrides) -> Self {
        Self { overrides }
    }

    /// `orders_item` -> `OrdersItem`; the GraphQL object type name for a table.
    pub fn type_name(&self, table: &str) -> String {
        if let Some(o) = self.overrides.type_names.get(table) {
            return o.clone();
        }
        to_pascal_case(&singularize(table))
    }

    /// `order_items` -> `orderItems`; the root connection field name for a table.
    pub fn list_field_name(&self, table: &str) -> String {
        if let Some(o) = self.overrides.list_field_names.get(table) {
            return o.clone();
        }
        to_camel_case(&pluralize(table))
    }

    /// `order_items` -> `orderItem`; the root PK-lookup field name for a table.
    pub fn singular_field_name(&self, table: &str) -> String {
        if let Some(o) = self.overrides.singular_field_names.get(table) {
            return o.clone();
        }
        to_camel_case(&singularize(table))
    }

    /// `(order_items, line_number)` -> `lineNumber`.
    pub fn column_field_name(&self, table: &str, column: &str) -> String {
        if let Some(o) = self
            .overrides
            .column_field_names
            .get(&(table.to_string(), column.to_string()))
        {
            return o.clone();
        }
        to_camel_case(column)
    }

    /// Derives a many-to-one relationship field name from the first local FK
    /// column, stripping a trailing `_id` (e.g. `author_id` -> `author`).
    pub fn many_to_one_field_name(&self, first_local_column: &str) -> String {
        let stripped = strip_suffix_ci(first_local_column, "_id").unwrap_or(first_local_column);
        to_camel_case(stripped)
    }

    /// Derives a one-to-many relationship field name: pluralized target name when
    /// unambiguous, otherwise prefixed with the FK column name minus `_id`.
    pub fn one_to_many_field_name(&self, remote_table: &str, fk_column: &str, ambiguous: bool) -> String {
        if !ambiguous {
            return self.list_field_name(remote_table);
        }
        let prefix = strip_suffix_ci(fk_column, "_id").unwrap_or(fk_column);
        format!(
            "{}{}",
            to_camel_case(prefix),
            to_pascal_case(&pluralize(remote_table))
        )
    }
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() > suffix.len() && s.to_ascii_lowercase().ends_with(suffix) {
        Some(&s[..s.len() - suffix.len()])
    } else {
        None
    }
}

/// `order_items` -> `OrderItems`.
pub fn to_pascal_case(snake: &str) -> String {
    snake
        .split(|c: char| c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect()
}

/// `order_items` -> `orderItems`.
pub fn to_camel_case(snake: &str) -> String {
    let pascal = to_pascal_case(snake);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Naive English pluralization, irregular-aware. Operates on the last
/// underscore-delimited word of a `snake_case` identifier so `order_item` ->
/// `order_items`.
pub fn pluralize(word: &str) -> String {
    let (prefix, last) = split_last_word(word);
    let plural_last = if let Some(irregular) = IRREGULAR_PLURALS.get(last.to_lowercase().as_str()) {
        irregular.to_string()
    } else if last.ends_with('y') && !ends_with_vowel_then(last, 'y') {
        format!("{}ies", &last[..last.len() - 1])
    } else if last.ends_with('s')
        || last.ends_with('x')
        || last.ends_with('z')
        || last.ends_with("ch")
        || last.ends_with("sh")
    {
        format!("{last}es")
    } else {
        format!("{last}s")
    };
    format!("{prefix}{plural_last}")
}

/// Naive English singularization, the inverse of [`pluralize`] for the common
/// cases it generates.
pub fn singularize(word: &str) -> String {
    let (prefix, last) = split_last_word(word);
    let singular_last = if let Some(irregular) = IRREGULAR_SINGULARS.get(last.to_lowercase().as_str()) {
        irregular.to_string()
    } else if last.ends_with("ies") && last.len() > 3 {
        format!("{}y", &last[..last.len() - 3])
    } else if last.ends_with("ses")
        || last.ends_with("xes")
        || last.ends_with("zes")
        || last.ends_with("ches")
        || last.ends_with("shes")
    {
        last[..last.len() - 2].to_string()
    } else if last.ends_with('s') && last.len() > 1 {
        last[..last.len() - 1].to_string()
    } else {
        last.to_string()
    };
    format!("{prefix}{singular_last}")
}

fn split_last_word(word: &str) -> (&str, &str) {
    match word.rfind('_') {
        Some(idx) => (&word[..=idx], &word[idx + 1..]),
        None => ("", word),
    }
}

fn ends_with_vowel_then(word: &str, c: char) -> bool {
    let bytes: Vec<char> = word.chars().collect();
    if bytes.len() < 2 {
        return false;
    }
    let last = bytes[bytes.len() - 1];
    let prev = bytes[bytes.len() - 2];
    last == c && matches!(prev, 'a' | 'e' | 'i' | 'o' | 'u')
}
