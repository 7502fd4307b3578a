//! Error taxonomy shared by the introspector and the query planner.
//!
//! A handful of leaf error types, each carrying a stable `code` plus a
//! human-readable `message`, aggregated behind one top-level [`Error`] enum so
//! callers can match on category without caring which leaf produced it.

/// A single introspection failure.
///
/// Always fatal for the introspection call that produced it; `step` names which
/// INFORMATION_SCHEMA query was being run and `table` names the table being
/// processed, when applicable, so the surfaced message can point at the cause.
#[derive(Debug, Clone, thiserror::Error)]
#[error("introspection failed at step `{step}`{}: {message}", self.table_suffix())]
pub struct IntrospectionError {
    pub code: &'static str,
    pub step: String,
    pub table: Option<String>,
    pub message: String,
}

impl IntrospectionError {
    pub fn new(code: &'static str, step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            step: step.into(),
            table: None,
            message: message.into(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    fn table_suffix(&self) -> String {
        match &self.table {
            Some(t) => format!(" (table `{t}`)"),
            None => String::new(),
        }
    }
}

/// A single planning failure: invalid argument, consistency failure, or a
/// cost-limit violation. The `code` is a stable machine-readable tag (e.g.
/// `"PLAN_ARG_UNKNOWN_COLUMN"`, `"PLAN_COST_MAX_DEPTH"`) collaborators can use to
/// map onto GraphQL error extensions without parsing `message`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PlanError {
    pub code: &'static str,
    pub field: Option<String>,
    pub message: String,
}

impl PlanError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
        }
    }

    pub fn on_field(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Top-level error returned by every fallible operation in the crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl Error {
    /// The stable machine-readable code carried by the wrapped leaf error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Introspection(e) => e.code,
            Error::Plan(e) => e.code,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Common plan error codes, centralized so call sites can't typo a code string
/// that's matched on elsewhere.
pub mod codes {
    pub const ARG_BAD_FIRST: &str = "PLAN_ARG_BAD_FIRST";
    pub const ARG_UNKNOWN_COLUMN: &str = "PLAN_ARG_UNKNOWN_COLUMN";
    pub const ARG_UNKNOWN_FIELD: &str = "PLAN_ARG_UNKNOWN_FIELD";
    pub const ARG_UNKNOWN_RELATIONSHIP: &str = "PLAN_ARG_UNKNOWN_RELATIONSHIP";
    pub const ARG_UNSUPPORTED_OPERATOR: &str = "PLAN_ARG_UNSUPPORTED_OPERATOR";
    pub const ARG_NON_INDEXED_ORDER_BY: &str = "PLAN_ARG_NON_INDEXED_ORDER_BY";
    pub const ARG_MISSING_PK_VALUE: &str = "PLAN_ARG_MISSING_PK_VALUE";
    pub const ARG_DUPLICATE_ORDER_BY_FIELD: &str = "PLAN_ARG_DUPLICATE_ORDER_BY_FIELD";
    pub const ARG_EMPTY_ORDER_BY: &str = "PLAN_ARG_EMPTY_ORDER_BY";
    pub const ARG_NESTED_RELATIONSHIP_FILTER: &str = "PLAN_ARG_NESTED_RELATIONSHIP_FILTER";
    pub const ARG_INVALID_FILTER_SHAPE: &str = "PLAN_ARG_INVALID_FILTER_SHAPE";
    pub const ARG_BAD_VECTOR_METRIC: &str = "PLAN_ARG_BAD_VECTOR_METRIC";
    pub const ARG_BACKWARD_PAGINATION_UNSUPPORTED: &str = "PLAN_ARG_BACKWARD_PAGINATION_UNSUPPORTED";
    pub const CONSISTENCY_CURSOR_MISMATCH: &str = "PLAN_CONSISTENCY_CURSOR_MISMATCH";
    pub const CONSISTENCY_VECTOR_LENGTH: &str = "PLAN_CONSISTENCY_VECTOR_LENGTH";
    pub const CONSISTENCY_VALUE_COERCION: &str = "PLAN_CONSISTENCY_VALUE_COERCION";
    pub const COST_MAX_DEPTH: &str = "PLAN_COST_MAX_DEPTH";
    pub const COST_MAX_COMPLEXITY: &str = "PLAN_COST_MAX_COMPLEXITY";
    pub const COST_MAX_ROWS: &str = "PLAN_COST_MAX_ROWS";
    pub const COST_MAX_STATEMENTS: &str = "PLAN_COST_MAX_STATEMENTS";
    pub const COST_MAX_ROWS_PER_NODE: &str = "PLAN_COST_MAX_ROWS_PER_NODE";

    pub const INTROSPECT_TABLES: &str = "INTROSPECT_TABLES";
    pub const INTROSPECT_COLUMNS: &str = "INTROSPECT_COLUMNS";
    pub const INTROSPECT_PRIMARY_KEYS: &str = "INTROSPECT_PRIMARY_KEYS";
    pub const INTROSPECT_FOREIGN_KEYS: &str = "INTROSPECT_FOREIGN_KEYS";
    pub const INTROSPECT_INDEXES: &str = "INTROSPECT_INDEXES";
}
