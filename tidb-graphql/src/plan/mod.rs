//! Query planner: turns a resolved GraphQL field plus its
//! arguments into one or more parameterized SQL statements.
//!
//! The planner is pure and synchronous — it never touches the network, only
//! ever reading a [`crate::schema::Schema`] and returning [`SQLQuery`]
//! values; running them against TiDB is the caller's job via
//! [`crate::queryer::Queryer`].

pub mod batch;
pub mod planner;

use crate::order_by::ResolvedOrderBy;
use crate::value::SqlValue;

/// One parameterized SQL statement, ready for `Queryer::query`.
#[derive(Debug, Clone, PartialEq)]
pub struct SQLQuery {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

impl SQLQuery {
    pub fn new(sql: impl Into<String>, args: Vec<SqlValue>) -> Self {
        Self { sql: sql.into(), args }
    }
}

/// A single-statement plan: PK lookup, unique-key lookup, or a mutation.
#[derive(Debug, Clone)]
pub struct Plan {
    pub root: SQLQuery,
    pub table: String,
    pub columns: Vec<String>,
}

/// A forward-only, seek-paginated connection plan. `root` carries
/// `LIMIT first+1` so the caller can detect
/// `hasNextPage` without a second round trip; `count` and `aggregate_base`
/// are separate statements because they must ignore the page-local LIMIT.
#[derive(Debug, Clone)]
pub struct ConnectionPlan {
    pub root: SQLQuery,
    pub table: String,
    pub columns: Vec<String>,
    /// `SELECT COUNT(*) FROM (…) AS __count`, present only when the caller
    /// selected `totalCount`.
    pub count: Option<SQLQuery>,
    /// The filtered-but-unpaginated base query, reused by relationship
    /// aggregate fields (e.g. `totalCount` on a nested connection) without
    /// re-deriving the WHERE clause.
    pub aggregate_base: SQLQuery,
    pub order_by: ResolvedOrderBy,
    pub cursor_columns: Vec<String>,
    pub first: u32,
    pub has_cursor: bool,
}

/// A `k`-nearest vector search connection. Always
/// forward-only: `before`/`last` are structurally absent from
/// [`planner::VectorSearchArgs`] rather than rejected at runtime.
#[derive(Debug, Clone)]
pub struct VectorConnectionPlan {
    pub root: SQLQuery,
    pub table: String,
    pub columns: Vec<String>,
    pub count: Option<SQLQuery>,
    pub vector_column: String,
    pub pk_columns: Vec<String>,
    /// The alias the inner distance expression is projected under
    /// (`__vector_distance`), also the leading cursor column.
    pub distance_alias: String,
    pub cursor_directions: Vec<crate::cursor::SortDirection>,
    pub first: u32,
    pub has_cursor: bool,
}
