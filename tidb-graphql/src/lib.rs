//! Schema introspection, relationship inference, and query planning for
//! exposing TiDB/MySQL as GraphQL.
//!
//! This crate is a pure, synchronous core: it reads `INFORMATION_SCHEMA`
//! through a caller-supplied [`queryer::Queryer`] to build a [`schema::Schema`],
//! and turns resolved GraphQL field/argument pairs into parameterized
//! [`plan::SQLQuery`] values. It never holds a connection pool, never decides
//! how a GraphQL document is parsed, and never executes a planned query
//! itself — those are the caller's job.

pub mod cost;
pub mod cursor;
pub mod filter;
pub mod naming;
pub mod order_by;
pub mod plan;
pub mod quoting;
pub mod queryer;
pub mod schema;
pub mod sql_type;
pub mod value;

pub use cost::{CostCheck, CostEstimate, CostLimits, Selection};
pub use cursor::{Cursor, CursorValue, SortDirection};
pub use filter::CompiledFilter;
pub use naming::{Namer, NamingOverrides};
pub use order_by::{OrderByPolicy, ResolvedOrderBy};
pub use plan::planner::{
    plan_field, ConnectionArgs, PlanKind, RelationshipBatchArgs, VectorMetric, VectorSearchArgs, DEFAULT_CONNECTION_LIMIT,
    MAX_CONNECTION_LIMIT,
};
pub use plan::{ConnectionPlan, Plan, SQLQuery, VectorConnectionPlan};
pub use queryer::{QueryContext, Queryer, Row, RowIter};
pub use schema::introspector::introspect;
pub use schema::relationships::build as infer_relationships;
pub use schema::Schema;
pub use sql_type::ScalarCategory;
pub use tidb_graphql_error::{codes, Error, IntrospectionError, PlanError};
pub use value::SqlValue;
