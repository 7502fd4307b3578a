//! Top-level planner dispatch: PK/unique-key lookups, forward-only
//! connection pagination, vector search, and mutation statements.

use indexmap::IndexSet;
use serde_json::Value;
use tidb_graphql_error::{codes, PlanError};

use crate::cost::CostCheck;
use crate::cursor::{Cursor, CursorValue, SortDirection};
use crate::filter::{self, coerce_scalar, resolve_column};
use crate::naming::Namer;
use crate::order_by::{self, OrderByPolicy, ResolvedOrderBy};
use crate::quoting::{quote_ident, quote_qualified};
use crate::schema::{
    EdgeListRelationship, Index, ManyToManyRelationship, OneToManyRelationship, Relationship, RelationshipFields, Schema, Table,
};
use crate::value::{self, SqlValue};

use super::batch::{self, WindowBatchArgs};
use super::{ConnectionPlan, Plan, SQLQuery, VectorConnectionPlan};

/// Default and maximum `first` for connection pagination.
pub const DEFAULT_CONNECTION_LIMIT: u32 = 25;
pub const MAX_CONNECTION_LIMIT: u32 = 100;

/// Which cosine/L2 distance function backs a vector search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorMetric {
    Cosine,
    L2,
}

impl VectorMetric {
    fn sql_fn(self) -> &'static str {
        match self {
            VectorMetric::Cosine => "VEC_COSINE_DISTANCE",
            VectorMetric::L2 => "VEC_L2_DISTANCE",
        }
    }
}

/// Parses the `metric` argument; anything other than `COSINE`/`L2` fails
/// planning.
pub fn parse_vector_metric(raw: &str) -> Result<VectorMetric, PlanError> {
    match raw {
        "COSINE" => Ok(VectorMetric::Cosine),
        "L2" => Ok(VectorMetric::L2),
        other => Err(PlanError::new(
            codes::ARG_BAD_VECTOR_METRIC,
            format!("unknown vector metric `{other}`; expected COSINE or L2"),
        )),
    }
}

/// Rejects `before`/`last` at the call site before a connection is planned,
/// so the forward-only restriction fails with a clear argument error instead
/// of the caller silently ignoring the arguments. The same restriction
/// applies to vector search and to regular connections — this crate has no
/// backward-pagination SQL shape at all.
pub fn reject_backward_pagination(before: Option<&str>, last: Option<u32>) -> Result<(), PlanError> {
    if before.is_some() || last.is_some() {
        return Err(PlanError::new(
            codes::ARG_BACKWARD_PAGINATION_UNSUPPORTED,
            "backward pagination (`before`/`last`) is not supported; use `first`/`after`",
        ));
    }
    Ok(())
}

fn clamp_first(first: Option<i64>) -> Result<u32, PlanError> {
    match first {
        None => Ok(DEFAULT_CONNECTION_LIMIT),
        Some(v) if v < 0 => Err(PlanError::new(codes::ARG_BAD_FIRST, format!("first must not be negative, got {v}"))),
        Some(v) => Ok((v as u32).min(MAX_CONNECTION_LIMIT)),
    }
}

fn resolve_field_column<'t>(table: &'t Table, namer: &Namer, field_name: &str) -> Result<&'t crate::schema::Column, PlanError> {
    resolve_column(table, namer, field_name).ok_or_else(|| {
        PlanError::on_field(codes::ARG_UNKNOWN_COLUMN, field_name, format!("`{field_name}` is not a column of `{}`", table.name))
    })
}

fn resolve_projected(table: &Table, namer: &Namer, fields: &[String]) -> Result<Vec<String>, PlanError> {
    fields.iter().map(|f| resolve_field_column(table, namer, f).map(|c| c.name.clone())).collect()
}

fn all_columns(table: &Table) -> Vec<String> {
    table.columns.iter().map(|c| c.name.clone()).collect()
}

fn pk_equality(table: &Table, namer: &Namer, pk_args: &[(String, Value)]) -> Result<(String, Vec<SqlValue>), PlanError> {
    let pk_columns = table.primary_key_columns();
    if pk_columns.is_empty() {
        return Err(PlanError::new(codes::ARG_MISSING_PK_VALUE, format!("table `{}` has no primary key", table.name)));
    }
    let mut conditions = Vec::with_capacity(pk_columns.len());
    let mut args = Vec::with_capacity(pk_columns.len());
    for pk_col in pk_columns {
        let field_name = namer.column_field_name(&table.name, &pk_col.name);
        let value = pk_args
            .iter()
            .find(|(k, _)| k == &field_name)
            .map(|(_, v)| v)
            .ok_or_else(|| PlanError::on_field(codes::ARG_MISSING_PK_VALUE, &field_name, format!("missing required primary key value `{field_name}`")))?;
        conditions.push(format!("{} = ?", quote_ident(&pk_col.name)));
        args.push(coerce_scalar(pk_col, value, &field_name)?);
    }
    Ok((conditions.join(" AND "), args))
}

/// Single-row lookup keyed by the table's primary key, supplied as
/// `(graphqlFieldName, value)` pairs.
pub fn plan_by_pk(table: &Table, namer: &Namer, pk_args: &[(String, Value)], selected_fields: &[String]) -> Result<Plan, PlanError> {
    let (where_sql, args) = pk_equality(table, namer, pk_args)?;
    let columns = if selected_fields.is_empty() { all_columns(table) } else { resolve_projected(table, namer, selected_fields)? };
    let column_sql = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    let sql = format!("SELECT {column_sql} FROM {} WHERE {where_sql}", quote_ident(&table.name));
    Ok(Plan { root: SQLQuery::new(sql, args), table: table.name.clone(), columns })
}

/// Unique-index lookup (`user_by_<col>`): any index flagged `unique`
/// other than the primary key.
pub fn plan_by_unique_index(
    table: &Table,
    namer: &Namer,
    index_name: &str,
    args_in: &[(String, Value)],
    selected_fields: &[String],
) -> Result<Plan, PlanError> {
    let index: &Index = table
        .indexes
        .iter()
        .find(|i| i.name == index_name && i.unique)
        .ok_or_else(|| PlanError::new(codes::ARG_UNKNOWN_COLUMN, format!("`{index_name}` is not a unique index on `{}`", table.name)))?;

    let mut conditions = Vec::with_capacity(index.columns.len());
    let mut bind_args = Vec::with_capacity(index.columns.len());
    for col_name in &index.columns {
        let column = table
            .column(col_name)
            .ok_or_else(|| PlanError::new(codes::ARG_UNKNOWN_COLUMN, format!("index `{index_name}` references unknown column `{col_name}`")))?;
        let field_name = namer.column_field_name(&table.name, col_name);
        let value = args_in
            .iter()
            .find(|(k, _)| k == &field_name)
            .map(|(_, v)| v)
            .ok_or_else(|| PlanError::on_field(codes::ARG_MISSING_PK_VALUE, &field_name, format!("missing required value `{field_name}`")))?;
        conditions.push(format!("{} = ?", quote_ident(col_name)));
        bind_args.push(coerce_scalar(column, value, &field_name)?);
    }

    let columns = if selected_fields.is_empty() { all_columns(table) } else { resolve_projected(table, namer, selected_fields)? };
    let column_sql = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    let sql = format!("SELECT {column_sql} FROM {} WHERE {}", quote_ident(&table.name), conditions.join(" AND "));
    Ok(Plan { root: SQLQuery::new(sql, bind_args), table: table.name.clone(), columns })
}

fn cursor_value_to_sql(value: &CursorValue) -> SqlValue {
    match value {
        CursorValue::Null => SqlValue::Null,
        CursorValue::Int(i) => SqlValue::Int(*i),
        CursorValue::Float(f) => SqlValue::Float(*f),
        CursorValue::String(s) => SqlValue::String(s.clone()),
        CursorValue::Bool(b) => SqlValue::Bool(*b),
        CursorValue::Bytes(b) => SqlValue::Bytes(b.clone()),
    }
}

/// Builds the `after`-cursor seek predicate. When every
/// direction agrees, emits the compact row-value tuple comparison
/// (`(c1,…,cn) > (?,…,?)`); mixed directions fall back to the standard
/// lexicographic OR-cascade, which is correct for any direction mix but
/// verbose, so it's reserved for the case that actually needs it.
fn build_seek_predicate(columns: &[String], directions: &[SortDirection], values: &[CursorValue]) -> Result<(String, Vec<SqlValue>), PlanError> {
    if columns.len() != values.len() || columns.len() != directions.len() {
        return Err(PlanError::new(codes::CONSISTENCY_CURSOR_MISMATCH, "cursor value count does not match the orderBy column count"));
    }

    let uniform = directions.windows(2).all(|w| w[0] == w[1]);
    if uniform {
        let op = match directions.first().copied().unwrap_or(SortDirection::Asc) {
            SortDirection::Asc => ">",
            SortDirection::Desc => "<",
        };
        let cols = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let args = values.iter().map(cursor_value_to_sql).collect();
        return Ok((format!("({cols}) {op} ({placeholders})"), args));
    }

    let mut clauses = Vec::with_capacity(columns.len());
    let mut args = Vec::new();
    for i in 0..columns.len() {
        let mut eq_parts = Vec::with_capacity(i + 1);
        for (col, value) in columns.iter().zip(values).take(i) {
            eq_parts.push(format!("{} = ?", quote_ident(col)));
            args.push(cursor_value_to_sql(value));
        }
        let op = match directions[i] {
            SortDirection::Asc => ">",
            SortDirection::Desc => "<",
        };
        eq_parts.push(format!("{} {op} ?", quote_ident(&columns[i])));
        args.push(cursor_value_to_sql(&values[i]));
        clauses.push(format!("({})", eq_parts.join(" AND ")));
    }
    Ok((format!("({})", clauses.join(" OR ")), args))
}

fn projected_columns(table: &Table, namer: &Namer, selected_fields: &[String], relationship_local_keys: &[String], extra_columns: &[String]) -> Vec<String> {
    let mut set: IndexSet<String> = IndexSet::new();
    for field in selected_fields {
        if let Some(col) = resolve_column(table, namer, field) {
            set.insert(col.name.clone());
        }
    }
    for col in relationship_local_keys {
        set.insert(col.clone());
    }
    for col in table.primary_key_columns() {
        set.insert(col.name.clone());
    }
    for col in extra_columns {
        set.insert(col.clone());
    }
    set.into_iter().collect()
}

/// Arguments for `plan_connection` and the relationship-subfield connection
/// planners. `before`/`last` are structurally absent — reject them at
/// the resolver boundary via [`reject_backward_pagination`] before calling.
pub struct ConnectionArgs<'a> {
    pub first: Option<i64>,
    pub after: Option<&'a str>,
    pub where_input: Option<&'a Value>,
    pub order_by_input: Option<&'a [(String, String)]>,
    pub order_by_policy: OrderByPolicy,
    pub selected_fields: &'a [String],
    pub relationship_local_key_columns: &'a [String],
    pub include_total_count: bool,
    /// Enforced against the selection subtree under this field before any
    /// SQL is built; `CostCheck::trivial()` for callers with no selection
    /// tree to report (and nothing to gate on as a result).
    pub cost: CostCheck<'a>,
}

/// Forward-only, seek-based pagination over `table`, producing the Root/
/// Count/AggregateBase statement trio.
pub fn plan_connection(schema: &Schema, namer: &Namer, table: &Table, args: ConnectionArgs) -> Result<ConnectionPlan, PlanError> {
    args.cost.enforce()?;
    let first = clamp_first(args.first)?;
    let resolved_order_by = order_by::compile(table, namer, args.order_by_input, args.order_by_policy)?;
    let type_name = namer.type_name(&table.name);

    let filter = match args.where_input {
        Some(input) => Some(filter::compile(schema, namer, table, None, input)?),
        None => None,
    };

    let cursor_columns = resolved_order_by.columns();
    let cursor_directions = resolved_order_by.directions();
    let has_cursor = args.after.is_some();

    let mut where_parts = Vec::new();
    let mut where_args = Vec::new();
    if let Some(f) = &filter {
        where_parts.push(f.sql.clone());
        where_args.extend(f.args.clone());
    }
    if let Some(after) = args.after {
        let cursor = Cursor::decode(after)?;
        cursor.validate(&type_name, &resolved_order_by.key, &cursor_directions)?;
        let (seek_sql, seek_args) = build_seek_predicate(&cursor_columns, &cursor_directions, &cursor.values)?;
        where_parts.push(seek_sql);
        where_args.extend(seek_args);
    }
    let where_clause = if where_parts.is_empty() { "1=1".to_string() } else { where_parts.join(" AND ") };

    let columns = projected_columns(table, namer, args.selected_fields, args.relationship_local_key_columns, &cursor_columns);
    let column_sql = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");

    let root_sql = format!(
        "SELECT {column_sql} FROM {} WHERE {where_clause} ORDER BY {} LIMIT {}",
        quote_ident(&table.name),
        resolved_order_by.sql_order_by(),
        first + 1
    );
    let root = SQLQuery::new(root_sql, where_args.clone());

    let aggregate_base_sql = format!("SELECT {column_sql} FROM {} WHERE {where_clause}", quote_ident(&table.name));
    let aggregate_base = SQLQuery::new(aggregate_base_sql, where_args.clone());

    let count = if args.include_total_count {
        Some(SQLQuery::new(format!("SELECT COUNT(*) FROM ({}) AS `__count`", aggregate_base.sql), where_args))
    } else {
        None
    };

    Ok(ConnectionPlan {
        root,
        table: table.name.clone(),
        columns,
        count,
        aggregate_base,
        order_by: resolved_order_by,
        cursor_columns,
        first,
        has_cursor,
    })
}

/// Arguments for `plan_vector_search_connection`.
/// `before`/`last` have no field here — reject them before calling, same as
/// [`ConnectionArgs`].
pub struct VectorSearchArgs<'a> {
    pub vector: &'a [f64],
    pub metric: VectorMetric,
    pub first: Option<i64>,
    pub after: Option<&'a str>,
    pub where_input: Option<&'a Value>,
    pub selected_fields: &'a [String],
    pub include_total_count: bool,
    pub cost: CostCheck<'a>,
}

/// `PlanVectorSearchConnection`: k-nearest search wrapped in the same
/// seek/limit outer shell as a regular connection, ordered by distance then
/// PK.
pub fn plan_vector_search_connection(
    schema: &Schema,
    namer: &Namer,
    table: &Table,
    vector_column: &str,
    args: VectorSearchArgs,
) -> Result<VectorConnectionPlan, PlanError> {
    args.cost.enforce()?;
    let column = table
        .column(vector_column)
        .ok_or_else(|| PlanError::on_field(codes::ARG_UNKNOWN_COLUMN, vector_column, format!("`{vector_column}` is not a column of `{}`", table.name)))?;
    value::validate_vector_dimension(args.vector, column.vector_dimension)?;
    let vector_literal = value::encode_vector_literal(args.vector);

    let first = clamp_first(args.first)?;
    let type_name = namer.type_name(&table.name);
    let pk_columns: Vec<String> = table.primary_key_columns().iter().map(|c| c.name.clone()).collect();
    if pk_columns.is_empty() {
        return Err(PlanError::new(codes::ARG_MISSING_PK_VALUE, format!("table `{}` has no primary key for cursor tie-breaking", table.name)));
    }
    let distance_alias = "__vector_distance".to_string();

    let filter = match args.where_input {
        Some(input) => Some(filter::compile(schema, namer, table, Some(&table.name), input)?),
        None => None,
    };

    let columns = projected_columns(table, namer, args.selected_fields, &[], &pk_columns);
    let column_sql = columns.iter().map(|c| quote_qualified(&table.name, c)).collect::<Vec<_>>().join(", ");

    let mut inner_args = vec![SqlValue::String(vector_literal)];
    let inner_where = match &filter {
        Some(f) => {
            inner_args.extend(f.args.clone());
            format!(" WHERE {}", f.sql)
        }
        None => String::new(),
    };
    let inner_sql = format!(
        "SELECT {column_sql}, {}({}, ?) AS `{distance_alias}` FROM {}{inner_where}",
        args.metric.sql_fn(),
        quote_qualified(&table.name, vector_column),
        quote_ident(&table.name)
    );

    let cursor_columns: Vec<String> = std::iter::once(distance_alias.clone()).chain(pk_columns.iter().cloned()).collect();
    let cursor_directions: Vec<SortDirection> = vec![SortDirection::Asc; cursor_columns.len()];
    let order_by_key = format!("vectorDistance_{}", pk_columns.join("_"));
    let has_cursor = args.after.is_some();

    let mut outer_args = inner_args.clone();
    let seek_clause = match args.after {
        Some(after) => {
            let cursor = Cursor::decode(after)?;
            cursor.validate(&type_name, &order_by_key, &cursor_directions)?;
            let (seek_sql, seek_args) = build_seek_predicate(&cursor_columns, &cursor_directions, &cursor.values)?;
            outer_args.extend(seek_args);
            format!(" WHERE {seek_sql}")
        }
        None => String::new(),
    };

    let order_by_sql = cursor_columns.iter().map(|c| format!("{} ASC", quote_ident(c))).collect::<Vec<_>>().join(", ");
    let outer_sql = format!("SELECT * FROM ({inner_sql}) AS `vector_ranked`{seek_clause} ORDER BY {order_by_sql} LIMIT {}", first + 1);
    let root = SQLQuery::new(outer_sql, outer_args);

    let count = if args.include_total_count {
        let count_sql = format!("SELECT COUNT(*) FROM ({inner_sql}) AS `__count`");
        Some(SQLQuery::new(count_sql, inner_args))
    } else {
        None
    };

    Ok(VectorConnectionPlan {
        root,
        table: table.name.clone(),
        columns,
        count,
        vector_column: vector_column.to_string(),
        pk_columns,
        distance_alias,
        cursor_directions,
        first,
        has_cursor,
    })
}

/// Emits a plain parameterized `INSERT` using the same column-resolution and
/// value coercion path as PK lookups, consistent with the rest of the
/// planner's argument handling.
pub fn plan_insert(table: &Table, namer: &Namer, values: &[(String, Value)]) -> Result<Plan, PlanError> {
    if values.is_empty() {
        return Err(PlanError::new(codes::ARG_MISSING_PK_VALUE, "insert requires at least one column value"));
    }
    let mut columns = Vec::with_capacity(values.len());
    let mut args = Vec::with_capacity(values.len());
    for (field_name, value) in values {
        let column = resolve_field_column(table, namer, field_name)?;
        args.push(coerce_scalar(column, value, field_name)?);
        columns.push(column.name.clone());
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    let sql = format!("INSERT INTO {} ({column_list}) VALUES ({placeholders})", quote_ident(&table.name));
    Ok(Plan { root: SQLQuery::new(sql, args), table: table.name.clone(), columns })
}

/// PK-addressed `UPDATE` over a caller-supplied set of
/// `(fieldName, value)` pairs.
pub fn plan_update(table: &Table, namer: &Namer, pk_args: &[(String, Value)], set_values: &[(String, Value)]) -> Result<Plan, PlanError> {
    if set_values.is_empty() {
        return Err(PlanError::new(codes::ARG_MISSING_PK_VALUE, "update requires at least one column to set"));
    }
    let mut set_parts = Vec::with_capacity(set_values.len());
    let mut args = Vec::with_capacity(set_values.len());
    let mut columns = Vec::with_capacity(set_values.len());
    for (field_name, value) in set_values {
        let column = resolve_field_column(table, namer, field_name)?;
        set_parts.push(format!("{} = ?", quote_ident(&column.name)));
        args.push(coerce_scalar(column, value, field_name)?);
        columns.push(column.name.clone());
    }
    let (where_sql, where_args) = pk_equality(table, namer, pk_args)?;
    args.extend(where_args);
    let sql = format!("UPDATE {} SET {} WHERE {where_sql}", quote_ident(&table.name), set_parts.join(", "));
    Ok(Plan { root: SQLQuery::new(sql, args), table: table.name.clone(), columns })
}

/// PK-addressed `DELETE`.
pub fn plan_delete(table: &Table, namer: &Namer, pk_args: &[(String, Value)]) -> Result<Plan, PlanError> {
    let (where_sql, args) = pk_equality(table, namer, pk_args)?;
    let sql = format!("DELETE FROM {} WHERE {where_sql}", quote_ident(&table.name));
    Ok(Plan { root: SQLQuery::new(sql, args), table: table.name.clone(), columns: vec![] })
}

/// Arguments shared by the relationship-subfield connection planners
/// (one-to-many, many-to-many, edge-list).
/// `parent_key_values` holds one row per distinct parent whose children are
/// being batch-loaded this depth level, each in the relationship's own
/// local-key column order.
pub struct RelationshipBatchArgs<'a> {
    pub parent_key_values: &'a [Vec<SqlValue>],
    pub where_input: Option<&'a Value>,
    pub order_by_input: Option<&'a [(String, String)]>,
    pub order_by_policy: OrderByPolicy,
    pub selected_fields: &'a [String],
    pub first: Option<i64>,
    pub cost: CostCheck<'a>,
}

fn resolve_batch_table<'s>(schema: &'s Schema, table_name: &str, field_name: &str) -> Result<&'s Table, PlanError> {
    schema.table(table_name).ok_or_else(|| {
        PlanError::on_field(
            codes::ARG_UNKNOWN_RELATIONSHIP,
            field_name,
            format!("relationship `{field_name}` references unknown table `{table_name}`"),
        )
    })
}

fn compile_batch_where(schema: &Schema, namer: &Namer, table: &Table, where_input: Option<&Value>) -> Result<(Option<String>, Vec<SqlValue>), PlanError> {
    match where_input {
        Some(input) => {
            let f = filter::compile(schema, namer, table, None, input)?;
            Ok((Some(f.sql), f.args))
        }
        None => Ok((None, vec![])),
    }
}

/// The child side of a one-to-many relationship, windowed per parent.
pub fn plan_one_to_many_connection(
    schema: &Schema,
    namer: &Namer,
    r: &OneToManyRelationship,
    args: RelationshipBatchArgs,
) -> Result<SQLQuery, PlanError> {
    args.cost.enforce()?;
    let remote = resolve_batch_table(schema, &r.remote_table, &r.graphql_field_name)?;
    let order_by = order_by::compile(remote, namer, args.order_by_input, args.order_by_policy)?;
    let (where_sql, where_args) = compile_batch_where(schema, namer, remote, args.where_input)?;
    let first = clamp_first(args.first)?;
    let projected = projected_columns(remote, namer, args.selected_fields, &r.remote_columns, &order_by.columns());
    let batch_args = WindowBatchArgs {
        projected_columns: &projected,
        order_by: &order_by,
        parent_key_values: args.parent_key_values,
        user_where_sql: where_sql.as_deref(),
        user_where_args: &where_args,
        offset: 0,
        limit: first + 1,
    };
    Ok(batch::plan_one_to_many_batch(remote, r, batch_args))
}

/// Loads the target side through the junction table, windowed per parent.
pub fn plan_many_to_many_connection(
    schema: &Schema,
    namer: &Namer,
    r: &ManyToManyRelationship,
    args: RelationshipBatchArgs,
) -> Result<SQLQuery, PlanError> {
    args.cost.enforce()?;
    let remote = resolve_batch_table(schema, &r.remote_table, &r.graphql_field_name)?;
    let order_by = order_by::compile(remote, namer, args.order_by_input, args.order_by_policy)?;
    let (where_sql, where_args) = compile_batch_where(schema, namer, remote, args.where_input)?;
    let first = clamp_first(args.first)?;
    let projected = projected_columns(remote, namer, args.selected_fields, &r.remote_columns, &order_by.columns());
    let batch_args = WindowBatchArgs {
        projected_columns: &projected,
        order_by: &order_by,
        parent_key_values: args.parent_key_values,
        user_where_sql: where_sql.as_deref(),
        user_where_args: &where_args,
        offset: 0,
        limit: first + 1,
    };
    Ok(batch::plan_many_to_many_batch(remote, r, batch_args))
}

/// Loads junction rows directly, windowed per parent — there's no
/// far-endpoint join.
pub fn plan_edge_list_connection(
    schema: &Schema,
    namer: &Namer,
    r: &EdgeListRelationship,
    args: RelationshipBatchArgs,
) -> Result<SQLQuery, PlanError> {
    args.cost.enforce()?;
    let junction = resolve_batch_table(schema, &r.remote_table, &r.graphql_field_name)?;
    let order_by = order_by::compile(junction, namer, args.order_by_input, args.order_by_policy)?;
    let (where_sql, where_args) = compile_batch_where(schema, namer, junction, args.where_input)?;
    let first = clamp_first(args.first)?;
    let projected = projected_columns(junction, namer, args.selected_fields, &r.remote_columns, &order_by.columns());
    let batch_args = WindowBatchArgs {
        projected_columns: &projected,
        order_by: &order_by,
        parent_key_values: args.parent_key_values,
        user_where_sql: where_sql.as_deref(),
        user_where_args: &where_args,
        offset: 0,
        limit: first + 1,
    };
    Ok(batch::plan_edge_list_batch(junction, r, batch_args))
}

/// The builder a field name resolves to, together with the schema objects
/// the builder needs, so a caller doesn't have to re-derive which table,
/// index, or relationship a field refers to before invoking it.
#[derive(Debug, Clone, Copy)]
pub enum PlanKind<'s> {
    /// Singular root field, or a composite `_by_`-suffixed field naming all
    /// of a table's primary-key columns.
    ByPk { table: &'s Table },
    /// `<singular>_by_<col>…` matching a non-`PRIMARY` unique index.
    ByUniqueIndex { table: &'s Table, index: &'s Index },
    /// Plural root field: a paginated connection over the whole table.
    Connection { table: &'s Table },
    /// `search<Type>By<Col>Vector`.
    VectorSearch { table: &'s Table, vector_column: &'s str },
    OneToMany { parent: &'s Table, relationship: &'s OneToManyRelationship },
    ManyToMany { parent: &'s Table, relationship: &'s ManyToManyRelationship },
    EdgeList { parent: &'s Table, relationship: &'s EdgeListRelationship },
    Insert { table: &'s Table },
    Update { table: &'s Table },
    Delete { table: &'s Table },
}

/// Dispatches a resolved GraphQL field name against the schema, per the
/// planner's field-shape table: singular/`_by_` names resolve to PK or
/// unique-index lookups, plural names to connections, relationship names
/// (only checked when `parent` is `Some`, i.e. the field is nested under an
/// already-resolved table's type) to the batch connection planners,
/// `search<Type>By<Col>Vector` to vector search, and `create`/`update`/
/// `delete<Type>` to the mutation builders. Callers still assemble the
/// builder-specific argument struct (`ConnectionArgs`, `VectorSearchArgs`, …)
/// themselves; this only resolves *which* builder and *which* schema
/// objects apply.
pub fn plan_field<'s>(schema: &'s Schema, namer: &Namer, parent: Option<&'s Table>, field_name: &str) -> Result<PlanKind<'s>, PlanError> {
    if let Some(parent_table) = parent {
        if let Some(kind) = dispatch_relationship_subfield(parent_table, field_name) {
            return Ok(kind);
        }
    }

    if let Some(kind) = dispatch_vector_search(schema, namer, field_name) {
        return Ok(kind);
    }

    for table in &schema.tables {
        if field_name == namer.singular_field_name(&table.name) {
            return Ok(PlanKind::ByPk { table });
        }
        if let Some(kind) = dispatch_by_suffix(table, namer, field_name) {
            return Ok(kind);
        }
        if field_name == namer.list_field_name(&table.name) {
            return Ok(PlanKind::Connection { table });
        }
        if let Some(kind) = dispatch_mutation(table, namer, field_name) {
            return Ok(kind);
        }
    }

    Err(PlanError::on_field(
        codes::ARG_UNKNOWN_FIELD,
        field_name,
        format!("`{field_name}` does not match any known query or mutation field"),
    ))
}

fn dispatch_relationship_subfield<'s>(parent: &'s Table, field_name: &str) -> Option<PlanKind<'s>> {
    parent.relationships.iter().find(|r| r.graphql_field_name() == field_name).and_then(|r| match r {
        Relationship::OneToMany(r) => Some(PlanKind::OneToMany { parent, relationship: r }),
        Relationship::ManyToMany(r) => Some(PlanKind::ManyToMany { parent, relationship: r }),
        Relationship::EdgeList(r) => Some(PlanKind::EdgeList { parent, relationship: r }),
        // ManyToOne resolves to a single object via `batch::plan_many_to_one_batch`,
        // not one of the connection planners this dispatch table covers.
        Relationship::ManyToOne(_) => None,
    })
}

/// `<singular>_by_<col1>_<col2>…`: either every primary-key column (a
/// composite PK lookup) or the exact column set of some non-`PRIMARY`
/// unique index.
fn dispatch_by_suffix<'s>(table: &'s Table, namer: &Namer, field_name: &str) -> Option<PlanKind<'s>> {
    let marker = format!("{}_by_", namer.singular_field_name(&table.name));
    let suffix = field_name.strip_prefix(marker.as_str())?;
    let requested: Vec<&str> = suffix.split('_').collect();
    if requested.iter().any(|f| f.is_empty()) {
        return None;
    }

    let pk_fields: Vec<String> = table.primary_key_columns().iter().map(|c| namer.column_field_name(&table.name, &c.name)).collect();
    if !pk_fields.is_empty() && requested == pk_fields {
        return Some(PlanKind::ByPk { table });
    }

    table
        .indexes
        .iter()
        .find(|idx| idx.unique && !idx.name.eq_ignore_ascii_case("PRIMARY") && requested == index_field_names(table, namer, idx))
        .map(|index| PlanKind::ByUniqueIndex { table, index })
}

fn index_field_names(table: &Table, namer: &Namer, index: &Index) -> Vec<String> {
    index.columns.iter().map(|c| namer.column_field_name(&table.name, c)).collect()
}

/// `search<Type>By<Col>Vector`, where `<Type>` is the table's GraphQL type
/// name and `<Col>` is a vector-dimensioned column's field name.
fn dispatch_vector_search<'s>(schema: &'s Schema, namer: &Namer, field_name: &str) -> Option<PlanKind<'s>> {
    let stripped = field_name.strip_prefix("search").and_then(|s| s.strip_suffix("Vector"))?;
    for table in &schema.tables {
        let marker = format!("{}By", namer.type_name(&table.name));
        let Some(col_part) = stripped.strip_prefix(marker.as_str()) else { continue };
        if col_part.is_empty() {
            continue;
        }
        let field = lower_first(col_part);
        if let Some(column) = table.columns.iter().find(|c| c.vector_dimension > 0 && namer.column_field_name(&table.name, &c.name) == field) {
            return Some(PlanKind::VectorSearch { table, vector_column: &column.name });
        }
    }
    None
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `create<Type>`/`update<Type>`/`delete<Type>`.
fn dispatch_mutation<'s>(table: &'s Table, namer: &Namer, field_name: &str) -> Option<PlanKind<'s>> {
    let type_name = namer.type_name(&table.name);
    if field_name == format!("create{type_name}") {
        Some(PlanKind::Insert { table })
    } else if field_name == format!("update{type_name}") {
        Some(PlanKind::Update { table })
    } else if field_name == format!("delete{type_name}") {
        Some(PlanKind::Delete { table })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingOverrides;
    use crate::schema::{Column, ForeignKey, Index as SchemaIndex, Relationship};
    use serde_json::json;

    fn column(name: &str, data_type: &str, is_pk: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            column_type: data_type.to_string(),
            vector_dimension: if data_type == "vector" { 3 } else { 0 },
            is_nullable: !is_pk,
            is_primary_key: is_pk,
            is_generated: false,
            is_auto_increment: is_pk,
            is_auto_random: false,
            has_default: false,
            column_default: None,
            generation_expression: None,
            enum_values: vec![],
            comment: String::new(),
            override_type: None,
            graphql_field_name_override: None,
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    fn users_table() -> Table {
        Table {
            name: "users".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![column("id", "bigint", true), column("email", "varchar", false), column("name", "varchar", false)],
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![] as Vec<Relationship>,
            indexes: vec![SchemaIndex {
                name: "uniq_email".into(),
                unique: true,
                index_type: "BTREE".into(),
                columns: vec!["email".into()],
                is_vector_search_capable: false,
                comment: None,
            }],
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        }
    }

    fn docs_table() -> Table {
        Table {
            name: "docs".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![column("id", "bigint", true), column("embedding", "vector", false)],
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![] as Vec<Relationship>,
            indexes: vec![],
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        }
    }

    fn schema(tables: Vec<Table>) -> Schema {
        Schema { tables, junctions: Default::default(), names_applied: true }
    }

    #[test]
    fn plan_by_pk_builds_equality_lookup() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let plan = plan_by_pk(&table, &namer, &[("id".to_string(), json!(5))], &[]).unwrap();
        assert_eq!(plan.root.sql, "SELECT `id`, `email`, `name` FROM `users` WHERE `id` = ?");
        assert_eq!(plan.root.args, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn plan_by_pk_fails_when_value_missing() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let err = plan_by_pk(&table, &namer, &[], &[]).unwrap_err();
        assert_eq!(err.code, codes::ARG_MISSING_PK_VALUE);
    }

    #[test]
    fn plan_by_unique_index_looks_up_by_email() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let plan = plan_by_unique_index(&table, &namer, "uniq_email", &[("email".to_string(), json!("jane@example.com"))], &[]).unwrap();
        assert_eq!(plan.root.sql, "SELECT `id`, `email`, `name` FROM `users` WHERE `email` = ?");
        assert_eq!(plan.root.args, vec![SqlValue::String("jane@example.com".to_string())]);
    }

    #[test]
    fn clamp_first_rejects_negative_and_caps_upper_bound() {
        assert!(clamp_first(Some(-1)).is_err());
        assert_eq!(clamp_first(None).unwrap(), DEFAULT_CONNECTION_LIMIT);
        assert_eq!(clamp_first(Some(10_000)).unwrap(), MAX_CONNECTION_LIMIT);
    }

    #[test]
    fn plan_connection_emits_root_count_and_aggregate_base() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let schema = schema(vec![table.clone()]);
        let args = ConnectionArgs {
            first: Some(10),
            after: None,
            where_input: None,
            order_by_input: None,
            order_by_policy: OrderByPolicy::IndexPrefixOnly,
            selected_fields: &["name".to_string()],
            relationship_local_key_columns: &[],
            include_total_count: true,
            cost: crate::cost::CostCheck::trivial(),
        };
        let plan = plan_connection(&schema, &namer, &table, args).unwrap();
        assert!(plan.root.sql.contains("LIMIT 11"));
        assert!(plan.root.sql.contains("ORDER BY `id` ASC"));
        assert!(plan.count.is_some());
        assert!(plan.aggregate_base.sql.contains("WHERE 1=1"));
    }

    #[test]
    fn plan_connection_seek_uses_row_value_tuple_for_uniform_direction() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let schema = schema(vec![table.clone()]);
        let resolved = order_by::compile(&table, &namer, None, OrderByPolicy::IndexPrefixOnly).unwrap();
        let type_name = namer.type_name(&table.name);
        let cursor = Cursor::new(type_name, resolved.key.clone(), resolved.directions(), vec![CursorValue::Int(7)]);
        let encoded = cursor.encode();
        let args = ConnectionArgs {
            first: Some(10),
            after: Some(&encoded),
            where_input: None,
            order_by_input: None,
            order_by_policy: OrderByPolicy::IndexPrefixOnly,
            selected_fields: &[],
            relationship_local_key_columns: &[],
            include_total_count: false,
            cost: crate::cost::CostCheck::trivial(),
        };
        let plan = plan_connection(&schema, &namer, &table, args).unwrap();
        assert!(plan.root.sql.contains("(`id`) > (?)"));
        assert!(plan.root.args.contains(&SqlValue::Int(7)));
    }

    #[test]
    fn plan_connection_seek_falls_back_to_or_cascade_for_mixed_directions() {
        let mut table = users_table();
        table.columns.push(column("last_name", "varchar", false));
        table.columns.push(column("first_name", "varchar", false));
        table.indexes.push(SchemaIndex {
            name: "idx_name".into(),
            unique: false,
            index_type: "BTREE".into(),
            columns: vec!["last_name".into(), "first_name".into()],
            is_vector_search_capable: false,
            comment: None,
        });
        let namer = Namer::new(NamingOverrides::default());
        let schema = schema(vec![table.clone()]);
        let order_by_input = vec![("lastName".to_string(), "ASC".to_string()), ("firstName".to_string(), "DESC".to_string())];
        let resolved = order_by::compile(&table, &namer, Some(&order_by_input), OrderByPolicy::IndexPrefixOnly).unwrap();
        assert_eq!(resolved.directions(), vec![SortDirection::Asc, SortDirection::Desc, SortDirection::Asc]);
        let type_name = namer.type_name(&table.name);
        let cursor = Cursor::new(
            type_name,
            resolved.key.clone(),
            resolved.directions(),
            vec![CursorValue::String("Doe".into()), CursorValue::String("Jane".into()), CursorValue::Int(7)],
        );
        let encoded = cursor.encode();
        let args = ConnectionArgs {
            first: Some(10),
            after: Some(&encoded),
            where_input: None,
            order_by_input: Some(&order_by_input),
            order_by_policy: OrderByPolicy::IndexPrefixOnly,
            selected_fields: &[],
            relationship_local_key_columns: &[],
            include_total_count: false,
            cost: crate::cost::CostCheck::trivial(),
        };
        let plan = plan_connection(&schema, &namer, &table, args).unwrap();
        assert!(plan.root.sql.contains("OR"));
        assert!(plan.root.sql.contains("`last_name` > ?"));
        assert!(plan.root.sql.contains("`first_name` < ?"));
    }

    #[test]
    fn plan_connection_rejects_mismatched_cursor() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let schema = schema(vec![table.clone()]);
        let cursor = Cursor::new("Post", "id", vec![SortDirection::Asc], vec![CursorValue::Int(1)]);
        let encoded = cursor.encode();
        let args = ConnectionArgs {
            first: None,
            after: Some(&encoded),
            where_input: None,
            order_by_input: None,
            order_by_policy: OrderByPolicy::IndexPrefixOnly,
            selected_fields: &[],
            relationship_local_key_columns: &[],
            include_total_count: false,
            cost: crate::cost::CostCheck::trivial(),
        };
        let err = plan_connection(&schema, &namer, &table, args).unwrap_err();
        assert_eq!(err.code, codes::CONSISTENCY_CURSOR_MISMATCH);
    }

    #[test]
    fn plan_vector_search_rejects_dimension_mismatch() {
        let table = docs_table();
        let namer = Namer::new(NamingOverrides::default());
        let schema = schema(vec![table.clone()]);
        let vector = vec![0.1, 0.2];
        let args = VectorSearchArgs {
            vector: &vector,
            metric: VectorMetric::Cosine,
            first: Some(10),
            after: None,
            where_input: None,
            selected_fields: &[],
            include_total_count: false,
            cost: crate::cost::CostCheck::trivial(),
        };
        let err = plan_vector_search_connection(&schema, &namer, &table, "embedding", args).unwrap_err();
        assert_eq!(err.code, codes::CONSISTENCY_VECTOR_LENGTH);
    }

    #[test]
    fn plan_vector_search_builds_wrapped_distance_query() {
        let table = docs_table();
        let namer = Namer::new(NamingOverrides::default());
        let schema = schema(vec![table.clone()]);
        let vector = vec![0.1, 0.2, 0.3];
        let args = VectorSearchArgs {
            vector: &vector,
            metric: VectorMetric::Cosine,
            first: Some(10),
            after: None,
            where_input: None,
            selected_fields: &[],
            include_total_count: false,
            cost: crate::cost::CostCheck::trivial(),
        };
        let plan = plan_vector_search_connection(&schema, &namer, &table, "embedding", args).unwrap();
        assert!(plan.root.sql.contains("VEC_COSINE_DISTANCE"));
        assert!(plan.root.sql.contains("AS `vector_ranked`"));
        assert!(plan.root.sql.contains("ORDER BY `__vector_distance` ASC, `id` ASC"));
        assert_eq!(plan.root.args[0], SqlValue::String("[0.1,0.2,0.3]".to_string()));
    }

    #[test]
    fn parse_vector_metric_rejects_unknown() {
        assert!(parse_vector_metric("EUCLIDEAN").is_err());
        assert_eq!(parse_vector_metric("L2").unwrap(), VectorMetric::L2);
    }

    #[test]
    fn plan_insert_builds_parameterized_statement() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let plan = plan_insert(&table, &namer, &[("email".to_string(), json!("a@b.com")), ("name".to_string(), json!("Ann"))]).unwrap();
        assert_eq!(plan.root.sql, "INSERT INTO `users` (`email`, `name`) VALUES (?, ?)");
        assert_eq!(plan.root.args.len(), 2);
    }

    #[test]
    fn plan_update_combines_set_and_pk_where() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let plan = plan_update(&table, &namer, &[("id".to_string(), json!(1))], &[("name".to_string(), json!("New"))]).unwrap();
        assert_eq!(plan.root.sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
        assert_eq!(plan.root.args, vec![SqlValue::String("New".to_string()), SqlValue::Int(1)]);
    }

    #[test]
    fn plan_delete_builds_pk_where() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let plan = plan_delete(&table, &namer, &[("id".to_string(), json!(9))]).unwrap();
        assert_eq!(plan.root.sql, "DELETE FROM `users` WHERE `id` = ?");
        assert_eq!(plan.root.args, vec![SqlValue::Int(9)]);
    }

    #[test]
    fn reject_backward_pagination_fails_on_last_or_before() {
        assert!(reject_backward_pagination(None, None).is_ok());
        assert!(reject_backward_pagination(Some("cursor"), None).is_err());
        assert!(reject_backward_pagination(None, Some(10)).is_err());
    }

    fn posts_table() -> Table {
        Table {
            name: "posts".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![column("id", "bigint", true), column("author_id", "bigint", false), column("title", "varchar", false)],
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![] as Vec<Relationship>,
            indexes: vec![],
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        }
    }

    #[test]
    fn plan_one_to_many_connection_windows_over_remote_table() {
        let posts = posts_table();
        let schema = schema(vec![posts]);
        let namer = Namer::new(NamingOverrides::default());
        let r = crate::schema::OneToManyRelationship {
            local_columns: vec!["id".into()],
            remote_table: "posts".into(),
            remote_columns: vec!["author_id".into()],
            graphql_field_name: "posts".into(),
        };
        let args = RelationshipBatchArgs {
            parent_key_values: &[vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
            where_input: None,
            order_by_input: None,
            order_by_policy: OrderByPolicy::IndexPrefixOnly,
            selected_fields: &["title".to_string()],
            first: Some(10),
            cost: crate::cost::CostCheck::trivial(),
        };
        let sql_query = plan_one_to_many_connection(&schema, &namer, &r, args).unwrap();
        assert!(sql_query.sql.contains("PARTITION BY `posts`.`author_id`"));
        assert!(sql_query.sql.contains("`__rn` > ? AND `__rn` <= ?"));
    }

    #[test]
    fn plan_edge_list_connection_windows_over_junction_table() {
        let mut junction = table_with_two_fk_columns();
        junction.name = "post_tags".into();
        let schema = schema(vec![junction]);
        let namer = Namer::new(NamingOverrides::default());
        let r = crate::schema::EdgeListRelationship {
            local_columns: vec!["id".into()],
            remote_table: "post_tags".into(),
            remote_columns: vec!["post_id".into()],
            graphql_field_name: "postTags".into(),
        };
        let args = RelationshipBatchArgs {
            parent_key_values: &[vec![SqlValue::Int(1)]],
            where_input: None,
            order_by_input: None,
            order_by_policy: OrderByPolicy::AllowNonPrefix,
            selected_fields: &[],
            first: None,
            cost: crate::cost::CostCheck::trivial(),
        };
        let sql_query = plan_edge_list_connection(&schema, &namer, &r, args).unwrap();
        assert!(sql_query.sql.contains("PARTITION BY `post_tags`.`post_id`"));
    }

    #[test]
    fn plan_many_to_many_connection_joins_through_junction() {
        let tags = Table {
            name: "tags".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![column("id", "bigint", true), column("name", "varchar", false)],
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![] as Vec<Relationship>,
            indexes: vec![],
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        };
        let schema = schema(vec![tags]);
        let namer = Namer::new(NamingOverrides::default());
        let r = crate::schema::ManyToManyRelationship {
            local_columns: vec!["id".into()],
            remote_table: "tags".into(),
            remote_columns: vec!["id".into()],
            junction_table: "post_tags".into(),
            junction_local_fk_columns: vec!["post_id".into()],
            junction_remote_fk_columns: vec!["tag_id".into()],
            graphql_field_name: "tags".into(),
        };
        let args = RelationshipBatchArgs {
            parent_key_values: &[vec![SqlValue::Int(7)]],
            where_input: None,
            order_by_input: None,
            order_by_policy: OrderByPolicy::IndexPrefixOnly,
            selected_fields: &["name".to_string()],
            first: Some(5),
            cost: crate::cost::CostCheck::trivial(),
        };
        let sql_query = plan_many_to_many_connection(&schema, &namer, &r, args).unwrap();
        assert!(sql_query.sql.contains("INNER JOIN `post_tags` ON `post_tags`.`tag_id` = `tags`.`id`"));
        assert!(sql_query.sql.contains("PARTITION BY `post_tags`.`post_id`"));
    }

    fn table_with_two_fk_columns() -> Table {
        Table {
            name: "post_tags".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![column("post_id", "bigint", true), column("tag_id", "bigint", true)],
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![] as Vec<Relationship>,
            indexes: vec![],
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        }
    }

    #[test]
    fn plan_field_dispatches_singular_name_to_pk() {
        let schema = schema(vec![users_table()]);
        let namer = Namer::new(NamingOverrides::default());
        match plan_field(&schema, &namer, None, "user").unwrap() {
            PlanKind::ByPk { table } => assert_eq!(table.name, "users"),
            other => panic!("expected ByPk, got {other:?}"),
        }
    }

    #[test]
    fn plan_field_dispatches_composite_pk_by_suffix() {
        let schema = schema(vec![table_with_two_fk_columns()]);
        let namer = Namer::new(NamingOverrides::default());
        match plan_field(&schema, &namer, None, "postTag_by_postId_tagId").unwrap() {
            PlanKind::ByPk { table } => assert_eq!(table.name, "post_tags"),
            other => panic!("expected ByPk, got {other:?}"),
        }
    }

    #[test]
    fn plan_field_dispatches_unique_index_by_suffix() {
        let schema = schema(vec![users_table()]);
        let namer = Namer::new(NamingOverrides::default());
        match plan_field(&schema, &namer, None, "user_by_email").unwrap() {
            PlanKind::ByUniqueIndex { table, index } => {
                assert_eq!(table.name, "users");
                assert_eq!(index.name, "uniq_email");
            }
            other => panic!("expected ByUniqueIndex, got {other:?}"),
        }
    }

    #[test]
    fn plan_field_dispatches_plural_name_to_connection() {
        let schema = schema(vec![users_table()]);
        let namer = Namer::new(NamingOverrides::default());
        match plan_field(&schema, &namer, None, "users").unwrap() {
            PlanKind::Connection { table } => assert_eq!(table.name, "users"),
            other => panic!("expected Connection, got {other:?}"),
        }
    }

    #[test]
    fn plan_field_dispatches_search_vector_field() {
        let schema = schema(vec![docs_table()]);
        let namer = Namer::new(NamingOverrides::default());
        match plan_field(&schema, &namer, None, "searchDocByEmbeddingVector").unwrap() {
            PlanKind::VectorSearch { table, vector_column } => {
                assert_eq!(table.name, "docs");
                assert_eq!(vector_column, "embedding");
            }
            other => panic!("expected VectorSearch, got {other:?}"),
        }
    }

    #[test]
    fn plan_field_dispatches_relationship_subfield_under_parent() {
        let mut authors = users_table();
        authors.name = "authors".into();
        authors.relationships = vec![Relationship::OneToMany(crate::schema::OneToManyRelationship {
            local_columns: vec!["id".into()],
            remote_table: "posts".into(),
            remote_columns: vec!["author_id".into()],
            graphql_field_name: "posts".into(),
        })];
        let schema = schema(vec![authors.clone(), posts_table()]);
        let namer = Namer::new(NamingOverrides::default());
        match plan_field(&schema, &namer, Some(&authors), "posts").unwrap() {
            PlanKind::OneToMany { parent, relationship } => {
                assert_eq!(parent.name, "authors");
                assert_eq!(relationship.remote_table, "posts");
            }
            other => panic!("expected OneToMany, got {other:?}"),
        }
    }

    #[test]
    fn plan_field_dispatches_mutation_fields() {
        let schema = schema(vec![users_table()]);
        let namer = Namer::new(NamingOverrides::default());
        assert!(matches!(plan_field(&schema, &namer, None, "createUser").unwrap(), PlanKind::Insert { .. }));
        assert!(matches!(plan_field(&schema, &namer, None, "updateUser").unwrap(), PlanKind::Update { .. }));
        assert!(matches!(plan_field(&schema, &namer, None, "deleteUser").unwrap(), PlanKind::Delete { .. }));
    }

    #[test]
    fn plan_field_fails_on_unmatched_name() {
        let schema = schema(vec![users_table()]);
        let namer = Namer::new(NamingOverrides::default());
        let err = plan_field(&schema, &namer, None, "whatever").unwrap_err();
        assert_eq!(err.code, codes::ARG_UNKNOWN_FIELD);
    }
}
