//! Relationship batch planner: loads one relationship's children for
//! a whole page of parents in a single statement, windowed per parent by
//! `ROW_NUMBER() OVER (PARTITION BY …)`.
//!
//! Depth `d+1` batches wait for depth `d` to finish, but sibling
//! relationships at the same depth run concurrently — this module only
//! builds the SQL; the caller owns scheduling.

use crate::order_by::ResolvedOrderBy;
use crate::plan::SQLQuery;
use crate::quoting::{quote_ident, quote_qualified};
use crate::schema::{EdgeListRelationship, ManyToManyRelationship, ManyToOneRelationship, OneToManyRelationship, Table};
use crate::value::SqlValue;

/// Inputs shared by every windowed batch shape (one-to-many, many-to-many,
/// edge-list). `parent_key_values` is one row per parent whose children are
/// being loaded, each row holding the parent-side key tuple in the same
/// column order as the relationship's local/remote key columns.
pub struct WindowBatchArgs<'a> {
    pub projected_columns: &'a [String],
    pub order_by: &'a ResolvedOrderBy,
    pub parent_key_values: &'a [Vec<SqlValue>],
    pub user_where_sql: Option<&'a str>,
    pub user_where_args: &'a [SqlValue],
    pub offset: u32,
    pub limit: u32,
}

/// Loads the single parent row referenced by a batch of children's FK
/// values in one statement, keyed back by `__batch_parent_N` aliases over
/// the remote table's own (referenced) key columns.
pub fn plan_many_to_one_batch(
    remote: &Table,
    r: &ManyToOneRelationship,
    parent_key_values: &[Vec<SqlValue>],
    projected_columns: &[String],
) -> SQLQuery {
    let key_columns = &r.remote_columns;
    let mut select_parts: Vec<String> = projected_columns.iter().map(|c| quote_ident(c)).collect();
    for (i, col) in key_columns.iter().enumerate() {
        select_parts.push(format!("{} AS `__batch_parent_{i}`", quote_ident(col)));
    }
    let qualified_keys: Vec<String> = key_columns.iter().map(|c| quote_ident(c)).collect();
    let in_clause = build_tuple_in_clause(&qualified_keys, parent_key_values.len());
    let sql = format!("SELECT {} FROM {} WHERE {in_clause}", select_parts.join(", "), quote_ident(&remote.name));
    let args = parent_key_values.iter().flatten().cloned().collect();
    SQLQuery::new(sql, args)
}

/// One-to-many batch: windows directly over the remote table, partitioned
/// by its own FK columns.
pub fn plan_one_to_many_batch(remote: &Table, r: &OneToManyRelationship, args: WindowBatchArgs) -> SQLQuery {
    plan_window_batch(&quote_ident(&remote.name), &remote.name, &r.remote_columns, args)
}

/// Edge-list batch: windows over the junction table only — there's no
/// far-endpoint join because the junction row itself carries the edge's
/// own fields, mirroring the filter compiler's EdgeList subquery shape.
pub fn plan_edge_list_batch(junction: &Table, r: &EdgeListRelationship, args: WindowBatchArgs) -> SQLQuery {
    plan_window_batch(&quote_ident(&junction.name), &junction.name, &r.remote_columns, args)
}

/// Many-to-many batch: windows over `target INNER JOIN junction`,
/// partitioned by the junction's local FK columns, joined on pair-wise
/// equality between the two tables' FK columns.
pub fn plan_many_to_many_batch(remote: &Table, r: &ManyToManyRelationship, args: WindowBatchArgs) -> SQLQuery {
    let join_conditions: Vec<String> = r
        .junction_remote_fk_columns
        .iter()
        .zip(&r.remote_columns)
        .map(|(junction_col, remote_col)| {
            format!(
                "{} = {}",
                quote_qualified(&r.junction_table, junction_col),
                quote_qualified(&remote.name, remote_col)
            )
        })
        .collect();
    let from_clause = format!(
        "{} INNER JOIN {} ON {}",
        quote_ident(&remote.name),
        quote_ident(&r.junction_table),
        join_conditions.join(" AND ")
    );
    plan_window_batch(&from_clause, &r.junction_table, &r.junction_local_fk_columns, args)
}

/// Shared window-function template:
///
/// ```sql
/// SELECT <cols>, <partition cols AS __batch_parent_N>
/// FROM (
///   SELECT <cols>, <partition cols>,
///          ROW_NUMBER() OVER (PARTITION BY <partition cols> ORDER BY <order>) AS __rn
///   FROM <from clause>
///   WHERE <parent tuple IN (…)> [AND (<user where>)]
/// ) AS __batch
/// WHERE __rn > ? AND __rn <= ?
/// ORDER BY <partition aliases>, __rn
/// ```
fn plan_window_batch(from_clause: &str, partition_table: &str, partition_columns: &[String], args: WindowBatchArgs) -> SQLQuery {
    let cols_sql = args.projected_columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");

    let partition_aliases: Vec<String> = (0..partition_columns.len()).map(|i| format!("__batch_parent_{i}")).collect();
    let partition_qualified: Vec<String> = partition_columns.iter().map(|c| quote_qualified(partition_table, c)).collect();
    let partition_select: Vec<String> = partition_qualified
        .iter()
        .zip(&partition_aliases)
        .map(|(col, alias)| format!("{col} AS `{alias}`"))
        .collect();

    let mut inner_args: Vec<SqlValue> = args.parent_key_values.iter().flatten().cloned().collect();
    let mut where_sql = build_tuple_in_clause(&partition_qualified, args.parent_key_values.len());
    if let Some(user_where) = args.user_where_sql {
        where_sql = format!("{where_sql} AND ({user_where})");
        inner_args.extend(args.user_where_args.iter().cloned());
    }

    let inner_sql = format!(
        "SELECT {cols_sql}, {}, ROW_NUMBER() OVER (PARTITION BY {} ORDER BY {}) AS `__rn` FROM {from_clause} WHERE {where_sql}",
        partition_select.join(", "),
        partition_qualified.join(", "),
        args.order_by.sql_order_by()
    );

    let alias_list = partition_aliases.iter().map(|a| format!("`{a}`")).collect::<Vec<_>>().join(", ");
    let outer_sql = format!(
        "SELECT {cols_sql}, {alias_list} FROM ({inner_sql}) AS `__batch` WHERE `__rn` > ? AND `__rn` <= ? ORDER BY {alias_list}, `__rn`"
    );

    inner_args.push(SqlValue::Int(args.offset as i64));
    inner_args.push(SqlValue::Int((args.offset + args.limit) as i64));

    SQLQuery::new(outer_sql, inner_args)
}

/// `col IN (?, …)` for a single key column, or `(c1, c2) IN ((?, ?), …)` for
/// a composite one. `columns` must already be quoted/qualified.
fn build_tuple_in_clause(columns: &[String], n_rows: usize) -> String {
    if columns.len() == 1 {
        let placeholders = vec!["?"; n_rows].join(", ");
        format!("{} IN ({placeholders})", columns[0])
    } else {
        let tuple_cols = columns.join(", ");
        let row_placeholder = format!("({})", vec!["?"; columns.len()].join(", "));
        let rows = vec![row_placeholder; n_rows].join(", ");
        format!("({tuple_cols}) IN ({rows})")
    }
}
