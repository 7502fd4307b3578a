//! Introspector: queries `INFORMATION_SCHEMA` and `SHOW CREATE TABLE`
//! against a caller-supplied [`Queryer`] to build a [`Schema`].

use std::collections::HashMap;
use std::sync::Arc;

use tidb_graphql_error::{codes, Error, IntrospectionError};
use tracing::warn;

use crate::naming::NamingOverrides;
use crate::queryer::{QueryContext, Queryer, Row};
use crate::quoting::quote_ident;
use crate::sql_type::{vector_dimension, ScalarCategory};
use crate::value::SqlValue;

use super::{Column, ForeignKey, Index, Schema, Table};

/// Caller-supplied column-level scalar-category overrides, keyed by
/// `(table, column)`. Always wins over the derived classification.
pub type ColumnTypeOverrides = HashMap<(String, String), ScalarCategory>;

/// Options threaded through a single introspection pass.
#[derive(Debug, Clone, Default)]
pub struct IntrospectionOptions {
    pub naming_overrides: NamingOverrides,
    pub column_type_overrides: ColumnTypeOverrides,
}

/// Builds a [`Schema`] for `database` against `queryer`. Relationships are
/// *not* inferred here — call [`super::relationships::build`] on the result
/// as a separate pass so it can be re-run without re-introspecting.
///
/// Fails the whole call if tables, columns, primary keys, foreign keys, or
/// indexes cannot be enumerated. Vector-index and `AUTO_RANDOM` enrichment
/// failures are logged and degrade gracefully instead.
pub async fn introspect(
    queryer: &dyn Queryer,
    ctx: &QueryContext,
    database: &str,
    options: &IntrospectionOptions,
) -> Result<Schema, Error> {
    let mut tables = query_tables(queryer, ctx, database).await?;

    for table in &mut tables {
        table.columns = query_columns(queryer, ctx, database, &table.name, options).await?;

        if table.is_view {
            continue;
        }

        let pk_columns = query_primary_key_columns(queryer, ctx, database, &table.name).await?;
        for col in &mut table.columns {
            col.is_primary_key = pk_columns.iter().any(|c| c == &col.name);
        }

        table.foreign_keys = query_foreign_keys(queryer, ctx, database, &table.name).await?;
        table.indexes = query_indexes(queryer, ctx, database, &table.name).await?;
    }

    enrich_vector_indexes(queryer, ctx, database, &mut tables).await;
    for table in &mut tables {
        if table.is_view {
            continue;
        }
        if !table.columns.iter().any(|c| c.is_auto_random) {
            enrich_auto_random(queryer, ctx, &mut table.columns, &table.name).await;
        }
    }

    apply_naming_overrides(&mut tables, options);

    Ok(Schema {
        tables,
        junctions: HashMap::new(),
        names_applied: false,
    })
}

fn apply_naming_overrides(tables: &mut [Table], options: &IntrospectionOptions) {
    for table in tables.iter_mut() {
        table.type_name_override = options.naming_overrides.type_names.get(&table.name).cloned();
        table.list_field_name_override = options.naming_overrides.list_field_names.get(&table.name).cloned();
        table.singular_field_name_override = options
            .naming_overrides
            .singular_field_names
            .get(&table.name)
            .cloned();
        for column in table.columns.iter_mut() {
            column.graphql_field_name_override = options
                .naming_overrides
                .column_field_names
                .get(&(table.name.clone(), column.name.clone()))
                .cloned();
        }
    }
}

async fn run(
    queryer: &dyn Queryer,
    ctx: &QueryContext,
    sql: &str,
    args: &[SqlValue],
) -> Result<Vec<Row>, Error> {
    let iter = queryer.query(ctx, sql, args).await?;
    Ok(iter.collect())
}

async fn query_tables(queryer: &dyn Queryer, ctx: &QueryContext, database: &str) -> Result<Vec<Table>, Error> {
    const SQL: &str = "SELECT `TABLE_NAME`, `TABLE_TYPE`, `TABLE_COMMENT`, `ENGINE`, `TABLE_COLLATION` \
         FROM `INFORMATION_SCHEMA`.`TABLES` WHERE `TABLE_SCHEMA` = ? ORDER BY `TABLE_NAME`";
    let rows = run(queryer, ctx, SQL, &[SqlValue::String(database.to_string())])
        .await
        .map_err(|e| wrap(e, codes::INTROSPECT_TABLES, "TABLES"))?;

    Ok(rows
        .into_iter()
        .map(|row| Table {
            name: string_col(&row, "TABLE_NAME"),
            is_view: string_col(&row, "TABLE_TYPE").eq_ignore_ascii_case("VIEW"),
            comment: string_col(&row, "TABLE_COMMENT"),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            relationships: Vec::new(),
            indexes: Vec::new(),
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: opt_string_col(&row, "ENGINE"),
            charset: opt_string_col(&row, "TABLE_COLLATION"),
        })
        .collect())
}

async fn query_columns(
    queryer: &dyn Queryer,
    ctx: &QueryContext,
    database: &str,
    table: &str,
    options: &IntrospectionOptions,
) -> Result<Vec<Column>, Error> {
    const SQL: &str = "SELECT `COLUMN_NAME`, `DATA_TYPE`, `COLUMN_TYPE`, `COLUMN_COMMENT`, `IS_NULLABLE`, \
         `COLUMN_DEFAULT`, `EXTRA`, `GENERATION_EXPRESSION`, `CHARACTER_MAXIMUM_LENGTH`, \
         `NUMERIC_PRECISION`, `NUMERIC_SCALE` \
         FROM `INFORMATION_SCHEMA`.`COLUMNS` WHERE `TABLE_SCHEMA` = ? AND `TABLE_NAME` = ? \
         ORDER BY `ORDINAL_POSITION`";
    let rows = run(
        queryer,
        ctx,
        SQL,
        &[SqlValue::String(database.to_string()), SqlValue::String(table.to_string())],
    )
    .await
    .map_err(|e| wrap(e, codes::INTROSPECT_COLUMNS, "COLUMNS").with_table(table))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let name = string_col(&row, "COLUMN_NAME");
            let data_type = string_col(&row, "DATA_TYPE");
            let column_type = string_col(&row, "COLUMN_TYPE");
            let extra = string_col(&row, "EXTRA").to_ascii_lowercase();
            let enum_values = parse_enum_or_set_values(&column_type);
            let override_type = options
                .column_type_overrides
                .get(&(table.to_string(), name.clone()))
                .copied();
            Column {
                vector_dimension: vector_dimension(&column_type).unwrap_or(0),
                is_nullable: string_col(&row, "IS_NULLABLE").eq_ignore_ascii_case("YES"),
                is_primary_key: false,
                is_generated: extra.contains("generated"),
                is_auto_increment: extra.contains("auto_increment"),
                is_auto_random: extra.contains("auto_random"),
                has_default: opt_string_col(&row, "COLUMN_DEFAULT").is_some(),
                column_default: opt_string_col(&row, "COLUMN_DEFAULT"),
                generation_expression: opt_string_col(&row, "GENERATION_EXPRESSION").filter(|s| !s.is_empty()),
                enum_values,
                comment: string_col(&row, "COLUMN_COMMENT"),
                override_type,
                graphql_field_name_override: None,
                character_maximum_length: opt_int_col(&row, "CHARACTER_MAXIMUM_LENGTH").map(|v| v as u64),
                numeric_precision: opt_int_col(&row, "NUMERIC_PRECISION").map(|v| v as u32),
                numeric_scale: opt_int_col(&row, "NUMERIC_SCALE").map(|v| v as u32),
                name,
                data_type,
                column_type,
            }
        })
        .collect())
}

/// Parses the single-quoted value list out of an `enum('a','b')` or
/// `set('a','b')` column type string. Empty for non-ENUM/SET types.
fn parse_enum_or_set_values(column_type: &str) -> Vec<String> {
    let lower = column_type.to_ascii_lowercase();
    if !(lower.starts_with("enum(") || lower.starts_with("set(")) {
        return Vec::new();
    }
    let Some(open) = column_type.find('(') else {
        return Vec::new();
    };
    let Some(close) = column_type.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    let inner = &column_type[open + 1..close];
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '\'' {
            in_quotes = true;
        } else if c == ',' {
            values.push(std::mem::take(&mut current));
        }
    }
    values.push(current);
    values
}

async fn query_primary_key_columns(
    queryer: &dyn Queryer,
    ctx: &QueryContext,
    database: &str,
    table: &str,
) -> Result<Vec<String>, Error> {
    const SQL: &str = "SELECT `COLUMN_NAME` FROM `INFORMATION_SCHEMA`.`KEY_COLUMN_USAGE` \
         WHERE `TABLE_SCHEMA` = ? AND `TABLE_NAME` = ? AND `CONSTRAINT_NAME` = 'PRIMARY' \
         ORDER BY `ORDINAL_POSITION`";
    let rows = run(
        queryer,
        ctx,
        SQL,
        &[SqlValue::String(database.to_string()), SqlValue::String(table.to_string())],
    )
    .await
    .map_err(|e| wrap(e, codes::INTROSPECT_PRIMARY_KEYS, "KEY_COLUMN_USAGE (PRIMARY)").with_table(table))?;
    Ok(rows.iter().map(|r| string_col(r, "COLUMN_NAME")).collect())
}

async fn query_foreign_keys(
    queryer: &dyn Queryer,
    ctx: &QueryContext,
    database: &str,
    table: &str,
) -> Result<Vec<ForeignKey>, Error> {
    const SQL: &str = "SELECT `COLUMN_NAME`, `REFERENCED_TABLE_NAME`, `REFERENCED_COLUMN_NAME`, \
         `CONSTRAINT_NAME`, `ORDINAL_POSITION` \
         FROM `INFORMATION_SCHEMA`.`KEY_COLUMN_USAGE` \
         WHERE `TABLE_SCHEMA` = ? AND `TABLE_NAME` = ? AND `REFERENCED_TABLE_NAME` IS NOT NULL \
         ORDER BY `CONSTRAINT_NAME`, `ORDINAL_POSITION`";
    let rows = run(
        queryer,
        ctx,
        SQL,
        &[SqlValue::String(database.to_string()), SqlValue::String(table.to_string())],
    )
    .await
    .map_err(|e| wrap(e, codes::INTROSPECT_FOREIGN_KEYS, "KEY_COLUMN_USAGE (foreign keys)").with_table(table))?;

    Ok(rows
        .iter()
        .map(|row| ForeignKey {
            column_name: string_col(row, "COLUMN_NAME"),
            referenced_table: string_col(row, "REFERENCED_TABLE_NAME"),
            referenced_column: string_col(row, "REFERENCED_COLUMN_NAME"),
            constraint_name: string_col(row, "CONSTRAINT_NAME"),
            ordinal_position: int_col(row, "ORDINAL_POSITION") as u32,
        })
        .collect())
}

async fn query_indexes(
    queryer: &dyn Queryer,
    ctx: &QueryContext,
    database: &str,
    table: &str,
) -> Result<Vec<Index>, Error> {
    const SQL: &str = "SELECT `INDEX_NAME`, `NON_UNIQUE`, `INDEX_TYPE`, `COLUMN_NAME`, `SEQ_IN_INDEX`, \
         `INDEX_COMMENT` \
         FROM `INFORMATION_SCHEMA`.`STATISTICS` WHERE `TABLE_SCHEMA` = ? AND `TABLE_NAME` = ? \
         ORDER BY `INDEX_NAME`, `SEQ_IN_INDEX`";
    let rows = run(
        queryer,
        ctx,
        SQL,
        &[SqlValue::String(database.to_string()), SqlValue::String(table.to_string())],
    )
    .await
    .map_err(|e| wrap(e, codes::INTROSPECT_INDEXES, "STATISTICS").with_table(table))?;

    let mut by_name: indexmap::IndexMap<String, Index> = indexmap::IndexMap::new();
    for row in &rows {
        let name = string_col(row, "INDEX_NAME");
        let entry = by_name.entry(name.clone()).or_insert_with(|| Index {
            name,
            unique: int_col(row, "NON_UNIQUE") == 0,
            index_type: string_col(row, "INDEX_TYPE").to_ascii_uppercase(),
            columns: Vec::new(),
            is_vector_search_capable: false,
            comment: opt_string_col(row, "INDEX_COMMENT").filter(|s| !s.is_empty()),
        });
        entry.columns.push(string_col(row, "COLUMN_NAME"));
    }
    Ok(by_name.into_values().collect())
}

/// Marks indexes found by `TIFLASH_INDEXES` (`INDEX_KIND = 'Vector'`) as
/// vector-search capable; falls back to an `INDEX_TYPE` substring check for
/// `HNSW` when that query fails.
async fn enrich_vector_indexes(queryer: &dyn Queryer, ctx: &QueryContext, database: &str, tables: &mut [Table]) {
    const SQL: &str =
        "SELECT `TABLE_NAME`, `INDEX_NAME` FROM `INFORMATION_SCHEMA`.`TIFLASH_INDEXES` \
         WHERE `TABLE_SCHEMA` = ? AND `INDEX_KIND` = 'Vector'";
    match run(queryer, ctx, SQL, &[SqlValue::String(database.to_string())]).await {
        Ok(rows) => {
            for row in &rows {
                let table_name = string_col(row, "TABLE_NAME");
                let index_name = string_col(row, "INDEX_NAME");
                if let Some(table) = tables.iter_mut().find(|t| t.name == table_name) {
                    if let Some(index) = table.indexes.iter_mut().find(|i| i.name == index_name) {
                        index.is_vector_search_capable = true;
                    }
                }
            }
        }
        Err(err) => {
            warn!(%err, "TIFLASH_INDEXES query failed, falling back to INDEX_TYPE HNSW detection");
            for table in tables.iter_mut() {
                for index in table.indexes.iter_mut() {
                    if index.index_type.contains("HNSW") {
                        index.is_vector_search_capable = true;
                    }
                }
            }
        }
    }
}

/// `SHOW CREATE TABLE` fallback for `AUTO_RANDOM` detection: scans the DDL
/// line-by-line for back-ticked column names whose line
/// contains both `/*t![auto_rand]` and `auto_random`.
async fn enrich_auto_random(queryer: &dyn Queryer, ctx: &QueryContext, columns: &mut [Column], table: &str) {
    let sql = format!("SHOW CREATE TABLE {}", quote_ident(table));
    match run(queryer, ctx, &sql, &[]).await {
        Ok(rows) => {
            let Some(ddl) = rows.first().and_then(|r| opt_string_col(r, "Create Table")) else {
                return;
            };
            for line in ddl.lines() {
                let lower = line.to_ascii_lowercase();
                if !(lower.contains("/*t![auto_rand]") && lower.contains("auto_random")) {
                    continue;
                }
                if let Some(name) = extract_backtick_column_name(line) {
                    if let Some(col) = columns.iter_mut().find(|c| c.name == name) {
                        col.is_auto_random = true;
                    }
                }
            }
        }
        Err(err) => {
            warn!(%err, table, "SHOW CREATE TABLE failed, skipping AUTO_RANDOM fallback");
        }
    }
}

fn extract_backtick_column_name(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('`') {
        return None;
    }
    let rest = &trimmed[1..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

fn wrap(error: Error, code: &'static str, step: &str) -> IntrospectionError {
    IntrospectionError::new(code, step, error.to_string())
}

fn string_col(row: &Row, name: &str) -> String {
    opt_string_col(row, name).unwrap_or_default()
}

fn opt_string_col(row: &Row, name: &str) -> Option<String> {
    match row.get(name) {
        Some(SqlValue::String(s)) => Some(s.clone()),
        Some(SqlValue::Bytes(b)) => Some(String::from_utf8_lossy(b).to_string()),
        Some(SqlValue::Int(i)) => Some(i.to_string()),
        _ => None,
    }
}

fn opt_int_col(row: &Row, name: &str) -> Option<i64> {
    match row.get(name) {
        Some(SqlValue::Int(i)) => Some(*i),
        Some(SqlValue::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn int_col(row: &Row, name: &str) -> i64 {
    opt_int_col(row, name).unwrap_or_default()
}

// Helper retained for callers that construct `Row`s directly (tests, and the
// `Arc<Vec<String>>` column-name sharing pattern `Queryer` implementors use).
#[allow(dead_code)]
fn row_with_columns(names: &[&str], values: Vec<SqlValue>) -> Row {
    Row::new(Arc::new(names.iter().map(|s| s.to_string()).collect()), values)
}
