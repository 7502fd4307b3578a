//! WHERE-tree filter compiler: turns a nested GraphQL `where` input
//! into a parameterized SQL condition plus the per-table column sets it
//! touched, for cost estimation and cache-keying.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde_json::{Map, Value};
use tidb_graphql_error::{codes, PlanError};

use crate::naming::Namer;
use crate::quoting::{quote_ident, quote_qualified};
use crate::schema::{
    Column, EdgeListRelationship, ManyToManyRelationship, OneToManyRelationship, Relationship,
    RelationshipFields, Schema, Table,
};
use crate::sql_type::ScalarCategory;
use crate::value::{self, SqlValue};

/// The result of [`compile`]: a parenthesized SQL boolean expression, its
/// positional `?` bindings, and the columns it read, grouped by table and
/// sorted for determinism.
pub struct CompiledFilter {
    pub sql: String,
    pub args: Vec<SqlValue>,
    pub used_columns_by_table: BTreeMap<String, BTreeSet<String>>,
}

/// Compiles a `where` argument for `table` (optionally aliased — the root
/// table of a query has no alias and is referred to by its own name).
pub fn compile(
    schema: &Schema,
    namer: &Namer,
    table: &Table,
    alias: Option<&str>,
    input: &Value,
) -> Result<CompiledFilter, PlanError> {
    let compiler = Compiler {
        schema,
        namer,
        alias_counter: Cell::new(0),
        used_columns: RefCell::new(BTreeMap::new()),
    };
    let alias = alias.unwrap_or(&table.name).to_string();
    let (sql, args) = compiler.compile_node(table, &alias, input, 0)?;
    Ok(CompiledFilter {
        sql,
        args,
        used_columns_by_table: compiler.used_columns.into_inner(),
    })
}

struct Compiler<'a> {
    schema: &'a Schema,
    namer: &'a Namer,
    alias_counter: Cell<u32>,
    used_columns: RefCell<BTreeMap<String, BTreeSet<String>>>,
}

impl<'a> Compiler<'a> {
    fn next_alias(&self) -> String {
        let n = self.alias_counter.get();
        self.alias_counter.set(n + 1);
        format!("__fc{n}")
    }

    fn mark_used(&self, table: &str, column: &str) {
        self.used_columns
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string());
    }

    /// `depth` is the relationship-hop count, not the AND/OR nesting depth:
    /// `depth > 0` means we're already inside a relationship subquery, so a
    /// relationship key here is a disallowed second hop.
    fn compile_node(&self, table: &Table, alias: &str, input: &Value, depth: u32) -> Result<(String, Vec<SqlValue>), PlanError> {
        let map = input.as_object().ok_or_else(|| {
            PlanError::new(codes::ARG_INVALID_FILTER_SHAPE, "a WHERE input must be an object")
        })?;

        if map.is_empty() {
            return Ok(("1=1".to_string(), vec![]));
        }

        let mut parts = Vec::new();
        let mut args = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "AND" => {
                    let (sql, sub_args) = self.compile_conjunction(table, alias, key, value, depth, " AND ", "1=1")?;
                    parts.push(sql);
                    args.extend(sub_args);
                }
                "OR" => {
                    let (sql, sub_args) = self.compile_conjunction(table, alias, key, value, depth, " OR ", "1=0")?;
                    parts.push(sql);
                    args.extend(sub_args);
                }
                _ => {
                    if let Some(column) = resolve_column(table, self.namer, key) {
                        let ops = value.as_object().ok_or_else(|| {
                            PlanError::on_field(
                                codes::ARG_INVALID_FILTER_SHAPE,
                                key,
                                format!("`{key}` expects a map of operator to value"),
                            )
                        })?;
                        let (sql, col_args) = self.compile_column_filter(alias, column, key, ops)?;
                        self.mark_used(&table.name, &column.name);
                        parts.push(sql);
                        args.extend(col_args);
                    } else if let Some(relationship) = resolve_relationship(table, key) {
                        if depth > 0 {
                            return Err(PlanError::on_field(
                                codes::ARG_NESTED_RELATIONSHIP_FILTER,
                                key,
                                format!("relationship filters allow only a single hop; `{key}` is nested"),
                            ));
                        }
                        let (sql, rel_args) = self.compile_relationship_filter(table, alias, relationship, key, value)?;
                        parts.push(sql);
                        args.extend(rel_args);
                    } else {
                        return Err(PlanError::on_field(
                            codes::ARG_UNKNOWN_COLUMN,
                            key,
                            format!("`{key}` is not a column or relationship of `{}`", table.name),
                        ));
                    }
                }
            }
        }

        Ok((parts.join(" AND "), args))
    }

    fn compile_conjunction(
        &self,
        table: &Table,
        alias: &str,
        key: &str,
        value: &Value,
        depth: u32,
        joiner: &str,
        empty: &str,
    ) -> Result<(String, Vec<SqlValue>), PlanError> {
        let items = value.as_array().ok_or_else(|| {
            PlanError::on_field(codes::ARG_INVALID_FILTER_SHAPE, key, format!("`{key}` must be a list of WHERE objects"))
        })?;
        if items.is_empty() {
            return Ok((empty.to_string(), vec![]));
        }
        let mut sub_parts = Vec::with_capacity(items.len());
        let mut args = Vec::new();
        for item in items {
            let (sub_sql, sub_args) = self.compile_node(table, alias, item, depth)?;
            sub_parts.push(format!("({sub_sql})"));
            args.extend(sub_args);
        }
        Ok((format!("({})", sub_parts.join(joiner)), args))
    }

    fn compile_column_filter(
        &self,
        alias: &str,
        column: &Column,
        field_name: &str,
        ops: &Map<String, Value>,
    ) -> Result<(String, Vec<SqlValue>), PlanError> {
        let category = column.scalar_category();
        let qualified = quote_qualified(alias, &column.name);
        let mut conditions = Vec::with_capacity(ops.len());
        let mut args = Vec::new();

        for (op, value) in ops {
            let (sql, op_args) = match category {
                ScalarCategory::Bytes => compile_bytes_op(&qualified, op, value, field_name)?,
                ScalarCategory::Uuid => compile_uuid_op(&qualified, column, op, value, field_name)?,
                ScalarCategory::Set => compile_set_op(&qualified, column, op, value, field_name)?,
                ScalarCategory::Vector => compile_vector_op(&qualified, op, value, field_name)?,
                _ => compile_generic_op(&qualified, column, category, op, value, field_name)?,
            };
            conditions.push(sql);
            args.extend(op_args);
        }

        if conditions.is_empty() {
            return Ok(("1=1".to_string(), vec![]));
        }
        Ok((format!("({})", conditions.join(" AND ")), args))
    }

    fn compile_relationship_filter(
        &self,
        table: &Table,
        alias: &str,
        relationship: &Relationship,
        field_name: &str,
        value: &Value,
    ) -> Result<(String, Vec<SqlValue>), PlanError> {
        match relationship {
            Relationship::ManyToOne(r) => {
                let ops = single_operator_map(value, field_name)?;
                let remote = self.remote_table(&r.remote_table, field_name)?;
                let remote_alias = self.next_alias();
                let join_conditions = self.join_conditions(table, alias, &remote_alias, &r.local_columns, &r.remote_columns);

                let (op, sub_value) = ops;
                match op.as_str() {
                    "is" => {
                        let (sub_sql, sub_args) = self.compile_node(remote, &remote_alias, sub_value, 1)?;
                        let sql = format!(
                            "EXISTS (SELECT 1 FROM {} AS {} WHERE {} AND ({}))",
                            quote_ident(&remote.name),
                            quote_ident(&remote_alias),
                            join_conditions,
                            sub_sql
                        );
                        Ok((sql, sub_args))
                    }
                    "isNull" => {
                        let flag = sub_value
                            .as_bool()
                            .ok_or_else(|| type_err(field_name, "Boolean"))?;
                        let keyword = if flag { "NOT EXISTS" } else { "EXISTS" };
                        let sql = format!(
                            "{keyword} (SELECT 1 FROM {} AS {} WHERE {})",
                            quote_ident(&remote.name),
                            quote_ident(&remote_alias),
                            join_conditions
                        );
                        Ok((sql, vec![]))
                    }
                    other => Err(unsupported_op(field_name, other)),
                }
            }
            _ => {
                let (op, sub_value) = single_operator_map(value, field_name)?;
                let negate = match op.as_str() {
                    "some" => false,
                    "none" => true,
                    other => return Err(unsupported_op(field_name, other)),
                };
                let (exists_body, args) = match relationship {
                    Relationship::OneToMany(r) => self.one_to_many_exists(table, alias, r, sub_value)?,
                    Relationship::ManyToMany(r) => self.many_to_many_exists(table, alias, r, sub_value)?,
                    Relationship::EdgeList(r) => self.edge_list_exists(table, alias, r, sub_value)?,
                    Relationship::ManyToOne(_) => unreachable!("handled above"),
                };
                let keyword = if negate { "NOT EXISTS" } else { "EXISTS" };
                Ok((format!("{keyword} ({exists_body})"), args))
            }
        }
    }

    fn one_to_many_exists(
        &self,
        table: &Table,
        alias: &str,
        r: &OneToManyRelationship,
        sub_value: &Value,
    ) -> Result<(String, Vec<SqlValue>), PlanError> {
        let remote = self.remote_table(&r.remote_table, &r.graphql_field_name)?;
        let remote_alias = self.next_alias();
        let join_conditions = self.join_conditions(table, alias, &remote_alias, &r.local_columns, &r.remote_columns);
        let (sub_sql, sub_args) = self.compile_node(remote, &remote_alias, sub_value, 1)?;
        Ok((
            format!(
                "SELECT 1 FROM {} AS {} WHERE {} AND ({})",
                quote_ident(&remote.name),
                quote_ident(&remote_alias),
                join_conditions,
                sub_sql
            ),
            sub_args,
        ))
    }

    fn many_to_many_exists(
        &self,
        table: &Table,
        alias: &str,
        r: &ManyToManyRelationship,
        sub_value: &Value,
    ) -> Result<(String, Vec<SqlValue>), PlanError> {
        let remote = self.remote_table(&r.remote_table, &r.graphql_field_name)?;
        let junction_alias = self.next_alias();
        let remote_alias = self.next_alias();

        let local_join = self.join_conditions(table, alias, &junction_alias, &r.local_columns, &r.junction_local_fk_columns);
        let remote_join: Vec<String> = r
            .junction_remote_fk_columns
            .iter()
            .zip(&r.remote_columns)
            .map(|(junction_col, remote_col)| {
                format!(
                    "{} = {}",
                    quote_qualified(&junction_alias, junction_col),
                    quote_qualified(&remote_alias, remote_col)
                )
            })
            .collect();

        let (sub_sql, sub_args) = self.compile_node(remote, &remote_alias, sub_value, 1)?;
        Ok((
            format!(
                "SELECT 1 FROM {} AS {} JOIN {} AS {} ON {} WHERE {} AND ({})",
                quote_ident(&r.junction_table),
                quote_ident(&junction_alias),
                quote_ident(&remote.name),
                quote_ident(&remote_alias),
                remote_join.join(" AND "),
                local_join,
                sub_sql
            ),
            sub_args,
        ))
    }

    /// EdgeList subqueries filter the junction table directly — it has no
    /// far-endpoint join because the junction row itself carries the
    /// attributes being filtered on.
    fn edge_list_exists(
        &self,
        table: &Table,
        alias: &str,
        r: &EdgeListRelationship,
        sub_value: &Value,
    ) -> Result<(String, Vec<SqlValue>), PlanError> {
        let junction = self.remote_table(&r.remote_table, &r.graphql_field_name)?;
        let junction_alias = self.next_alias();
        let join_conditions = self.join_conditions(table, alias, &junction_alias, &r.local_columns, &r.remote_columns);
        let (sub_sql, sub_args) = self.compile_node(junction, &junction_alias, sub_value, 1)?;
        Ok((
            format!(
                "SELECT 1 FROM {} AS {} WHERE {} AND ({})",
                quote_ident(&junction.name),
                quote_ident(&junction_alias),
                join_conditions,
                sub_sql
            ),
            sub_args,
        ))
    }

    fn remote_table(&self, name: &str, field_name: &str) -> Result<&'a Table, PlanError> {
        self.schema.table(name).ok_or_else(|| {
            PlanError::on_field(
                codes::ARG_UNKNOWN_RELATIONSHIP,
                field_name,
                format!("relationship `{field_name}` references unknown table `{name}`"),
            )
        })
    }

    /// Builds `remote.col = outer.col AND …`, marking each outer column used.
    /// When the outer context has no caller-supplied alias, `alias` is simply
    /// the table's own name.
    fn join_conditions(&self, table: &Table, alias: &str, remote_alias: &str, local_columns: &[String], remote_columns: &[String]) -> String {
        local_columns
            .iter()
            .zip(remote_columns)
            .map(|(local_col, remote_col)| {
                self.mark_used(&table.name, local_col);
                format!(
                    "{} = {}",
                    quote_qualified(remote_alias, remote_col),
                    quote_qualified(alias, local_col)
                )
            })
            .join(" AND ")
    }
}

fn single_operator_map<'v>(value: &'v Value, field_name: &str) -> Result<(String, &'v Value), PlanError> {
    let ops = value.as_object().ok_or_else(|| {
        PlanError::on_field(codes::ARG_INVALID_FILTER_SHAPE, field_name, format!("`{field_name}` expects an operator object"))
    })?;
    if ops.len() != 1 {
        return Err(PlanError::on_field(
            codes::ARG_UNSUPPORTED_OPERATOR,
            field_name,
            format!("`{field_name}` must specify exactly one operator"),
        ));
    }
    let (op, sub_value) = ops.iter().next().unwrap();
    Ok((op.clone(), sub_value))
}

pub(crate) fn resolve_column<'t>(table: &'t Table, namer: &Namer, field_name: &str) -> Option<&'t Column> {
    table.columns.iter().find(|c| namer.column_field_name(&table.name, &c.name) == field_name)
}

pub(crate) fn resolve_relationship<'t>(table: &'t Table, field_name: &str) -> Option<&'t Relationship> {
    table.relationships.iter().find(|r| r.graphql_field_name() == field_name)
}

fn unsupported_op(field_name: &str, op: &str) -> PlanError {
    PlanError::on_field(
        codes::ARG_UNSUPPORTED_OPERATOR,
        field_name,
        format!("operator `{op}` is not supported for `{field_name}`"),
    )
}

fn type_err(field_name: &str, expected: &str) -> PlanError {
    PlanError::on_field(
        codes::CONSISTENCY_VALUE_COERCION,
        field_name,
        format!("`{field_name}` expects a {expected} value"),
    )
}

pub(crate) fn scalar_value(category: ScalarCategory, column: &Column, value: &Value, field_name: &str) -> Result<SqlValue, PlanError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match category {
        ScalarCategory::Int => value.as_i64().map(SqlValue::Int).ok_or_else(|| type_err(field_name, "Int")),
        ScalarCategory::Float | ScalarCategory::Decimal => {
            value.as_f64().map(SqlValue::Float).ok_or_else(|| type_err(field_name, "Float"))
        }
        ScalarCategory::Boolean => value.as_bool().map(SqlValue::Bool).ok_or_else(|| type_err(field_name, "Boolean")),
        ScalarCategory::Enum => {
            let s = value.as_str().ok_or_else(|| type_err(field_name, "Enum"))?;
            Ok(SqlValue::String(value::parse_enum_literal(&column.enum_values, s)?))
        }
        ScalarCategory::String | ScalarCategory::Json => {
            value.as_str().map(|s| SqlValue::String(s.to_string())).ok_or_else(|| type_err(field_name, "String"))
        }
        ScalarCategory::DateTime | ScalarCategory::Date | ScalarCategory::Time => {
            let s = value.as_str().ok_or_else(|| type_err(field_name, "String"))?;
            let kind = match category {
                ScalarCategory::DateTime => value::TemporalKind::DateTime,
                ScalarCategory::Date => value::TemporalKind::Date,
                _ => value::TemporalKind::Time,
            };
            value::validate_temporal_literal(kind, s)?;
            Ok(SqlValue::String(s.to_string()))
        }
        ScalarCategory::Bytes | ScalarCategory::Uuid | ScalarCategory::Set | ScalarCategory::Vector => {
            unreachable!("these categories have dedicated op compilers")
        }
    }
}

fn compile_generic_op(
    qualified: &str,
    column: &Column,
    category: ScalarCategory,
    op: &str,
    value: &Value,
    field_name: &str,
) -> Result<(String, Vec<SqlValue>), PlanError> {
    match op {
        "eq" | "ne" => {
            let v = scalar_value(category, column, value, field_name)?;
            let keyword = if op == "eq" { "=" } else { "<>" };
            Ok((format!("{qualified} {keyword} ?"), vec![v]))
        }
        "lt" | "lte" | "gt" | "gte" => {
            if !category.is_comparable() {
                return Err(unsupported_op(field_name, op));
            }
            let v = scalar_value(category, column, value, field_name)?;
            let sql_op = match op {
                "lt" => "<",
                "lte" => "<=",
                "gt" => ">",
                "gte" => ">=",
                _ => unreachable!(),
            };
            Ok((format!("{qualified} {sql_op} ?"), vec![v]))
        }
        "in" | "notIn" => {
            let items = value.as_array().ok_or_else(|| type_err(field_name, "a list"))?;
            if items.is_empty() {
                return Ok(((if op == "in" { "1=0" } else { "1=1" }).to_string(), vec![]));
            }
            let mut args = Vec::with_capacity(items.len());
            for item in items {
                args.push(scalar_value(category, column, item, field_name)?);
            }
            let placeholders = vec!["?"; args.len()].join(", ");
            let keyword = if op == "in" { "IN" } else { "NOT IN" };
            Ok((format!("{qualified} {keyword} ({placeholders})"), args))
        }
        "like" | "notLike" => {
            let s = value.as_str().ok_or_else(|| type_err(field_name, "String"))?;
            let keyword = if op == "like" { "LIKE" } else { "NOT LIKE" };
            Ok((format!("{qualified} {keyword} ?"), vec![SqlValue::String(s.to_string())]))
        }
        "isNull" => compile_is_null(qualified, value, field_name),
        other => Err(unsupported_op(field_name, other)),
    }
}

fn compile_is_null(qualified: &str, value: &Value, field_name: &str) -> Result<(String, Vec<SqlValue>), PlanError> {
    let flag = value.as_bool().ok_or_else(|| type_err(field_name, "Boolean"))?;
    Ok((format!("{qualified} IS {}NULL", if flag { "" } else { "NOT " }), vec![]))
}

fn compile_bytes_op(qualified: &str, op: &str, value: &Value, field_name: &str) -> Result<(String, Vec<SqlValue>), PlanError> {
    match op {
        "eq" | "ne" => {
            let b = bytes_value(value, field_name)?;
            let keyword = if op == "eq" { "=" } else { "<>" };
            Ok((format!("{qualified} {keyword} ?"), vec![SqlValue::Bytes(b)]))
        }
        "in" | "notIn" => {
            let items = value.as_array().ok_or_else(|| type_err(field_name, "a list"))?;
            if items.is_empty() {
                return Ok(((if op == "in" { "1=0" } else { "1=1" }).to_string(), vec![]));
            }
            let mut args = Vec::with_capacity(items.len());
            for item in items {
                args.push(SqlValue::Bytes(bytes_value(item, field_name)?));
            }
            let placeholders = vec!["?"; args.len()].join(", ");
            let keyword = if op == "in" { "IN" } else { "NOT IN" };
            Ok((format!("{qualified} {keyword} ({placeholders})"), args))
        }
        "isNull" => compile_is_null(qualified, value, field_name),
        other => Err(unsupported_op(field_name, other)),
    }
}

fn bytes_value(value: &Value, field_name: &str) -> Result<Vec<u8>, PlanError> {
    let s = value.as_str().ok_or_else(|| type_err(field_name, "base64 String"))?;
    value::decode_base64(s)
}

const BINARY_DATA_TYPES: &[&str] = &["binary", "varbinary", "blob", "tinyblob", "mediumblob", "longblob"];

fn compile_uuid_op(qualified: &str, column: &Column, op: &str, value: &Value, field_name: &str) -> Result<(String, Vec<SqlValue>), PlanError> {
    let is_binary = BINARY_DATA_TYPES.contains(&column.data_type.to_ascii_lowercase().as_str());
    let encode = |text: &str| -> Result<SqlValue, PlanError> {
        if is_binary {
            Ok(SqlValue::Bytes(value::uuid_to_bytes(text)?))
        } else {
            Ok(SqlValue::String(value::canonicalize_uuid_text(text)?))
        }
    };

    match op {
        "eq" | "ne" => {
            let s = value.as_str().ok_or_else(|| type_err(field_name, "UUID String"))?;
            let v = encode(s)?;
            let keyword = if op == "eq" { "=" } else { "<>" };
            Ok((format!("{qualified} {keyword} ?"), vec![v]))
        }
        "in" | "notIn" => {
            let items = value.as_array().ok_or_else(|| type_err(field_name, "a list"))?;
            if items.is_empty() {
                return Ok(((if op == "in" { "1=0" } else { "1=1" }).to_string(), vec![]));
            }
            let mut args = Vec::with_capacity(items.len());
            for item in items {
                let s = item.as_str().ok_or_else(|| type_err(field_name, "UUID String"))?;
                args.push(encode(s)?);
            }
            let placeholders = vec!["?"; args.len()].join(", ");
            let keyword = if op == "in" { "IN" } else { "NOT IN" };
            Ok((format!("{qualified} {keyword} ({placeholders})"), args))
        }
        "isNull" => compile_is_null(qualified, value, field_name),
        other => Err(unsupported_op(field_name, other)),
    }
}

fn string_list(value: &Value, field_name: &str) -> Result<Vec<String>, PlanError> {
    let arr = value.as_array().ok_or_else(|| type_err(field_name, "a list"))?;
    arr.iter()
        .map(|v| v.as_str().map(|s| s.to_string()).ok_or_else(|| type_err(field_name, "String")))
        .collect()
}

fn validate_set_member(column: &Column, member: &str, field_name: &str) -> Result<(), PlanError> {
    if !column.enum_values.iter().any(|d| d == member) {
        return Err(PlanError::on_field(
            codes::CONSISTENCY_VALUE_COERCION,
            field_name,
            format!("`{member}` is not a declared SET value (allowed: {})", column.enum_values.join(", ")),
        ));
    }
    Ok(())
}

/// `FIND_IN_SET`-based membership operators plus exact CSV match for `SET` columns.
fn compile_set_op(qualified: &str, column: &Column, op: &str, value: &Value, field_name: &str) -> Result<(String, Vec<SqlValue>), PlanError> {
    match op {
        "has" => {
            let s = value.as_str().ok_or_else(|| type_err(field_name, "String"))?;
            validate_set_member(column, s, field_name)?;
            Ok((format!("FIND_IN_SET(?, {qualified}) > 0"), vec![SqlValue::String(s.to_string())]))
        }
        "hasAnyOf" => {
            let items = string_list(value, field_name)?;
            if items.is_empty() {
                return Ok(("1=0".to_string(), vec![]));
            }
            set_membership_expr(qualified, column, &items, field_name, " OR ", "> 0")
        }
        "hasAllOf" => {
            let items = string_list(value, field_name)?;
            if items.is_empty() {
                return Ok(("1=1".to_string(), vec![]));
            }
            set_membership_expr(qualified, column, &items, field_name, " AND ", "> 0")
        }
        "hasNoneOf" => {
            let items = string_list(value, field_name)?;
            if items.is_empty() {
                return Ok(("1=1".to_string(), vec![]));
            }
            set_membership_expr(qualified, column, &items, field_name, " AND ", "= 0")
        }
        "eq" | "ne" => {
            let items = string_list(value, field_name)?;
            let canonical = value::canonicalize_set(&column.enum_values, &items)?;
            let keyword = if op == "eq" { "=" } else { "<>" };
            Ok((format!("{qualified} {keyword} ?"), vec![SqlValue::String(canonical)]))
        }
        "isNull" => compile_is_null(qualified, value, field_name),
        other => Err(unsupported_op(field_name, other)),
    }
}

fn set_membership_expr(
    qualified: &str,
    column: &Column,
    items: &[String],
    field_name: &str,
    joiner: &str,
    comparison: &str,
) -> Result<(String, Vec<SqlValue>), PlanError> {
    let mut parts = Vec::with_capacity(items.len());
    let mut args = Vec::with_capacity(items.len());
    for s in items {
        validate_set_member(column, s, field_name)?;
        parts.push(format!("FIND_IN_SET(?, {qualified}) {comparison}"));
        args.push(SqlValue::String(s.clone()));
    }
    Ok((format!("({})", parts.join(joiner)), args))
}

/// Vectors aren't addressed by the generic/Bytes/UUID/SET operator tables;
/// only nullability is filterable here, with `k-nearest` vector search being
/// the sole comparison surface for `VECTOR` columns.
fn compile_vector_op(qualified: &str, op: &str, value: &Value, field_name: &str) -> Result<(String, Vec<SqlValue>), PlanError> {
    match op {
        "isNull" => compile_is_null(qualified, value, field_name),
        other => Err(unsupported_op(field_name, other)),
    }
}

/// Coerces a single GraphQL argument into the `SqlValue` bound for an
/// exact-match context — PK/unique-key lookups and mutation column values —
/// covering every scalar category's single-value form without the operator
/// wrapper the WHERE compiler uses.
pub(crate) fn coerce_scalar(column: &Column, value: &Value, field_name: &str) -> Result<SqlValue, PlanError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match column.scalar_category() {
        ScalarCategory::Bytes => Ok(SqlValue::Bytes(bytes_value(value, field_name)?)),
        ScalarCategory::Uuid => {
            let s = value.as_str().ok_or_else(|| type_err(field_name, "UUID String"))?;
            if BINARY_DATA_TYPES.contains(&column.data_type.to_ascii_lowercase().as_str()) {
                Ok(SqlValue::Bytes(value::uuid_to_bytes(s)?))
            } else {
                Ok(SqlValue::String(value::canonicalize_uuid_text(s)?))
            }
        }
        ScalarCategory::Set => {
            let items = string_list(value, field_name)?;
            Ok(SqlValue::String(value::canonicalize_set(&column.enum_values, &items)?))
        }
        ScalarCategory::Vector => Err(unsupported_op(field_name, "eq")),
        category => scalar_value(category, column, value, field_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingOverrides;
    use crate::schema::{ForeignKey, Index, ManyToOneRelationship};
    use serde_json::json;
    use std::collections::HashMap;

    fn column(name: &str, data_type: &str, column_type: &str, is_pk: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            column_type: column_type.to_string(),
            vector_dimension: 0,
            is_nullable: true,
            is_primary_key: is_pk,
            is_generated: false,
            is_auto_increment: false,
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

    fn set_column(name: &str, members: &[&str]) -> Column {
        let mut c = column(name, "set", "set('a','b','c')", false);
        c.enum_values = members.iter().map(|s| s.to_string()).collect();
        c
    }

    fn table(name: &str, columns: Vec<Column>) -> Table {
        Table {
            name: name.to_string(),
            is_view: false,
            comment: String::new(),
            columns,
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![],
            indexes: vec![] as Vec<Index>,
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        }
    }

    fn schema_with(tables: Vec<Table>) -> Schema {
        Schema {
            tables,
            junctions: HashMap::new(),
            names_applied: true,
        }
    }

    fn namer() -> Namer {
        Namer::new(NamingOverrides::default())
    }

    #[test]
    fn compiles_simple_eq_condition() {
        let users = table("users", vec![column("id", "int", "int", true), column("name", "varchar", "varchar(64)", false)]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "name": { "eq": "Ada" } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(compiled.sql, "(`users`.`name` = ?)");
        assert_eq!(compiled.args, vec![SqlValue::String("Ada".into())]);
        assert_eq!(compiled.used_columns_by_table["users"], BTreeSet::from(["name".to_string()]));
    }

    #[test]
    fn and_or_combine_sub_conditions() {
        let users = table("users", vec![column("id", "int", "int", true), column("age", "int", "int", false)]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({
            "OR": [
                { "age": { "lt": 18 } },
                { "age": { "gte": 65 } },
            ]
        });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(compiled.sql, "(((`users`.`age` < ?)) OR ((`users`.`age` >= ?)))");
        assert_eq!(compiled.args, vec![SqlValue::Int(18), SqlValue::Int(65)]);
    }

    #[test]
    fn empty_in_list_short_circuits_false() {
        let users = table("users", vec![column("id", "int", "int", true)]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "id": { "in": [] } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(compiled.sql, "(1=0)");
        assert!(compiled.args.is_empty());
    }

    #[test]
    fn bytes_column_rejects_like() {
        let users = table("users", vec![column("token", "varbinary", "varbinary(16)", false)]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "token": { "like": "abc" } });
        assert!(compile(&schema, &namer(), table, None, &input).is_err());
    }

    #[test]
    fn set_has_any_of_builds_find_in_set_disjunction() {
        let users = table("users", vec![set_column("tags", &["a", "b", "c"])]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "tags": { "hasAnyOf": ["b", "a"] } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(
            compiled.sql,
            "((FIND_IN_SET(?, `users`.`tags`) > 0 OR FIND_IN_SET(?, `users`.`tags`) > 0))"
        );
        assert_eq!(compiled.args, vec![SqlValue::String("b".into()), SqlValue::String("a".into())]);
    }

    #[test]
    fn set_eq_canonicalizes_to_declaration_order() {
        let users = table("users", vec![set_column("tags", &["a", "b", "c"])]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "tags": { "eq": ["c", "a"] } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(compiled.args, vec![SqlValue::String("a,c".into())]);
    }

    #[test]
    fn many_to_one_is_emits_correlated_exists() {
        let mut orders = table(
            "orders",
            vec![column("id", "int", "int", true), column("user_id", "int", "int", false)],
        );
        orders.relationships.push(Relationship::ManyToOne(ManyToOneRelationship {
            local_columns: vec!["user_id".into()],
            remote_table: "users".into(),
            remote_columns: vec!["id".into()],
            graphql_field_name: "user".into(),
        }));
        let users = table("users", vec![column("id", "int", "int", true), column("name", "varchar", "varchar(64)", false)]);
        let schema = schema_with(vec![orders, users]);
        let table = schema.table("orders").unwrap();

        let input = json!({ "user": { "is": { "name": { "eq": "Ada" } } } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(
            compiled.sql,
            "EXISTS (SELECT 1 FROM `users` AS `__fc0` WHERE `__fc0`.`id` = `orders`.`user_id` AND ((`__fc0`.`name` = ?)))"
        );
        assert_eq!(compiled.args, vec![SqlValue::String("Ada".into())]);
        assert_eq!(compiled.used_columns_by_table["orders"], BTreeSet::from(["user_id".to_string()]));
    }

    #[test]
    fn many_to_one_is_null_true_emits_not_exists_without_predicate() {
        let mut orders = table("orders", vec![column("id", "int", "int", true), column("user_id", "int", "int", false)]);
        orders.relationships.push(Relationship::ManyToOne(ManyToOneRelationship {
            local_columns: vec!["user_id".into()],
            remote_table: "users".into(),
            remote_columns: vec!["id".into()],
            graphql_field_name: "user".into(),
        }));
        let users = table("users", vec![column("id", "int", "int", true)]);
        let schema = schema_with(vec![orders, users]);
        let table = schema.table("orders").unwrap();

        let input = json!({ "user": { "isNull": true } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        assert_eq!(
            compiled.sql,
            "NOT EXISTS (SELECT 1 FROM `users` AS `__fc0` WHERE `__fc0`.`id` = `orders`.`user_id`)"
        );
        assert!(compiled.args.is_empty());
    }

    #[test]
    fn rejects_nested_relationship_filter_beyond_one_hop() {
        let mut orders = table("orders", vec![column("id", "int", "int", true), column("user_id", "int", "int", false)]);
        orders.relationships.push(Relationship::ManyToOne(ManyToOneRelationship {
            local_columns: vec!["user_id".into()],
            remote_table: "users".into(),
            remote_columns: vec!["id".into()],
            graphql_field_name: "user".into(),
        }));
        let mut users = table("users", vec![column("id", "int", "int", true), column("org_id", "int", "int", false)]);
        users.relationships.push(Relationship::ManyToOne(ManyToOneRelationship {
            local_columns: vec!["org_id".into()],
            remote_table: "orgs".into(),
            remote_columns: vec!["id".into()],
            graphql_field_name: "org".into(),
        }));
        let orgs = table("orgs", vec![column("id", "int", "int", true)]);
        let schema = schema_with(vec![orders, users, orgs]);
        let table = schema.table("orders").unwrap();

        let input = json!({ "user": { "is": { "org": { "isNull": false } } } });
        assert!(compile(&schema, &namer(), table, None, &input).is_err());
    }

    #[test]
    fn unknown_top_level_key_fails() {
        let users = table("users", vec![column("id", "int", "int", true)]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "nope": { "eq": 1 } });
        assert!(compile(&schema, &namer(), table, None, &input).is_err());
    }

    #[test]
    fn uuid_binary_column_encodes_to_bytes() {
        let users = table("users", vec![column("id", "binary", "binary(16)", true)]);
        let mut col = users.columns[0].clone();
        col.override_type = Some(ScalarCategory::Uuid);
        let users = table("users", vec![col]);
        let schema = schema_with(vec![users]);
        let table = schema.table("users").unwrap();
        let input = json!({ "id": { "eq": "550e8400-e29b-41d4-a716-446655440000" } });
        let compiled = compile(&schema, &namer(), table, None, &input).unwrap();
        match &compiled.args[0] {
            SqlValue::Bytes(b) => assert_eq!(b.len(), 16),
            other => panic!("expected bytes, got {other:?}"),
        }
    }

    #[test]
    fn datetime_filter_rejects_non_rfc3339_literal() {
        let posts = table("posts", vec![column("published_at", "datetime", "datetime", false)]);
        let schema = schema_with(vec![posts]);
        let table = schema.table("posts").unwrap();
        let ok = json!({ "publishedAt": { "eq": "2024-01-02T03:04:05Z" } });
        assert!(compile(&schema, &namer(), table, None, &ok).is_ok());
        let bad = json!({ "publishedAt": { "eq": "not-a-date" } });
        let err = compile(&schema, &namer(), table, None, &bad).unwrap_err();
        assert_eq!(err.code, codes::CONSISTENCY_VALUE_COERCION);
    }
}
