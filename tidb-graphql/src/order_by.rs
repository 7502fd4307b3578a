//! OrderBy compiler: validates multi-clause `orderBy` against the
//! index-prefix policy and appends primary-key tie-breakers so every
//! connection is deterministically, stably ordered.

use tidb_graphql_error::{codes, PlanError};

use crate::cursor::SortDirection;
use crate::naming::Namer;
use crate::schema::Table;

/// How strictly an `orderBy` must align with an existing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByPolicy {
    /// The ordered column list must equal a left-prefix of some index on the
    /// table. Default.
    IndexPrefixOnly,
    /// Only "is this column indexed at all" is enforced, in any order.
    AllowNonPrefix,
}

impl Default for OrderByPolicy {
    fn default() -> Self {
        OrderByPolicy::IndexPrefixOnly
    }
}

/// One resolved `orderBy` clause: the SQL column backing a validated GraphQL
/// field, and the requested direction.
#[derive(Debug, Clone)]
pub struct OrderByClause {
    pub column: String,
    pub graphql_field_name: String,
    pub direction: SortDirection,
}

/// The fully resolved, tie-broken `orderBy`, ready for SQL assembly and
/// cursor construction.
#[derive(Debug, Clone)]
pub struct ResolvedOrderBy {
    pub clauses: Vec<OrderByClause>,
    /// Joined GraphQL field names (including PK tie-breakers), separated by
    /// `_` — the cursor's `orderByKey`.
    pub key: String,
}

impl ResolvedOrderBy {
    pub fn columns(&self) -> Vec<String> {
        self.clauses.iter().map(|c| c.column.clone()).collect()
    }

    pub fn directions(&self) -> Vec<SortDirection> {
        self.clauses.iter().map(|c| c.direction).collect()
    }

    pub fn sql_order_by(&self) -> String {
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|c| format!("{} {}", crate::quoting::quote_ident(&c.column), c.direction.sql()))
            .collect();
        parts.join(", ")
    }
}

/// Compiles an `orderBy` argument (a list of single-field
/// `{ graphqlFieldName: "ASC" | "DESC" }` maps) into a [`ResolvedOrderBy`],
/// appending PK tie-breakers. `None` means the argument was absent and
/// defaults to `(pk columns asc…)`; `Some(&[])` is an error.
pub fn compile(
    table: &Table,
    namer: &Namer,
    input: Option<&[(String, String)]>,
    policy: OrderByPolicy,
) -> Result<ResolvedOrderBy, PlanError> {
    let mut clauses = Vec::new();

    if let Some(fields) = input {
        if fields.is_empty() {
            return Err(PlanError::new(
                codes::ARG_EMPTY_ORDER_BY,
                "orderBy must not be an empty list; omit the argument instead",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for (field_name, direction_str) in fields {
            if !seen.insert(field_name.clone()) {
                return Err(PlanError::on_field(
                    codes::ARG_DUPLICATE_ORDER_BY_FIELD,
                    field_name,
                    format!("orderBy field `{field_name}` is specified more than once"),
                ));
            }
            let direction = parse_direction(field_name, direction_str)?;
            let column = resolve_column(table, namer, field_name)?;
            clauses.push(OrderByClause {
                column: column.to_string(),
                graphql_field_name: field_name.clone(),
                direction,
            });
        }

        validate_against_indexes(table, &clauses, policy)?;
    }

    append_pk_tiebreakers(table, namer, &mut clauses);

    let key = clauses
        .iter()
        .map(|c| c.graphql_field_name.as_str())
        .collect::<Vec<_>>()
        .join("_");

    Ok(ResolvedOrderBy { clauses, key })
}

fn parse_direction(field_name: &str, direction_str: &str) -> Result<SortDirection, PlanError> {
    match direction_str {
        "ASC" => Ok(SortDirection::Asc),
        "DESC" => Ok(SortDirection::Desc),
        other => Err(PlanError::on_field(
            codes::ARG_BAD_FIRST,
            field_name,
            format!("orderBy direction must be \"ASC\" or \"DESC\", got `{other}`"),
        )),
    }
}

fn resolve_column<'a>(table: &'a Table, namer: &Namer, field_name: &str) -> Result<&'a str, PlanError> {
    table
        .columns
        .iter()
        .find(|c| namer.column_field_name(&table.name, &c.name) == field_name)
        .map(|c| c.name.as_str())
        .ok_or_else(|| {
            PlanError::on_field(
                codes::ARG_UNKNOWN_COLUMN,
                field_name,
                format!("`{field_name}` is not a column of `{}`", table.name),
            )
        })
}

fn validate_against_indexes(table: &Table, clauses: &[OrderByClause], policy: OrderByPolicy) -> Result<(), PlanError> {
    let columns: Vec<String> = clauses.iter().map(|c| c.column.clone()).collect();

    match policy {
        OrderByPolicy::AllowNonPrefix => {
            for clause in clauses {
                if !table.is_column_indexed(&clause.column) {
                    return Err(PlanError::on_field(
                        codes::ARG_NON_INDEXED_ORDER_BY,
                        &clause.graphql_field_name,
                        format!("`{}` is not indexed on `{}`", clause.graphql_field_name, table.name),
                    ));
                }
            }
            Ok(())
        }
        OrderByPolicy::IndexPrefixOnly => {
            if !table.indexes_with_prefix(&columns).is_empty() {
                return Ok(());
            }
            let allowed: Vec<String> = table
                .indexes
                .iter()
                .map(|idx| format!("({})", idx.columns.join(", ")))
                .collect();
            Err(PlanError::new(
                codes::ARG_NON_INDEXED_ORDER_BY,
                format!(
                    "orderBy ({}) is not a left-prefix of any index on `{}`; allowed prefixes: {}",
                    columns.join(", "),
                    table.name,
                    if allowed.is_empty() {
                        "none".to_string()
                    } else {
                        allowed.join(", ")
                    }
                ),
            ))
        }
    }
}

/// PK tie-breakers inherit the leading clause's direction so a
/// single-direction `orderBy` — the common case — stays uniform end to end
/// and the seek predicate can use the compact row-value tuple form. With no
/// `orderBy` at all, the tie-breakers *are* the whole ordering and default to
/// ASC.
fn append_pk_tiebreakers(table: &Table, namer: &Namer, clauses: &mut Vec<OrderByClause>) {
    let leading_direction = clauses.first().map(|c| c.direction).unwrap_or(SortDirection::Asc);
    for pk_col in table.primary_key_columns() {
        if clauses.iter().any(|c| c.column == pk_col.name) {
            continue;
        }
        clauses.push(OrderByClause {
            column: pk_col.name.clone(),
            graphql_field_name: namer.column_field_name(&table.name, &pk_col.name),
            direction: leading_direction,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingOverrides;
    use crate::schema::{Column, ForeignKey, Index, Table};

    fn column(name: &str, is_pk: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: "varchar".into(),
            column_type: "varchar(255)".into(),
            vector_dimension: 0,
            is_nullable: false,
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

    fn users_table() -> Table {
        Table {
            name: "users".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![column("id", true), column("last_name", false), column("first_name", false)],
            foreign_keys: vec![] as Vec<ForeignKey>,
            relationships: vec![],
            indexes: vec![Index {
                name: "idx_name".into(),
                unique: false,
                index_type: "BTREE".into(),
                columns: vec!["last_name".into(), "first_name".into()],
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

    #[test]
    fn defaults_to_pk_ascending_when_absent() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let resolved = compile(&table, &namer, None, OrderByPolicy::IndexPrefixOnly).unwrap();
        assert_eq!(resolved.columns(), vec!["id"]);
        assert_eq!(resolved.key, "id");
    }

    #[test]
    fn validates_index_prefix_and_appends_pk_tiebreak() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let input = vec![
            ("lastName".to_string(), "ASC".to_string()),
            ("firstName".to_string(), "DESC".to_string()),
        ];
        let resolved = compile(&table, &namer, Some(&input), OrderByPolicy::IndexPrefixOnly).unwrap();
        assert_eq!(resolved.columns(), vec!["last_name", "first_name", "id"]);
        assert_eq!(resolved.sql_order_by(), "`last_name` ASC, `first_name` DESC, `id` ASC");
        assert_eq!(resolved.key, "lastName_firstName_id");
    }

    #[test]
    fn rejects_empty_list() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let input: Vec<(String, String)> = vec![];
        assert!(compile(&table, &namer, Some(&input), OrderByPolicy::IndexPrefixOnly).is_err());
    }

    #[test]
    fn rejects_duplicate_fields() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let input = vec![
            ("lastName".to_string(), "ASC".to_string()),
            ("lastName".to_string(), "DESC".to_string()),
        ];
        assert!(compile(&table, &namer, Some(&input), OrderByPolicy::IndexPrefixOnly).is_err());
    }

    #[test]
    fn rejects_non_prefix_order_under_default_policy() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let input = vec![("firstName".to_string(), "ASC".to_string())];
        assert!(compile(&table, &namer, Some(&input), OrderByPolicy::IndexPrefixOnly).is_err());
    }

    #[test]
    fn pk_tiebreak_inherits_leading_clause_direction() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let input = vec![("lastName".to_string(), "DESC".to_string())];
        let resolved = compile(&table, &namer, Some(&input), OrderByPolicy::AllowNonPrefix).unwrap();
        assert_eq!(resolved.directions(), vec![SortDirection::Desc, SortDirection::Desc]);
        assert_eq!(resolved.sql_order_by(), "`last_name` DESC, `id` DESC");
    }

    #[test]
    fn allow_non_prefix_only_checks_individual_index_membership() {
        let table = users_table();
        let namer = Namer::new(NamingOverrides::default());
        let input = vec![("firstName".to_string(), "ASC".to_string())];
        let resolved = compile(&table, &namer, Some(&input), OrderByPolicy::AllowNonPrefix).unwrap();
        assert_eq!(resolved.columns(), vec!["first_name", "id"]);
    }
}
