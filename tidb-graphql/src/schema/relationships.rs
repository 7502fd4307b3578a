//! Relationship builder: infers bidirectional relationships from
//! foreign keys and classifies junction tables, in three deterministic,
//! idempotent passes. Never returns an error — unsupported composite mappings
//! are logged once per schema build and skipped.

use std::collections::HashSet;

use tracing::warn;

use crate::naming::Namer;

use super::{
    EdgeListRelationship, ForeignKeyGroup, JunctionConfig, JunctionType, ManyToManyRelationship,
    ManyToOneRelationship, OneToManyRelationship, Relationship, Schema,
};

/// Runs all three relationship-inference passes over `schema`, replacing its
/// `junctions` map and every table's `relationships`. Idempotent: calling this
/// twice in a row produces the same result.
pub fn build(mut schema: Schema, namer: &Namer) -> Schema {
    let mut warned: HashSet<String> = HashSet::new();

    schema.junctions = classify_junctions(&schema);

    for table in schema.tables.iter_mut() {
        table.relationships.clear();
    }

    build_many_to_one(&mut schema, namer);
    build_one_to_many(&mut schema, namer, &mut warned);
    build_many_to_many_and_edge_list(&mut schema, &mut warned);

    schema.names_applied = true;
    schema
}

/// Decides which tables are pure/attribute junctions: exactly two foreign key
/// groups, each sized to match its referenced table's PK, and classified
/// `Pure` when no columns exist beyond the two FKs, `Attribute` otherwise.
fn classify_junctions(schema: &Schema) -> std::collections::HashMap<String, JunctionConfig> {
    let mut junctions = std::collections::HashMap::new();
    for table in &schema.tables {
        if table.is_view {
            continue;
        }
        let groups = table.foreign_key_groups();
        if groups.len() != 2 {
            continue;
        }
        let fk_columns: HashSet<&str> = groups
            .iter()
            .flat_map(|g| g.local_columns.iter().map(|c| c.as_str()))
            .collect();
        let has_extra_columns = table.columns.iter().any(|c| !fk_columns.contains(c.name.as_str()));

        let (left, right) = if groups[0].referenced_table <= groups[1].referenced_table {
            (groups[0].clone(), groups[1].clone())
        } else {
            (groups[1].clone(), groups[0].clone())
        };

        junctions.insert(
            table.name.clone(),
            JunctionConfig {
                table: table.name.clone(),
                junction_type: if has_extra_columns {
                    JunctionType::Attribute
                } else {
                    JunctionType::Pure
                },
                left_fk: left,
                right_fk: right,
            },
        );
    }
    junctions
}

fn is_pure_junction(schema: &Schema, table: &str) -> bool {
    matches!(
        schema.junctions.get(table).map(|j| j.junction_type),
        Some(JunctionType::Pure)
    )
}

fn is_attribute_junction(schema: &Schema, table: &str) -> bool {
    matches!(
        schema.junctions.get(table).map(|j| j.junction_type),
        Some(JunctionType::Attribute)
    )
}

/// Pass 1: for each non-view, non-pure-junction table, one
/// `ManyToOne` relationship per foreign key group.
fn build_many_to_one(schema: &mut Schema, namer: &Namer) {
    let table_names: Vec<String> = schema.tables.iter().map(|t| t.name.clone()).collect();
    for name in table_names {
        let (is_view, groups, is_attr) = {
            let table = schema.table(&name).unwrap();
            (table.is_view, table.foreign_key_groups(), is_attribute_junction(schema, &name))
        };
        if is_view || is_pure_junction(schema, &name) {
            continue;
        }
        let mut new_rels = Vec::new();
        for group in &groups {
            if group.local_columns.len() != group.referenced_columns.len() {
                continue;
            }
            let field_name = if is_attr {
                namer.singular_field_name(&group.referenced_table)
            } else {
                namer.many_to_one_field_name(&group.local_columns[0])
            };
            new_rels.push(Relationship::ManyToOne(ManyToOneRelationship {
                local_columns: group.local_columns.clone(),
                remote_table: group.referenced_table.clone(),
                remote_columns: group.referenced_columns.clone(),
                graphql_field_name: field_name,
            }));
        }
        schema.table_mut(&name).unwrap().relationships.extend(new_rels);
    }
}

/// Pass 2: for each non-junction table, a `OneToMany` relationship for
/// every other non-junction table with a single-column FK referencing it.
/// Composite one-to-many is deferred; one warning per schema build.
fn build_one_to_many(schema: &mut Schema, namer: &Namer, warned: &mut HashSet<String>) {
    let mut composite_warned = false;

    // Collect (referencing_table, fk_group, referenced_table) for every FK
    // pointing at a non-junction table, from every non-junction table.
    struct Candidate {
        referencing_table: String,
        referenced_table: String,
        group: ForeignKeyGroup,
    }
    let mut candidates = Vec::new();
    for table in &schema.tables {
        if table.is_view || schema.junctions.contains_key(&table.name) {
            continue;
        }
        for group in table.foreign_key_groups() {
            if schema.junctions.contains_key(&group.referenced_table) {
                continue;
            }
            if schema.table(&group.referenced_table).is_none() {
                continue;
            }
            candidates.push(Candidate {
                referencing_table: table.name.clone(),
                referenced_table: group.referenced_table.clone(),
                group,
            });
        }
    }

    // Determine ambiguity: how many distinct FK groups exist between each
    // (referenced_table, referencing_table) pair.
    let mut pair_counts: std::collections::HashMap<(String, String), usize> = std::collections::HashMap::new();
    for c in &candidates {
        *pair_counts
            .entry((c.referenced_table.clone(), c.referencing_table.clone()))
            .or_insert(0) += 1;
    }

    for c in candidates {
        if c.group.local_columns.len() != 1 {
            let key = format!(
                "one_to_many|{}|{}|composite_one_to_many_unsupported",
                c.referencing_table, c.group.constraint_name
            );
            if warned.insert(key) && !composite_warned {
                warn!(
                    table = c.referencing_table,
                    constraint = c.group.constraint_name,
                    "composite one-to-many relationships are not synthesized"
                );
                composite_warned = true;
            }
            continue;
        }
        let ambiguous = *pair_counts
            .get(&(c.referenced_table.clone(), c.referencing_table.clone()))
            .unwrap_or(&1)
            > 1;
        let field_name = namer.one_to_many_field_name(&c.referencing_table, &c.group.local_columns[0], ambiguous);
        let pk_columns: Vec<String> = schema
            .table(&c.referenced_table)
            .unwrap()
            .primary_key_columns()
            .iter()
            .map(|col| col.name.clone())
            .collect();
        let rel = Relationship::OneToMany(OneToManyRelationship {
            local_columns: pk_columns,
            remote_table: c.referencing_table.clone(),
            remote_columns: c.group.local_columns.clone(),
            graphql_field_name: field_name,
        });
        schema.table_mut(&c.referenced_table).unwrap().relationships.push(rel);
    }
}

/// Pass 3: resolves each junction's endpoint tables and verifies FK
/// column counts equal the endpoints' PK column counts, then adds symmetric
/// `ManyToMany` fields (pure junctions) or `EdgeList` fields pointing at the
/// junction (attribute junctions).
fn build_many_to_many_and_edge_list(schema: &mut Schema, warned: &mut HashSet<String>) {
    let junctions: Vec<JunctionConfig> = {
        let mut j: Vec<_> = schema.junctions.values().cloned().collect();
        j.sort_by(|a, b| a.table.cmp(&b.table));
        j
    };

    for junction in junctions {
        let left_table = schema.table(&junction.left_fk.referenced_table);
        let right_table = schema.table(&junction.right_fk.referenced_table);
        let (Some(left_table), Some(right_table)) = (left_table, right_table) else {
            let key = format!("junction|{}|missing_endpoint_table", junction.table);
            if warned.insert(key) {
                warn!(junction = junction.table, "junction endpoint table not found, skipping");
            }
            continue;
        };
        let left_pk: Vec<String> = left_table.primary_key_columns().iter().map(|c| c.name.clone()).collect();
        let right_pk: Vec<String> = right_table.primary_key_columns().iter().map(|c| c.name.clone()).collect();

        if junction.left_fk.local_columns.len() != left_pk.len() || junction.right_fk.local_columns.len() != right_pk.len() {
            let key = format!("junction|{}|fk_pk_count_mismatch", junction.table);
            if warned.insert(key) {
                warn!(
                    junction = junction.table,
                    "junction foreign key column count does not match endpoint primary key, skipping"
                );
            }
            continue;
        }

        let left_name = junction.left_fk.referenced_table.clone();
        let right_name = junction.right_fk.referenced_table.clone();

        match junction.junction_type {
            JunctionType::Pure => {
                let left_field = derived_many_to_many_field(&right_name);
                let right_field = derived_many_to_many_field(&left_name);
                schema.table_mut(&left_name).unwrap().relationships.push(Relationship::ManyToMany(
                    ManyToManyRelationship {
                        local_columns: left_pk.clone(),
                        remote_table: right_name.clone(),
                        remote_columns: right_pk.clone(),
                        junction_table: junction.table.clone(),
                        junction_local_fk_columns: junction.left_fk.local_columns.clone(),
                        junction_remote_fk_columns: junction.right_fk.local_columns.clone(),
                        graphql_field_name: left_field,
                    },
                ));
                schema.table_mut(&right_name).unwrap().relationships.push(Relationship::ManyToMany(
                    ManyToManyRelationship {
                        local_columns: right_pk,
                        remote_table: left_name,
                        remote_columns: left_pk,
                        junction_table: junction.table.clone(),
                        junction_local_fk_columns: junction.right_fk.local_columns.clone(),
                        junction_remote_fk_columns: junction.left_fk.local_columns.clone(),
                        graphql_field_name: right_field,
                    },
                ));
            }
            JunctionType::Attribute => {
                let junction_field_name = crate::naming::to_camel_case(&crate::naming::pluralize(&junction.table));
                schema.table_mut(&left_name).unwrap().relationships.push(Relationship::EdgeList(
                    EdgeListRelationship {
                        local_columns: left_pk,
                        remote_table: junction.table.clone(),
                        remote_columns: junction.left_fk.local_columns.clone(),
                        graphql_field_name: junction_field_name.clone(),
                    },
                ));
                schema.table_mut(&right_name).unwrap().relationships.push(Relationship::EdgeList(
                    EdgeListRelationship {
                        local_columns: right_pk,
                        remote_table: junction.table.clone(),
                        remote_columns: junction.right_fk.local_columns.clone(),
                        graphql_field_name: junction_field_name,
                    },
                ));
            }
        }
    }
}

/// `ManyToMany` field names use the plural of the *other* endpoint, matching
/// how a one-to-many reverse field is named.
fn derived_many_to_many_field(table: &str) -> String {
    crate::naming::to_camel_case(&crate::naming::pluralize(table))
}
