//! The introspected schema model. Built once by [`introspector`] and
//! annotated once by [`relationships`]; immutable afterwards.

pub mod introspector;
pub mod relationships;

use std::collections::HashMap;

use enum_dispatch::enum_dispatch;

use crate::sql_type::ScalarCategory;

/// A single column, as introspected from `COLUMNS` (plus `KEY_COLUMN_USAGE`/
/// `STATISTICS` flags folded in by the introspector).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Base type, e.g. `varchar`.
    pub data_type: String,
    /// Full declared type, e.g. `varchar(36)`.
    pub column_type: String,
    pub vector_dimension: u32,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_generated: bool,
    pub is_auto_increment: bool,
    pub is_auto_random: bool,
    pub has_default: bool,
    pub column_default: Option<String>,
    pub generation_expression: Option<String>,
    pub enum_values: Vec<String>,
    pub comment: String,
    /// Always wins over the `dataType`-derived classification.
    pub override_type: Option<ScalarCategory>,
    pub graphql_field_name_override: Option<String>,
    /// Supplementary descriptive fields, captured for completeness; unused by
    /// the planner.
    pub character_maximum_length: Option<u64>,
    pub numeric_precision: Option<u32>,
    pub numeric_scale: Option<u32>,
}

impl Column {
    /// The effective scalar category, honoring `override_type` first: columns
    /// with an explicit override always take precedence over the
    /// `dataType`-derived classification.
    pub fn scalar_category(&self) -> ScalarCategory {
        self.override_type
            .unwrap_or_else(|| crate::sql_type::classify(&self.data_type, &self.column_type))
    }
}

/// A single index, as introspected from `STATISTICS` (plus `TIFLASH_INDEXES`
/// enrichment for vector-search capability).
#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    /// Uppercased, e.g. `BTREE`, `HNSW`.
    pub index_type: String,
    /// Ordered by `seq_in_index`.
    pub columns: Vec<String>,
    pub is_vector_search_capable: bool,
    pub comment: Option<String>,
}

/// A single foreign-key column entry from `KEY_COLUMN_USAGE`. Multiple entries
/// sharing a `constraint_name` form one composite foreign key, ordered by
/// `ordinal_position`.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub constraint_name: String,
    pub ordinal_position: u32,
}

/// One foreign key, fully resolved into ordered column lists (the grouped form
/// of one or more [`ForeignKey`] rows sharing a constraint name).
#[derive(Debug, Clone)]
pub struct ForeignKeyGroup {
    pub constraint_name: String,
    pub local_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Tag identifying a [`Relationship`] variant without matching on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    ManyToOne,
    OneToMany,
    ManyToMany,
    EdgeList,
}

/// Fields common to every relationship variant, dispatched via `enum_dispatch`
/// rather than a shared base struct.
#[enum_dispatch]
pub trait RelationshipFields {
    fn kind(&self) -> RelationshipKind;
    fn local_columns(&self) -> &[String];
    fn remote_table(&self) -> &str;
    fn remote_columns(&self) -> &[String];
    fn graphql_field_name(&self) -> &str;
}

/// FK-backed, table-owns-the-key relationship: `T.cols -> U.pk`.
#[derive(Debug, Clone)]
pub struct ManyToOneRelationship {
    pub local_columns: Vec<String>,
    pub remote_table: String,
    pub remote_columns: Vec<String>,
    pub graphql_field_name: String,
}

impl RelationshipFields for ManyToOneRelationship {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::ManyToOne
    }
    fn local_columns(&self) -> &[String] {
        &self.local_columns
    }
    fn remote_table(&self) -> &str {
        &self.remote_table
    }
    fn remote_columns(&self) -> &[String] {
        &self.remote_columns
    }
    fn graphql_field_name(&self) -> &str {
        &self.graphql_field_name
    }
}

/// Reverse of a many-to-one: `local_columns` are this table's PK, matched
/// against `remote_columns` (the remote table's FK columns).
#[derive(Debug, Clone)]
pub struct OneToManyRelationship {
    pub local_columns: Vec<String>,
    pub remote_table: String,
    pub remote_columns: Vec<String>,
    pub graphql_field_name: String,
}

impl RelationshipFields for OneToManyRelationship {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::OneToMany
    }
    fn local_columns(&self) -> &[String] {
        &self.local_columns
    }
    fn remote_table(&self) -> &str {
        &self.remote_table
    }
    fn remote_columns(&self) -> &[String] {
        &self.remote_columns
    }
    fn graphql_field_name(&self) -> &str {
        &self.graphql_field_name
    }
}

/// Pure-junction-backed many-to-many: `local_columns` are this table's PK,
/// joined through `junction_table` via `junction_local_fk_columns` to
/// `junction_remote_fk_columns`, which reference `remote_columns` (the remote
/// table's PK). All three arrays stay position-aligned.
#[derive(Debug, Clone)]
pub struct ManyToManyRelationship {
    pub local_columns: Vec<String>,
    pub remote_table: String,
    pub remote_columns: Vec<String>,
    pub junction_table: String,
    pub junction_local_fk_columns: Vec<String>,
    pub junction_remote_fk_columns: Vec<String>,
    pub graphql_field_name: String,
}

impl RelationshipFields for ManyToManyRelationship {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::ManyToMany
    }
    fn local_columns(&self) -> &[String] {
        &self.local_columns
    }
    fn remote_table(&self) -> &str {
        &self.remote_table
    }
    fn remote_columns(&self) -> &[String] {
        &self.remote_columns
    }
    fn graphql_field_name(&self) -> &str {
        &self.graphql_field_name
    }
}

/// Attribute-junction-backed edge list: points at the junction table itself
/// (`remote_table` is the junction, `remote_columns` are the junction's FK
/// columns referencing this table's `local_columns`).
#[derive(Debug, Clone)]
pub struct EdgeListRelationship {
    pub local_columns: Vec<String>,
    pub remote_table: String,
    pub remote_columns: Vec<String>,
    pub graphql_field_name: String,
}

impl RelationshipFields for EdgeListRelationship {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::EdgeList
    }
    fn local_columns(&self) -> &[String] {
        &self.local_columns
    }
    fn remote_table(&self) -> &str {
        &self.remote_table
    }
    fn remote_columns(&self) -> &[String] {
        &self.remote_columns
    }
    fn graphql_field_name(&self) -> &str {
        &self.graphql_field_name
    }
}

#[enum_dispatch(RelationshipFields)]
#[derive(Debug, Clone)]
pub enum Relationship {
    ManyToOne(ManyToOneRelationship),
    OneToMany(OneToManyRelationship),
    ManyToMany(ManyToManyRelationship),
    EdgeList(EdgeListRelationship),
}

/// Pure junctions are hidden from the model (no FKs of their own surfaced as
/// relationships); attribute junctions remain visible as a table with their
/// own many-to-one edges back to both endpoints, plus an `EdgeList` on each
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionType {
    Pure,
    Attribute,
}

/// A classified many-to-many junction table. "left" is the endpoint whose
/// referenced table name sorts alphabetically first.
#[derive(Debug, Clone)]
pub struct JunctionConfig {
    pub table: String,
    pub junction_type: JunctionType,
    pub left_fk: ForeignKeyGroup,
    pub right_fk: ForeignKeyGroup,
}

/// A single table or view, as introspected, later annotated with inferred
/// relationships.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub is_view: bool,
    pub comment: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
    pub relationships: Vec<Relationship>,
    pub indexes: Vec<Index>,
    pub type_name_override: Option<String>,
    pub list_field_name_override: Option<String>,
    pub singular_field_name_override: Option<String>,
    /// Supplementary descriptive fields.
    pub engine: Option<String>,
    pub charset: Option<String>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key columns, in ordinal order.
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }

    /// Foreign keys grouped by constraint name, in ordinal order. Unnamed FKs
    /// (empty constraint name, which MySQL never actually produces but which
    /// keeps each row isolated if it ever did) are kept as singleton groups.
    pub fn foreign_key_groups(&self) -> Vec<ForeignKeyGroup> {
        let mut by_constraint: multimap::MultiMap<&str, &ForeignKey> = multimap::MultiMap::new();
        for fk in &self.foreign_keys {
            if fk.constraint_name.is_empty() {
                continue;
            }
            by_constraint.insert(&fk.constraint_name, fk);
        }
        let mut groups: Vec<ForeignKeyGroup> = by_constraint
            .iter_all()
            .map(|(constraint, fks)| {
                let mut ordered = fks.to_vec();
                ordered.sort_by_key(|fk| fk.ordinal_position);
                ForeignKeyGroup {
                    constraint_name: constraint.to_string(),
                    local_columns: ordered.iter().map(|fk| fk.column_name.clone()).collect(),
                    referenced_table: ordered[0].referenced_table.clone(),
                    referenced_columns: ordered.iter().map(|fk| fk.referenced_column.clone()).collect(),
                }
            })
            .collect();
        for fk in self.foreign_keys.iter().filter(|fk| fk.constraint_name.is_empty()) {
            groups.push(ForeignKeyGroup {
                constraint_name: String::new(),
                local_columns: vec![fk.column_name.clone()],
                referenced_table: fk.referenced_table.clone(),
                referenced_columns: vec![fk.referenced_column.clone()],
            });
        }
        groups.sort_by(|a, b| a.constraint_name.cmp(&b.constraint_name));
        groups
    }

    /// All indexes whose ordered column prefix matches the given columns
    /// exactly (used by the orderBy compiler's prefix check).
    pub fn indexes_with_prefix(&self, columns: &[String]) -> Vec<&Index> {
        self.indexes
            .iter()
            .filter(|idx| idx.columns.len() >= columns.len() && idx.columns[..columns.len()] == columns[..])
            .collect()
    }

    pub fn is_column_indexed(&self, column: &str) -> bool {
        self.indexes.iter().any(|idx| idx.columns.iter().any(|c| c == column))
    }
}

/// The full introspected model: every table/view plus the resolved junction
/// classification map. Immutable after [`relationships::build`] runs.
#[derive(Debug, Clone)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub junctions: HashMap<String, JunctionConfig>,
    pub names_applied: bool,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn is_junction(&self, table: &str) -> bool {
        self.junctions.contains_key(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk(constraint: &str, col: &str, ref_table: &str, ref_col: &str, ordinal: u32) -> ForeignKey {
        ForeignKey {
            column_name: col.to_string(),
            referenced_table: ref_table.to_string(),
            referenced_column: ref_col.to_string(),
            constraint_name: constraint.to_string(),
            ordinal_position: ordinal,
        }
    }

    #[test]
    fn groups_composite_foreign_keys_in_ordinal_order() {
        let table = Table {
            name: "order_items".into(),
            is_view: false,
            comment: String::new(),
            columns: vec![],
            foreign_keys: vec![
                fk("fk_order_items_order", "line_number", "orders", "line_number", 2),
                fk("fk_order_items_order", "order_id", "orders", "order_id", 1),
            ],
            relationships: vec![],
            indexes: vec![],
            type_name_override: None,
            list_field_name_override: None,
            singular_field_name_override: None,
            engine: None,
            charset: None,
        };
        let groups = table.foreign_key_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].local_columns, vec!["order_id", "line_number"]);
        assert_eq!(groups[0].referenced_columns, vec!["order_id", "line_number"]);
    }

    #[test]
    fn relationship_dispatch_reaches_through_enum() {
        let rel = Relationship::ManyToOne(ManyToOneRelationship {
            local_columns: vec!["author_id".into()],
            remote_table: "users".into(),
            remote_columns: vec!["id".into()],
            graphql_field_name: "author".into(),
        });
        assert_eq!(rel.kind(), RelationshipKind::ManyToOne);
        assert_eq!(rel.remote_table(), "users");
    }
}
