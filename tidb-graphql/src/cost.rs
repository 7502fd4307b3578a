//! Cost estimator: walks a selection subtree and computes depth, row,
//! and complexity bounds before any SQL is generated.
//!
//! GraphQL document parsing is out of scope; callers hand the
//! estimator an already-resolved [`Selection`] tree built from their own
//! execution layer.

use tidb_graphql_error::{codes, PlanError};

/// One field in a selection subtree. Relay connection scaffolding (`edges`,
/// `node`, `nodes`, `pageInfo`, `totalCount`) is marked
/// `is_connection_wrapper` so the estimator can see through it without
/// counting it as a depth level or cost contributor of its own.
#[derive(Debug, Clone)]
pub struct Selection {
    pub name: String,
    /// The `first`/list-limit argument on this field, if any. `None` means
    /// the field is not itself a list (singular object or scalar field).
    pub list_limit: Option<u32>,
    pub is_connection_wrapper: bool,
    pub children: Vec<Selection>,
}

impl Selection {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list_limit: None,
            is_connection_wrapper: false,
            children: vec![],
        }
    }

    pub fn list(name: impl Into<String>, limit: u32, children: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            list_limit: Some(limit),
            is_connection_wrapper: false,
            children,
        }
    }

    pub fn connection_wrapper(name: impl Into<String>, children: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            list_limit: None,
            is_connection_wrapper: true,
            children,
        }
    }
}

/// The caller-supplied bounds enforced before SQL generation, one set per
/// root list/connection field.
#[derive(Debug, Clone, Copy)]
pub struct CostLimits {
    pub max_depth: u32,
    pub max_complexity: u64,
    pub max_rows: u64,
    pub max_statements: u32,
    pub max_rows_per_node: u32,
}

impl Default for CostLimits {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_complexity: 10_000,
            max_rows: 100_000,
            max_statements: 50,
            max_rows_per_node: 500,
        }
    }
}

/// The computed cost of a selection subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEstimate {
    pub depth: u32,
    pub rows: u64,
    pub complexity: u64,
}

/// The cost-accounting inputs a planner-level builder enforces before it
/// assembles any SQL: the resolved selection subtree under the field being
/// planned, the caller's limits, and how many SQL statements the plan under
/// construction requires in total (root + count + aggregate-base, or one per
/// relationship batch).
pub struct CostCheck<'a> {
    pub selection: &'a [Selection],
    pub limits: &'a CostLimits,
    pub statement_count: u32,
}

impl<'a> CostCheck<'a> {
    /// An enforcement context with no selection fields and the default
    /// limits — passes trivially. Planner call sites that don't (yet) wire a
    /// real selection tree through use this rather than skip enforcement
    /// outright.
    pub fn trivial() -> Self {
        static EMPTY: [Selection; 0] = [];
        static LIMITS: CostLimits = CostLimits {
            max_depth: 10,
            max_complexity: 10_000,
            max_rows: 100_000,
            max_statements: 50,
            max_rows_per_node: 500,
        };
        Self { selection: &EMPTY, limits: &LIMITS, statement_count: 1 }
    }

    pub fn enforce(&self) -> Result<CostEstimate, PlanError> {
        estimate_and_enforce(self.selection, self.limits, self.statement_count)
    }
}

/// Computes `(depth, rows, complexity)` for a set of sibling root fields,
/// then enforces `limits` against both the aggregate estimate and the
/// per-node `first` cap. Fails on the first violation encountered; `depth`
/// is checked first since it's cheapest to report meaningfully.
pub fn estimate_and_enforce(roots: &[Selection], limits: &CostLimits, statement_count: u32) -> Result<CostEstimate, PlanError> {
    for root in roots {
        check_rows_per_node(root, limits)?;
    }

    let estimate = estimate(roots);

    if estimate.depth > limits.max_depth {
        return Err(PlanError::new(
            codes::COST_MAX_DEPTH,
            format!("selection depth {} exceeds maxDepth {}", estimate.depth, limits.max_depth),
        ));
    }
    if estimate.complexity > limits.max_complexity {
        return Err(PlanError::new(
            codes::COST_MAX_COMPLEXITY,
            format!("estimated complexity {} exceeds maxComplexity {}", estimate.complexity, limits.max_complexity),
        ));
    }
    if estimate.rows > limits.max_rows {
        return Err(PlanError::new(
            codes::COST_MAX_ROWS,
            format!("estimated row count {} exceeds maxRows {}", estimate.rows, limits.max_rows),
        ));
    }
    if statement_count > limits.max_statements {
        return Err(PlanError::new(
            codes::COST_MAX_STATEMENTS,
            format!("plan requires {statement_count} SQL statements, exceeding maxStatements {}", limits.max_statements),
        ));
    }

    Ok(estimate)
}

/// Computes the raw `(depth, rows, complexity)` triple without enforcing
/// limits, for callers that only need the number (e.g. tests asserting
/// monotonicity).
pub fn estimate(roots: &[Selection]) -> CostEstimate {
    let mut depth = 0;
    let mut rows: u64 = 0;
    let mut complexity: u64 = 1;

    for root in roots {
        let limit = root.list_limit.unwrap_or(1) as u64;
        let (d, r, c) = walk(root);
        depth = depth.max(d);
        rows = rows.saturating_add(limit.saturating_mul(r));
        complexity = complexity.saturating_add(limit.saturating_mul(c));
    }

    CostEstimate { depth, rows, complexity }
}

fn walk(node: &Selection) -> (u32, u64, u64) {
    let children = effective_children(node);
    if children.is_empty() {
        return (1, 1, 1);
    }

    let mut max_child_depth = 0;
    let mut rows_sum: u64 = 0;
    let mut complexity_sum: u64 = 0;

    for child in children {
        let limit = child.list_limit.unwrap_or(1) as u64;
        let (child_depth, child_rows, child_complexity) = walk(child);
        max_child_depth = max_child_depth.max(child_depth);
        rows_sum = rows_sum.saturating_add(limit.saturating_mul(child_rows));
        complexity_sum = complexity_sum.saturating_add(limit.saturating_mul(child_complexity));
    }

    (1 + max_child_depth, rows_sum, 1 + complexity_sum)
}

/// Flattens `is_connection_wrapper` layers so `posts { edges { node { title } } }`
/// sees `title` as a direct child of `posts` for depth purposes.
fn effective_children(node: &Selection) -> Vec<&Selection> {
    let mut out = Vec::new();
    for child in &node.children {
        if child.is_connection_wrapper {
            out.extend(effective_children(child));
        } else {
            out.push(child);
        }
    }
    out
}

fn check_rows_per_node(node: &Selection, limits: &CostLimits) -> Result<(), PlanError> {
    if let Some(limit) = node.list_limit {
        if limit > limits.max_rows_per_node {
            return Err(PlanError::on_field(
                codes::COST_MAX_ROWS_PER_NODE,
                &node.name,
                format!("`{}` requests {limit} rows, exceeding maxRowsPerNode {}", node.name, limits.max_rows_per_node),
            ));
        }
    }
    for child in &node.children {
        check_rows_per_node(child, limits)?;
    }
    Ok(())
}
