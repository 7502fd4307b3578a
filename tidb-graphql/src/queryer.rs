//! The `Queryer` capability the core consumes to run introspection queries.
//! The planner itself never implements this trait —
//! only the introspector calls it directly; collaborators that execute planned
//! `SQLQuery` values use the same trait to stay consistent with how
//! introspection ran its own SQL.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::value::SqlValue;

/// Per-call cancellation/deadline context, threaded through every SQL
/// execution. Cloning shares the same
/// cancellation flag; it is never an owning handle to the call itself.
#[derive(Debug, Clone)]
pub struct QueryContext {
    deadline: Option<Instant>,
    cancelled: Arc<std::sync::atomic::AtomicBool>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self {
            deadline: None,
            cancelled: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Signals cancellation; any in-flight `Queryer::query` call sharing this
    /// context should abort and discard partial results.
    pub fn cancel(&self) {
        self.cancelled.store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

/// One result row, addressable by column name or position. Column names are
/// shared across all rows of a single query result via `Arc` to avoid
/// per-row allocation.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// A streaming result set. The collaborator's driver decides how eagerly rows
/// are materialized; the core only ever consumes this as a plain iterator.
pub type RowIter = Box<dyn Iterator<Item = Row> + Send>;

/// Context-aware SQL execution, implemented by the collaborator (typically a
/// connection-pool wrapper) and consumed by the introspector and by whichever
/// collaborator executes planned `SQLQuery` values. Never implemented by the
/// core itself.
#[async_trait]
pub trait Queryer: Send + Sync {
    /// Runs `sql` with positional `args` bound to its `?` placeholders and
    /// returns the resulting rows. Must honor `ctx`'s deadline/cancellation by
    /// aborting the in-flight statement via the driver's cancellation pathway.
    async fn query(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<RowIter, tidb_graphql_error::Error>;
}
