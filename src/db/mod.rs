pub mod memory;
pub mod rest;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use schema::{Reference, Resource, ResourceSpec, RESOURCES};
pub use seed::seed_demo_data;
pub use sqlite::*;

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

/// One record as the backing store sees it: column name → JSON value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    /// Error reported by the hosted backend, message passed through verbatim.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Unknown column {column} on {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Internal lock error")]
    LockPoisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op: FilterOp::Eq, value: value.into() }
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op: FilterOp::Gte, value: value.into() }
    }

    pub fn lt(column: &str, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op: FilterOp::Lt, value: value.into() }
    }

    /// Evaluate against an in-memory row. Missing or null columns never match.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column).filter(|v| !v.is_null()) else {
            return false;
        };
        match (self.op, compare_values(actual, &self.value)) {
            (FilterOp::Eq, Some(ord)) => ord == Ordering::Equal,
            (FilterOp::Gte, Some(ord)) => ord != Ordering::Less,
            (FilterOp::Lt, Some(ord)) => ord == Ordering::Less,
            (_, None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Select parameters. Defaults to every row ordered by primary key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order { column: column.into(), ascending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Relational resource store keyed by the per-resource primary key.
///
/// Calls are blocking; the data-access layer moves them off the async
/// runtime with `spawn_blocking`.
pub trait BackingStore: Send + Sync {
    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>, StoreError>;

    fn count(&self, resource: Resource, filters: &[Filter]) -> Result<u64, StoreError>;

    /// Insert business columns and return the stored row, including the
    /// identifier the store assigned.
    fn insert(&self, resource: Resource, row: Row) -> Result<Row, StoreError>;

    /// Delete by primary key. Returns the number of rows removed.
    fn delete(&self, resource: Resource, id: i64) -> Result<u64, StoreError>;
}

/// Order two JSON scalars: numbers numerically, strings lexicographically,
/// booleans false < true. Mixed kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
