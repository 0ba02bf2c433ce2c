//! In-memory backing store.
//!
//! Substitutes for the relational store in tests and demo runs. Foreign keys
//! are not enforced, so dangling references can be exercised directly.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use super::{compare_values, BackingStore, Filter, Query, Resource, Row, StoreError};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    /// Next identifier to hand out. Only grows, so ids are never reused.
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Resource, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the demo records.
    pub fn with_seed_data() -> Result<Self, StoreError> {
        let store = Self::new();
        super::seed::seed_demo_data(&store)?;
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Resource, Table>>, StoreError> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Resource, Table>>, StoreError> {
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl BackingStore for MemoryStore {
    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>, StoreError> {
        let spec = resource.spec();
        for filter in &query.filters {
            spec.column(&filter.column)?;
        }
        let order_column = match &query.order {
            Some(order) => spec.column(&order.column)?,
            None => spec.primary_key,
        };
        let ascending = query.order.as_ref().map_or(true, |o| o.ascending);

        let tables = self.read()?;
        let mut rows: Vec<Row> = tables
            .get(&resource)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        // Stable sort: rows with equal keys keep insertion order.
        rows.sort_by(|a, b| {
            let ord = compare_column(a, b, order_column);
            if ascending { ord } else { ord.reverse() }
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn count(&self, resource: Resource, filters: &[Filter]) -> Result<u64, StoreError> {
        let spec = resource.spec();
        for filter in filters {
            spec.column(&filter.column)?;
        }
        let tables = self.read()?;
        let count = tables
            .get(&resource)
            .map(|t| t.rows.iter().filter(|row| filters.iter().all(|f| f.matches(row))).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    fn insert(&self, resource: Resource, row: Row) -> Result<Row, StoreError> {
        let spec = resource.spec();
        let mut stored = Row::new();
        for (key, value) in row {
            if key == spec.primary_key {
                continue;
            }
            let column = spec.column(&key)?;
            stored.insert(column.to_string(), value);
        }
        for column in spec.columns {
            stored.entry(column.to_string()).or_insert(Value::Null);
        }

        let mut tables = self.write()?;
        let table = tables.entry(resource).or_default();
        table.next_id = table.next_id.max(1);
        let id = table.next_id;
        table.next_id += 1;
        stored.insert(spec.primary_key.to_string(), Value::from(id));
        table.rows.push(stored.clone());
        tracing::debug!(table = spec.table, id, "memory insert");
        Ok(stored)
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<u64, StoreError> {
        let pk = resource.primary_key();
        let mut tables = self.write()?;
        let Some(table) = tables.get_mut(&resource) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|row| row.get(pk).and_then(Value::as_i64) != Some(id));
        Ok((before - table.rows.len()) as u64)
    }
}

fn compare_column(a: &Row, b: &Row, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}
