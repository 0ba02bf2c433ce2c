use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;

use super::{BackingStore, Filter, FilterOp, Query, Resource, ResourceSpec, Row, StoreError};

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;"
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| StoreError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Local relational store. One connection, serialized behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    /// Wrap an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl BackingStore for SqliteStore {
    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>, StoreError> {
        let spec = resource.spec();
        let columns = select_columns(spec);
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), spec.table);
        sql.push_str(&where_clause(spec, &query.filters, &mut params)?);

        match &query.order {
            Some(order) => {
                let column = spec.column(&order.column)?;
                let dir = if order.ascending { "ASC" } else { "DESC" };
                // Primary key breaks ties so equal sort keys keep insertion order.
                sql.push_str(&format!(" ORDER BY {column} {dir}, {} ASC", spec.primary_key));
            }
            None => sql.push_str(&format!(" ORDER BY {} ASC", spec.primary_key)),
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        tracing::debug!(table = spec.table, "sqlite select");
        let conn = self.lock()?;
        select_rows(&conn, &sql, &params, &columns)
    }

    fn count(&self, resource: Resource, filters: &[Filter]) -> Result<u64, StoreError> {
        let spec = resource.spec();
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            spec.table,
            where_clause(spec, filters, &mut params)?
        );

        let conn = self.lock()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn insert(&self, resource: Resource, row: Row) -> Result<Row, StoreError> {
        let spec = resource.spec();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (key, value) in &row {
            if key == spec.primary_key {
                continue;
            }
            columns.push(spec.column(key)?);
            values.push(to_sql_value(value));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", spec.table)
        } else {
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                spec.table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(values.iter()))?;
        let id = conn.last_insert_rowid();
        tracing::debug!(table = spec.table, id, "sqlite insert");

        let select = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            select_columns(spec).join(", "),
            spec.table,
            spec.primary_key
        );
        select_rows(&conn, &select, &[SqlValue::Integer(id)], &select_columns(spec))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed(format!("{} row {id} vanished after insert", spec.table)))
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<u64, StoreError> {
        let spec = resource.spec();
        let sql = format!("DELETE FROM {} WHERE {} = ?1", spec.table, spec.primary_key);
        let conn = self.lock()?;
        let affected = conn.execute(&sql, params![id])?;
        tracing::debug!(table = spec.table, id, affected, "sqlite delete");
        Ok(affected as u64)
    }
}

fn select_columns(spec: &ResourceSpec) -> Vec<&'static str> {
    std::iter::once(spec.primary_key)
        .chain(spec.columns.iter().copied())
        .collect()
}

fn where_clause(
    spec: &ResourceSpec,
    filters: &[Filter],
    params: &mut Vec<SqlValue>,
) -> Result<String, StoreError> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let mut clauses = Vec::with_capacity(filters.len());
    for filter in filters {
        let column = spec.column(&filter.column)?;
        let op = match filter.op {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
        };
        params.push(to_sql_value(&filter.value));
        clauses.push(format!("{column} {op} ?{}", params.len()));
    }
    Ok(format!(" WHERE {}", clauses.join(" AND ")))
}

fn select_rows(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
    columns: &[&'static str],
) -> Result<Vec<Row>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut out = Row::new();
        for (i, column) in columns.iter().enumerate() {
            out.insert((*column).to_string(), from_sql_ref(row.get_ref(i)?));
        }
        Ok(out)
    })?;

    rows.map(|r| r.map_err(StoreError::from)).collect()
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}
