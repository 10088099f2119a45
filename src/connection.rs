//! DuckDB connection wrapper with schema setup and query execution.
//!
//! Cards live in a single `cards` table keyed by an opaque `id`, with a
//! `game` discriminator column and the full card field map stored as JSON.
//! Lowercased `set_key`/`number_key` columns back a uniqueness constraint
//! on the natural key so concurrent first-writers cannot insert duplicates.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use duckdb::{types::ValueRef, Connection as DuckDbConnection};

use crate::error::{Result, TcgSyncError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cards (
    id          VARCHAR PRIMARY KEY,
    game        VARCHAR NOT NULL,
    set_code    VARCHAR NOT NULL,
    number      VARCHAR NOT NULL,
    set_key     VARCHAR NOT NULL,
    number_key  VARCHAR NOT NULL,
    name        VARCHAR NOT NULL,
    image_url   VARCHAR,
    fields      VARCHAR NOT NULL,
    created_at  TIMESTAMP NOT NULL DEFAULT current_timestamp,
    updated_at  TIMESTAMP NOT NULL DEFAULT current_timestamp,
    UNIQUE (game, set_key, number_key)
);
";

/// Wraps a DuckDB connection holding the card store.
///
/// The raw connection is not `Sync`, so it sits behind a mutex; callers
/// hold the lock only for the duration of one statement or transaction.
pub struct Connection {
    conn: Mutex<DuckDbConnection>,
}

impl Connection {
    /// Open an in-memory database with the card schema applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(DuckDbConnection::open_in_memory()?)
    }

    /// Open (or create) a database file with the card schema applied.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(DuckDbConnection::open(path)?)
    }

    fn init(conn: DuckDbConnection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, DuckDbConnection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let column_names: Vec<String> = match rows.as_ref() {
            Some(stmt) => stmt
                .column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
            None => Vec::new(),
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;
        match rows.next()? {
            Some(row) => Ok(Some(convert_value_ref(row.get_ref(0)?))),
            None => Ok(None),
        }
    }

    /// Run `f` inside a transaction, committing only if it succeeds.
    ///
    /// Statements run through the transaction should map their errors with
    /// [`map_constraint_error`] so uniqueness violations stay recognizable.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&duckdb::Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// Turn DuckDB uniqueness violations into [`TcgSyncError::Conflict`].
pub(crate) fn map_constraint_error(e: duckdb::Error) -> TcgSyncError {
    let message = e.to_string();
    if message.contains("Constraint Error") || message.contains("Duplicate key") {
        TcgSyncError::Conflict(message)
    } else {
        TcgSyncError::DuckDb(e)
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        // Timestamps and nested types are not read back by the card store.
        _ => serde_json::Value::Null,
    }
}
