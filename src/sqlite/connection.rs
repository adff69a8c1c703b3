//! SQLite connection implementation.
//!
//! Queries run synchronously on the caller's thread and their rows are
//! materialized, so every [`SqlRow`] stays readable for as long as the
//! caller keeps it.

use std::time::Duration;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::query::{ResultColumns, SqlStatement};
use crate::row::SqlRow;

use super::client::{SqliteClient, SqliteRowState};
use super::error::{SqliteError, SqliteResult};
use super::types::SqliteValue;

/// Connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database path (or `:memory:`)
    pub path: String,
    /// Use WAL journaling for file-based databases
    pub wal: bool,
    /// How long to wait on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// Prepared statements kept per connection
    pub statement_cache_capacity: usize,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            wal: true,
            busy_timeout_ms: 5000,
            statement_cache_capacity: 64,
        }
    }
}

impl SqliteConfig {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn wal(mut self, enabled: bool) -> Self {
        self.wal = enabled;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> SqliteResult<Self> {
        let config: SqliteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_memory(&self) -> bool {
        self.path == ":memory:"
    }

    pub fn validate(&self) -> SqliteResult<()> {
        if self.path.trim().is_empty() {
            return Err(SqliteError::Config("database path is empty".to_string()));
        }
        Ok(())
    }
}

/// Rows returned by [`SqliteConnection::query`].
#[derive(Debug, Clone)]
pub struct SqliteResultSet {
    columns: ResultColumns,
    rows: Vec<SqliteRowState>,
}

impl SqliteResultSet {
    /// Column metadata, used to mint keys.
    pub fn columns(&self) -> &ResultColumns {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<SqlRow<SqliteClient>> {
        self.rows
            .get(index)
            .map(|state| self.columns.row(state.clone()))
    }

    pub fn into_rows(self) -> impl Iterator<Item = SqlRow<SqliteClient>> {
        let columns = self.columns;
        self.rows.into_iter().map(move |state| columns.row(state))
    }
}

/// A SQLite connection.
pub struct SqliteConnection {
    // `None` once closed
    conn: Option<Connection>,
}

impl SqliteConnection {
    /// Open a SQLite database.
    ///
    /// Supports:
    /// - `:memory:` for in-memory database
    /// - File path for disk-based database
    ///
    /// File-based databases switch to WAL journaling when `config.wal` is set.
    pub fn open(config: &SqliteConfig) -> SqliteResult<Self> {
        config.validate()?;

        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.set_prepared_statement_cache_capacity(config.statement_cache_capacity);

        if !config.is_memory() && config.wal {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;",
            )?;
        }

        tracing::debug!(path = %config.path, wal = config.wal, "opened sqlite database");
        Ok(Self { conn: Some(conn) })
    }

    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::open(&SqliteConfig::default())
    }

    fn conn(&self) -> SqliteResult<&Connection> {
        self.conn.as_ref().ok_or(SqliteError::ConnectionClosed)
    }

    /// Execute a query and return its rows.
    /// Uses prepared statement caching for repeated queries.
    pub fn query(&self, sql: &str, params: &[SqliteValue]) -> SqliteResult<SqliteResultSet> {
        let mut stmt = self.conn()?.prepare_cached(sql)?;

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = columns.len();

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut rows_data = Vec::new();
        let mut rows = stmt.query(params_refs.as_slice())?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(SqliteValue::from_value_ref(row.get_ref(i)?)?);
            }
            rows_data.push(SqliteRowState::new(values));
        }

        tracing::debug!(sql, rows = rows_data.len(), "sqlite query");
        Ok(SqliteResultSet {
            columns: ResultColumns::new(SqlStatement::new(sql), columns),
            rows: rows_data,
        })
    }

    /// Execute a statement that doesn't return rows.
    pub fn execute(&self, sql: &str, params: &[SqliteValue]) -> SqliteResult<u64> {
        let conn = self.conn()?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let rows_affected = conn.execute(sql, params_refs.as_slice())?;
        tracing::debug!(sql, rows_affected, "sqlite execute");
        Ok(rows_affected as u64)
    }

    /// Execute multiple statements (for DDL, etc.).
    pub fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    /// Close the connection, releasing the database handle.
    ///
    /// Closing twice is a no-op. If SQLite refuses to close, the handle is
    /// kept and the connection stays usable.
    pub fn close(&mut self) -> SqliteResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().map_err(|(conn, e)| {
            self.conn = Some(conn);
            SqliteError::Sqlite(e)
        })?;
        tracing::debug!("closed sqlite database");
        Ok(())
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}
