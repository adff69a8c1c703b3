//! Result-set metadata: statements, column lookup and key minting.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::client::SqlClient;
use crate::error::{Result, SqlError};
use crate::key::{ColumnId, ColumnKey, NullableColumnKey};
use crate::row::SqlRow;

/// The statement a result set was produced by.
///
/// Statements are opaque to this crate. They are kept on rows and errors
/// purely so failures can say which query they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlStatement {
    sql: Arc<str>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<Arc<str>>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for SqlStatement {
    fn from(sql: &str) -> Self {
        SqlStatement::new(sql)
    }
}

impl From<String> for SqlStatement {
    fn from(sql: String) -> Self {
        SqlStatement::new(sql)
    }
}

/// Identity of one executed result set. Keys remember the result set that
/// minted them so misuse against another query's rows can be caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultSetId(u64);

static NEXT_RESULT_SET: AtomicU64 = AtomicU64::new(1);

impl ResultSetId {
    pub(crate) fn next() -> Self {
        ResultSetId(NEXT_RESULT_SET.fetch_add(1, Ordering::Relaxed))
    }
}

/// Column names of a result set, shared by every row it produces.
///
/// Keys are created here, by name or by position, and are only valid for
/// rows stamped with the same result set.
#[derive(Debug, Clone)]
pub struct ResultColumns {
    id: ResultSetId,
    statement: SqlStatement,
    names: Arc<[String]>,
}

impl ResultColumns {
    pub fn new(statement: SqlStatement, names: Vec<String>) -> Self {
        Self {
            id: ResultSetId::next(),
            statement,
            names: names.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> ResultSetId {
        self.id
    }

    #[inline]
    pub fn statement(&self) -> &SqlStatement {
        &self.statement
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the first column called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Key for the column called `name`, read as a non-NULL `V`.
    pub fn column_key<V>(&self, name: &str) -> Result<ColumnKey<V>> {
        let index = self
            .index_of(name)
            .ok_or_else(|| SqlError::ColumnNotFound {
                statement: self.statement.clone(),
                name: name.to_string(),
            })?;
        Ok(ColumnKey::new(self.id, ColumnId::named(index, name)))
    }

    /// Key for the column at `index`, read as a non-NULL `V`.
    pub fn column_key_at<V>(&self, index: usize) -> Result<ColumnKey<V>> {
        match self.names.get(index) {
            Some(name) => Ok(ColumnKey::new(self.id, ColumnId::named(index, name.as_str()))),
            None => Err(SqlError::ColumnIndexOutOfRange {
                statement: self.statement.clone(),
                index,
                count: self.names.len(),
            }),
        }
    }

    /// Key for the column called `name`, read as `Option<V>`.
    pub fn nullable_column_key<V>(&self, name: &str) -> Result<NullableColumnKey<V>> {
        self.column_key(name).map(NullableColumnKey::new)
    }

    /// Key for the column at `index`, read as `Option<V>`.
    pub fn nullable_column_key_at<V>(&self, index: usize) -> Result<NullableColumnKey<V>> {
        self.column_key_at(index).map(NullableColumnKey::new)
    }

    /// Wraps backend row state into a row belonging to this result set.
    pub fn row<C: SqlClient>(&self, state: C::RowState) -> SqlRow<C> {
        SqlRow::new(self.statement.clone(), self.id, state)
    }
}
