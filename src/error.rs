//! Error types shared by every backend.
//!
//! Backend-specific failures (`PgError`, `SqliteError`) never escape a row
//! read on their own: they are packaged into [`SqlError::ValueInvalid`] with
//! the statement and key that produced them, and stay reachable through
//! [`std::error::Error::source`].

use std::error::Error as StdError;

use thiserror::Error;

use crate::query::SqlStatement;

/// Boxed cause carried by [`SqlError::ValueInvalid`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Raised while reading a single column value, before context is attached.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlValueError {
    /// The column held SQL `NULL` but was read through a non-nullable key.
    #[error("value is NULL")]
    Null,
}

#[derive(Error, Debug)]
pub enum SqlError {
    /// Reading a column failed. `source` is the original error, which may be
    /// [`SqlValueError::Null`] or any backend decoding/connection error.
    #[error("invalid value for {key} in `{statement}`")]
    ValueInvalid {
        statement: SqlStatement,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("no column named `{name}` in results of `{statement}`")]
    ColumnNotFound { statement: SqlStatement, name: String },

    #[error("column index {index} out of range ({count} columns) in results of `{statement}`")]
    ColumnIndexOutOfRange {
        statement: SqlStatement,
        index: usize,
        count: usize,
    },
}

impl SqlError {
    /// Wraps `source` with the statement and key it was raised for.
    pub fn value_invalid(
        statement: &SqlStatement,
        key: impl ToString,
        source: impl Into<BoxError>,
    ) -> Self {
        SqlError::ValueInvalid {
            statement: statement.clone(),
            key: key.to_string(),
            source: source.into(),
        }
    }

    /// The statement this error was raised for.
    pub fn statement(&self) -> &SqlStatement {
        match self {
            SqlError::ValueInvalid { statement, .. }
            | SqlError::ColumnNotFound { statement, .. }
            | SqlError::ColumnIndexOutOfRange { statement, .. } => statement,
        }
    }

    /// Description of the key that failed, for `ValueInvalid` errors.
    pub fn key(&self) -> Option<&str> {
        match self {
            SqlError::ValueInvalid { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The wrapped cause, for `ValueInvalid` errors.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            SqlError::ValueInvalid { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Downcasts the wrapped cause to a concrete error type.
    pub fn cause_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause().and_then(|cause| cause.downcast_ref::<E>())
    }

    /// True when this error is a packaged [`SqlValueError::Null`].
    pub fn is_null_value(&self) -> bool {
        matches!(self.cause_as::<SqlValueError>(), Some(SqlValueError::Null))
    }

    pub(crate) fn with_key(self, new_key: impl ToString) -> Self {
        match self {
            SqlError::ValueInvalid {
                statement, source, ..
            } => SqlError::ValueInvalid {
                statement,
                key: new_key.to_string(),
                source,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SqlError>;

/// Runs `body`, packaging any error it raises with `statement` and `key`.
///
/// The original error is kept as the `source` of the returned
/// [`SqlError::ValueInvalid`].
pub fn with_errors_packaged<T, F>(
    statement: &SqlStatement,
    key: &dyn std::fmt::Display,
    body: F,
) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, BoxError>,
{
    body().map_err(|source| SqlError::value_invalid(statement, key, source))
}
