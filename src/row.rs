//! Row access through typed column keys.

use std::fmt;

use crate::client::{SqlClient, SqlValue};
use crate::error::{with_errors_packaged, Result, SqlValueError};
use crate::key::{ColumnKey, NullableColumnKey};
use crate::query::{ResultSetId, SqlStatement};

/// One row of a query's results.
///
/// Values are decoded on demand by calling [`SqlRow::value`] with a key
/// obtained from the same result set's [`ResultColumns`].
///
/// There is no guarantee that a row's data stays readable once the backend
/// has advanced to the next row. Whether it does is up to the client.
///
/// [`ResultColumns`]: crate::query::ResultColumns
pub struct SqlRow<C: SqlClient> {
    /// The statement executed to produce this row.
    pub statement: SqlStatement,
    /// Client-specific state backing this row.
    pub state: C::RowState,
    result_set: ResultSetId,
}

impl<C: SqlClient> SqlRow<C> {
    pub fn new(statement: SqlStatement, result_set: ResultSetId, state: C::RowState) -> Self {
        Self {
            statement,
            state,
            result_set,
        }
    }

    #[inline]
    pub fn result_set(&self) -> ResultSetId {
        self.result_set
    }

    /// Returns the value in the column indicated by `key`.
    ///
    /// A [`ColumnKey<V>`] yields `V`; a [`NullableColumnKey<V>`] yields
    /// `Option<V>`.
    ///
    /// # Errors
    ///
    /// [`SqlError::ValueInvalid`] if the client fails, if the value is `NULL`
    /// and `key` is not nullable, or if the value cannot be decoded as `V`.
    /// The underlying error is available as the source.
    ///
    /// # Panics
    ///
    /// In debug builds, if `key` was minted by a different result set.
    ///
    /// [`SqlError::ValueInvalid`]: crate::error::SqlError::ValueInvalid
    pub fn value<K: ColumnRead<C>>(&self, key: &K) -> Result<K::Output> {
        key.read(self)
    }

    fn non_null_value<V: SqlValue<C>>(&self, key: &ColumnKey<V>) -> Result<V> {
        debug_assert_eq!(
            key.result_set(),
            self.result_set,
            "column key {key} used with a row of another result set"
        );
        with_errors_packaged(&self.statement, key, || {
            C::value(key, &self.state)?.ok_or_else(|| SqlValueError::Null.into())
        })
    }

    fn nullable_value<V: SqlValue<C>>(&self, key: &NullableColumnKey<V>) -> Result<Option<V>> {
        match self.non_null_value(key.non_null()) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_null_value() => {
                tracing::trace!(key = %key, "column is NULL");
                Ok(None)
            }
            Err(err) => Err(err.with_key(key)),
        }
    }
}

impl<C: SqlClient> fmt::Debug for SqlRow<C>
where
    C::RowState: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlRow")
            .field("statement", &self.statement)
            .field("result_set", &self.result_set)
            .field("state", &self.state)
            .finish()
    }
}

/// A key that knows how to read its column from a row of client `C`.
pub trait ColumnRead<C: SqlClient> {
    type Output;

    fn read(&self, row: &SqlRow<C>) -> Result<Self::Output>;
}

impl<C: SqlClient, V: SqlValue<C>> ColumnRead<C> for ColumnKey<V> {
    type Output = V;

    fn read(&self, row: &SqlRow<C>) -> Result<V> {
        row.non_null_value(self).inspect_err(|err| {
            tracing::debug!(statement = %row.statement, error = %err, "column read failed");
        })
    }
}

impl<C: SqlClient, V: SqlValue<C>> ColumnRead<C> for NullableColumnKey<V> {
    type Output = Option<V>;

    fn read(&self, row: &SqlRow<C>) -> Result<Option<V>> {
        row.nullable_value(self).inspect_err(|err| {
            tracing::debug!(statement = %row.statement, error = %err, "column read failed");
        })
    }
}
