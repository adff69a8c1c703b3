//! The capability a database client must provide to back [`SqlRow`].
//!
//! [`SqlRow`]: crate::row::SqlRow

use crate::key::{ColumnId, ColumnKey};

/// A database client that can hand out column values for its rows.
///
/// Implementors decide what a row looks like (`RowState`) and what an
/// undecoded column value looks like (`Raw`). Decoding into Rust types is
/// done by [`SqlValue`] impls for the client.
pub trait SqlClient: Sized {
    /// Per-row state produced by the client for each fetched tuple.
    type RowState: 'static;

    /// An undecoded column value borrowed from the row state.
    type Raw<'a>
    where
        Self::RowState: 'a;

    /// Connection or decoding failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the raw value of `column` in `state`, or `None` for SQL `NULL`.
    fn raw_value<'a>(
        column: &ColumnId,
        state: &'a Self::RowState,
    ) -> Result<Option<Self::Raw<'a>>, Self::Error>;

    /// Returns the decoded value for `key`, or `None` for SQL `NULL`.
    fn value<V: SqlValue<Self>>(
        key: &ColumnKey<V>,
        state: &Self::RowState,
    ) -> Result<Option<V>, Self::Error> {
        Self::raw_value(key.column(), state)?
            .map(V::decode)
            .transpose()
    }
}

/// A Rust type that can be decoded from a raw value of client `C`.
pub trait SqlValue<C: SqlClient>: Sized {
    fn decode(raw: C::Raw<'_>) -> Result<Self, C::Error>;
}
