//! sqlrow - type-safe column access for SQL query results.
//!
//! A row is read through keys minted from its result set's columns. The key
//! fixes both the Rust type to decode and whether `NULL` is acceptable:
//!
//! - [`ColumnKey<V>`] reads `V` and fails on `NULL`
//! - [`NullableColumnKey<V>`] reads `Option<V>`
//!
//! Every failed read is reported as [`SqlError::ValueInvalid`], carrying the
//! statement, the key, and the original error as its source.
//!
//! Backends plug in by implementing [`SqlClient`] and [`SqlValue`]. Two are
//! included: [`pg`] for PostgreSQL `DataRow`s and [`sqlite`] over rusqlite.

pub mod client;
pub mod error;
pub mod key;
pub mod pg;
pub mod query;
pub mod row;
pub mod sqlite;

pub use client::{SqlClient, SqlValue};
pub use error::{BoxError, Result, SqlError, SqlValueError};
pub use key::{ColumnId, ColumnKey, NullableColumnKey};
pub use query::{ResultColumns, ResultSetId, SqlStatement};
pub use row::{ColumnRead, SqlRow};
