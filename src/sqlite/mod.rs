//! SQLite backend.
//!
//! This module provides a synchronous SQLite client using rusqlite whose
//! rows are read through the typed row accessor.

pub mod client;
pub mod connection;
pub mod error;
pub mod types;


pub use client::{SqliteClient, SqliteRowState};
pub use connection::{SqliteConfig, SqliteConnection, SqliteResultSet};
pub use error::{SqliteError, SqliteResult};
pub use types::SqliteValue;
