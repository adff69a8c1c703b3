//! PostgreSQL backend.
//!
//! This module plugs PostgreSQL result rows into the typed row accessor:
//! - Decodes `DataRow` columns in text or binary format
//! - Reads `timetz` values and packed `±hh`/`±hhmm` zone offsets
//!
//! Architecture:
//! - `types`: OIDs, field descriptions and value decoding
//! - `time`: Timezone offsets and `timetz` values
//! - `client`: `SqlClient` implementation and typed decoders
//! - `error`: Backend error type
//!
//! Reading sockets and framing messages is left to the caller; rows are
//! built from column buffers that have already been received.

pub mod client;
pub mod error;
pub mod time;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{PgClient, PgRawValue, PgRowState, PgRows, SharedColumns};
pub use error::{PgError, PgResult};
pub use time::{PgTime, PgTimeZone};
pub use types::{FieldDescription, Format, Oid, PgValue};
