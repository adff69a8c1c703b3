//! Error types for the PostgreSQL backend.

use std::fmt;
use std::io;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur while reading PostgreSQL values.
#[derive(Debug)]
pub enum PgError {
    /// I/O error while the client was reading the row.
    Io(io::Error),

    /// Protocol error (row shorter than its description, bad format code, etc.).
    Protocol(String),

    /// Type conversion error.
    Type(String),

    /// A packed `±hh` / `±hhmm` timezone offset outside PostgreSQL's ranges.
    InvalidTimeZoneOffset(i32),
}

impl fmt::Display for PgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgError::Io(e) => write!(f, "I/O error: {}", e),
            PgError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            PgError::Type(msg) => write!(f, "Type error: {}", msg),
            PgError::InvalidTimeZoneOffset(code) => {
                write!(f, "Invalid time zone offset: {}", code)
            }
        }
    }
}

impl std::error::Error for PgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PgError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PgError {
    fn from(e: io::Error) -> Self {
        PgError::Io(e)
    }
}
