//! PostgreSQL implementation of the [`SqlClient`] capability.
//!
//! Rows are the column buffers of a `DataRow` message paired with the
//! `RowDescription` fields of their result set. Columns are decoded only
//! when a key asks for them.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::client::{SqlClient, SqlValue};
use crate::key::ColumnId;
use crate::query::{ResultColumns, SqlStatement};
use crate::row::SqlRow;

use super::error::{PgError, PgResult};
use super::time::{PgTime, PgTimeZone};
use super::types::{FieldDescription, PgValue};

/// Shared column descriptions - wrapped in Arc so every row of a result set
/// points at the same `RowDescription`.
pub type SharedColumns = Arc<Vec<FieldDescription>>;

/// The PostgreSQL client marker type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgClient;

/// One `DataRow`: a buffer per column, `None` for SQL `NULL`.
#[derive(Debug, Clone)]
pub struct PgRowState {
    columns: SharedColumns,
    values: Vec<Option<Bytes>>,
}

impl PgRowState {
    pub fn new(columns: SharedColumns, values: Vec<Option<Bytes>>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[FieldDescription] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An undecoded column: its field description and bytes.
#[derive(Debug, Clone, Copy)]
pub struct PgRawValue<'a> {
    pub field: &'a FieldDescription,
    pub data: &'a [u8],
}

impl<'a> PgRawValue<'a> {
    pub fn decode(&self) -> PgResult<PgValue> {
        PgValue::decode(self.field, self.data)
    }
}

impl SqlClient for PgClient {
    type RowState = PgRowState;
    type Raw<'a> = PgRawValue<'a>;
    type Error = PgError;

    fn raw_value<'a>(column: &ColumnId, state: &'a PgRowState) -> PgResult<Option<PgRawValue<'a>>> {
        let index = column.index();
        let field = state.columns.get(index).ok_or_else(|| {
            PgError::Protocol(format!(
                "Column {} not described ({} fields)",
                column,
                state.columns.len()
            ))
        })?;
        let value = state.values.get(index).ok_or_else(|| {
            PgError::Protocol(format!(
                "DataRow has {} columns, expected at least {}",
                state.values.len(),
                index + 1
            ))
        })?;
        Ok(value.as_deref().map(|data| PgRawValue { field, data }))
    }
}

/// Turns the `DataRow`s of one result set into [`SqlRow`]s.
#[derive(Debug, Clone)]
pub struct PgRows {
    columns: ResultColumns,
    fields: SharedColumns,
}

impl PgRows {
    pub fn new(statement: SqlStatement, fields: Vec<FieldDescription>) -> Self {
        let names = fields.iter().map(|f| f.name.clone()).collect();
        Self {
            columns: ResultColumns::new(statement, names),
            fields: Arc::new(fields),
        }
    }

    /// Column metadata, used to mint keys.
    pub fn columns(&self) -> &ResultColumns {
        &self.columns
    }

    pub fn fields(&self) -> &[FieldDescription] {
        &self.fields
    }

    pub fn row(&self, values: Vec<Option<Bytes>>) -> PgResult<SqlRow<PgClient>> {
        if values.len() != self.fields.len() {
            return Err(PgError::Protocol(format!(
                "DataRow has {} columns, RowDescription has {}",
                values.len(),
                self.fields.len()
            )));
        }
        Ok(self
            .columns
            .row(PgRowState::new(Arc::clone(&self.fields), values)))
    }
}

// ============================================================================
// Typed decoding
// ============================================================================

fn mismatch(expected: &str, value: &PgValue) -> PgError {
    PgError::Type(format!("Cannot read {} as {}", value.kind(), expected))
}

impl SqlValue<PgClient> for PgValue {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        raw.decode()
    }
}

impl SqlValue<PgClient> for bool {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl SqlValue<PgClient> for i16 {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Int2(v) => Ok(v),
            other => Err(mismatch("i16", &other)),
        }
    }
}

impl SqlValue<PgClient> for i32 {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Int2(v) => Ok(i32::from(v)),
            PgValue::Int4(v) => Ok(v),
            other => Err(mismatch("i32", &other)),
        }
    }
}

impl SqlValue<PgClient> for i64 {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Int2(v) => Ok(i64::from(v)),
            PgValue::Int4(v) => Ok(i64::from(v)),
            PgValue::Int8(v) => Ok(v),
            other => Err(mismatch("i64", &other)),
        }
    }
}

impl SqlValue<PgClient> for f32 {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Float4(v) => Ok(v),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl SqlValue<PgClient> for f64 {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Float4(v) => Ok(f64::from(v)),
            PgValue::Float8(v) => Ok(v),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl SqlValue<PgClient> for String {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Text(v) => Ok(v),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl SqlValue<PgClient> for Vec<u8> {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Bytea(v) => Ok(v),
            other => Err(mismatch("Vec<u8>", &other)),
        }
    }
}

impl SqlValue<PgClient> for uuid::Uuid {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Uuid(v) => Ok(v),
            other => Err(mismatch("Uuid", &other)),
        }
    }
}

impl SqlValue<PgClient> for serde_json::Value {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Json(v) => Ok(v),
            other => Err(mismatch("JSON", &other)),
        }
    }
}

impl SqlValue<PgClient> for NaiveDate {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        let value = raw.decode()?;
        value
            .to_date()
            .ok_or_else(|| mismatch("NaiveDate", &value))
    }
}

impl SqlValue<PgClient> for NaiveDateTime {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        let value = raw.decode()?;
        value
            .to_timestamp()
            .ok_or_else(|| mismatch("NaiveDateTime", &value))
    }
}

impl SqlValue<PgClient> for DateTime<Utc> {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        <NaiveDateTime as SqlValue<PgClient>>::decode(raw).map(|ts| ts.and_utc())
    }
}

impl SqlValue<PgClient> for NaiveTime {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        let value = raw.decode()?;
        let micros = match &value {
            PgValue::Time(micros) => *micros,
            PgValue::TimeTz(t) => t.micros,
            _ => return Err(mismatch("NaiveTime", &value)),
        };
        PgTime {
            micros,
            zone: PgTimeZone::UTC,
        }
        .time()
        .ok_or_else(|| PgError::Type(format!("TIME out of range: {} us", micros)))
    }
}

impl SqlValue<PgClient> for PgTime {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::TimeTz(v) => Ok(v),
            other => Err(mismatch("PgTime", &other)),
        }
    }
}

/// Reads a zone stored as a packed `±hh`/`±hhmm` integer, or as a textual
/// offset such as `-05:30`.
impl SqlValue<PgClient> for PgTimeZone {
    fn decode(raw: PgRawValue<'_>) -> PgResult<Self> {
        match raw.decode()? {
            PgValue::Int2(code) => PgTimeZone::from_packed_offset(i32::from(code)),
            PgValue::Int4(code) => PgTimeZone::from_packed_offset(code),
            PgValue::Text(text) => text.parse(),
            PgValue::TimeTz(t) => Ok(t.zone),
            other => Err(mismatch("PgTimeZone", &other)),
        }
    }
}
