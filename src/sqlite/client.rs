//! SQLite implementation of the [`SqlClient`] capability.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use smallvec::SmallVec;

use crate::client::{SqlClient, SqlValue};
use crate::key::ColumnId;

use super::error::{SqliteError, SqliteResult};
use super::types::SqliteValue;

/// The SQLite client marker type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteClient;

/// A materialized SQLite row.
/// Uses SmallVec to inline storage for rows with ≤16 columns (most tables),
/// avoiding heap allocation for typical workloads.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteRowState {
    pub values: SmallVec<[SqliteValue; 16]>,
}

impl SqliteRowState {
    pub fn new(values: impl IntoIterator<Item = SqliteValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl SqlClient for SqliteClient {
    type RowState = SqliteRowState;
    type Raw<'a> = &'a SqliteValue;
    type Error = SqliteError;

    fn raw_value<'a>(
        column: &ColumnId,
        state: &'a SqliteRowState,
    ) -> SqliteResult<Option<&'a SqliteValue>> {
        let value = state
            .values
            .get(column.index())
            .ok_or(SqliteError::ColumnOutOfRange {
                index: column.index(),
                count: state.values.len(),
            })?;
        Ok(if value.is_null() { None } else { Some(value) })
    }
}

// ============================================================================
// Typed decoding
// ============================================================================

fn mismatch(expected: &str, value: &SqliteValue) -> SqliteError {
    SqliteError::Type(format!("Cannot read {} as {}", value.kind(), expected))
}

impl SqlValue<SqliteClient> for SqliteValue {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        Ok(raw.clone())
    }
}

impl SqlValue<SqliteClient> for i64 {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        raw.as_i64().ok_or_else(|| mismatch("i64", raw))
    }
}

impl SqlValue<SqliteClient> for i32 {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        let wide = raw.as_i64().ok_or_else(|| mismatch("i32", raw))?;
        i32::try_from(wide).map_err(|_| SqliteError::Type(format!("{} out of range for i32", wide)))
    }
}

impl SqlValue<SqliteClient> for bool {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        match raw {
            SqliteValue::Integer(0) => Ok(false),
            SqliteValue::Integer(1) => Ok(true),
            SqliteValue::Integer(other) => {
                Err(SqliteError::Type(format!("{} is not a boolean", other)))
            }
            other => Err(mismatch("bool", other)),
        }
    }
}

impl SqlValue<SqliteClient> for f64 {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        raw.as_f64().ok_or_else(|| mismatch("f64", raw))
    }
}

impl SqlValue<SqliteClient> for String {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        raw.as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("String", raw))
    }
}

impl SqlValue<SqliteClient> for Vec<u8> {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        raw.as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("Vec<u8>", raw))
    }
}

impl SqlValue<SqliteClient> for serde_json::Value {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        let text = raw.as_str().ok_or_else(|| mismatch("JSON", raw))?;
        serde_json::from_str(text).map_err(|e| SqliteError::Type(format!("Invalid JSON: {}", e)))
    }
}

/// UUIDs are stored either as text or as a 16-byte blob.
impl SqlValue<SqliteClient> for uuid::Uuid {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        match raw {
            SqliteValue::Text(s) => s
                .parse()
                .map_err(|e| SqliteError::Type(format!("Invalid UUID: {}", e))),
            SqliteValue::Blob(b) => uuid::Uuid::from_slice(b)
                .map_err(|e| SqliteError::Type(format!("Invalid UUID: {}", e))),
            other => Err(mismatch("Uuid", other)),
        }
    }
}

impl SqlValue<SqliteClient> for NaiveDate {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        let text = raw.as_str().ok_or_else(|| mismatch("NaiveDate", raw))?;
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|e| SqliteError::Type(format!("Invalid date {:?}: {}", text, e)))
    }
}

/// Timestamps are `YYYY-MM-DD HH:MM:SS[.fff]` text (with either a space or a
/// `T` separator), or integer Unix seconds.
impl SqlValue<SqliteClient> for NaiveDateTime {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        match raw {
            SqliteValue::Text(text) => ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .ok_or_else(|| SqliteError::Type(format!("Invalid timestamp: {:?}", text))),
            SqliteValue::Integer(secs) => DateTime::<Utc>::from_timestamp(*secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| SqliteError::Type(format!("Timestamp out of range: {}", secs))),
            other => Err(mismatch("NaiveDateTime", other)),
        }
    }
}

impl SqlValue<SqliteClient> for DateTime<Utc> {
    fn decode(raw: &SqliteValue) -> SqliteResult<Self> {
        <NaiveDateTime as SqlValue<SqliteClient>>::decode(raw).map(|ts| ts.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<V: SqlValue<SqliteClient>>(value: SqliteValue) -> SqliteResult<V> {
        V::decode(&value)
    }

    #[test]
    fn test_null_is_reported_before_decoding() {
        let state = SqliteRowState::new([SqliteValue::Null, SqliteValue::Integer(1)]);
        assert_eq!(SqliteClient::raw_value(&ColumnId::at(0), &state).unwrap(), None);
        assert_eq!(
            SqliteClient::raw_value(&ColumnId::at(1), &state).unwrap(),
            Some(&SqliteValue::Integer(1))
        );
    }

    #[test]
    fn test_column_out_of_range() {
        let state = SqliteRowState::new([SqliteValue::Integer(1)]);
        assert!(matches!(
            SqliteClient::raw_value(&ColumnId::at(4), &state),
            Err(SqliteError::ColumnOutOfRange { index: 4, count: 1 })
        ));
    }

    #[test]
    fn test_integers() {
        assert_eq!(decode::<i64>(SqliteValue::Integer(7)).unwrap(), 7);
        assert_eq!(decode::<i32>(SqliteValue::Integer(-7)).unwrap(), -7);
        assert!(decode::<i32>(SqliteValue::Integer(i64::MAX)).is_err());
        assert!(decode::<i64>(SqliteValue::Text("7".into())).is_err());
    }

    #[test]
    fn test_bool() {
        assert!(decode::<bool>(SqliteValue::Integer(1)).unwrap());
        assert!(!decode::<bool>(SqliteValue::Integer(0)).unwrap());
        assert!(decode::<bool>(SqliteValue::Integer(2)).is_err());
    }

    #[test]
    fn test_uuid_text_and_blob() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(
            decode::<uuid::Uuid>(SqliteValue::Text(id.to_string())).unwrap(),
            id
        );
        assert_eq!(
            decode::<uuid::Uuid>(SqliteValue::Blob(id.as_bytes().to_vec())).unwrap(),
            id
        );
        assert!(decode::<uuid::Uuid>(SqliteValue::Blob(vec![1, 2])).is_err());
    }

    #[test]
    fn test_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(
            decode::<NaiveDateTime>(SqliteValue::Text("2024-05-01 08:30:00".into())).unwrap(),
            expected
        );
        assert_eq!(
            decode::<NaiveDateTime>(SqliteValue::Text("2024-05-01T08:30:00".into())).unwrap(),
            expected
        );
        assert_eq!(
            decode::<NaiveDateTime>(SqliteValue::Integer(expected.and_utc().timestamp())).unwrap(),
            expected
        );
        assert!(decode::<NaiveDateTime>(SqliteValue::Text("yesterday".into())).is_err());
    }

    #[test]
    fn test_json() {
        let value = decode::<serde_json::Value>(SqliteValue::Text(r#"{"tags":["a"]}"#.into()))
            .unwrap();
        assert_eq!(value, serde_json::json!({"tags": ["a"]}));
        assert!(decode::<serde_json::Value>(SqliteValue::Text("{".into())).is_err());
    }
}
