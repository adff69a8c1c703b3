//! PostgreSQL column decoding.
//!
//! This module decodes `DataRow` column bytes, in either text or binary
//! format, into [`PgValue`]s.
//! Reference: https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-FORMAT-CODES

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use super::error::{PgError, PgResult};
use super::time::PgTime;

// ============================================================================
// Type OIDs
// ============================================================================

/// PostgreSQL type object identifiers (OIDs).
///
/// These are the built-in type OIDs from PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Oid(pub i32);

impl Oid {
    // Boolean types
    pub const BOOL: Oid = Oid(16);

    // Binary data
    pub const BYTEA: Oid = Oid(17);

    // Character types
    pub const CHAR: Oid = Oid(18);
    pub const NAME: Oid = Oid(19);

    // Integer types
    pub const INT8: Oid = Oid(20);
    pub const INT2: Oid = Oid(21);
    pub const INT4: Oid = Oid(23);

    // Text types
    pub const TEXT: Oid = Oid(25);

    // Floating point types
    pub const FLOAT4: Oid = Oid(700);
    pub const FLOAT8: Oid = Oid(701);

    // String types
    pub const VARCHAR: Oid = Oid(1043);
    pub const BPCHAR: Oid = Oid(1042);

    // Date/time types
    pub const DATE: Oid = Oid(1082);
    pub const TIME: Oid = Oid(1083);
    pub const TIMESTAMP: Oid = Oid(1114);
    pub const TIMESTAMPTZ: Oid = Oid(1184);
    pub const TIMETZ: Oid = Oid(1266);

    // UUID
    pub const UUID: Oid = Oid(2950);

    // JSON types
    pub const JSON: Oid = Oid(114);
    pub const JSONB: Oid = Oid(3802);

    /// Check if this is a text-like type
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            Oid::TEXT | Oid::VARCHAR | Oid::BPCHAR | Oid::CHAR | Oid::NAME
        )
    }

}

/// Wire format of a column, from the `RowDescription` format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text = 0,
    Binary = 1,
}

/// Column metadata from a `RowDescription` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub name: String,
    pub type_oid: Oid,
    pub format: Format,
}

impl FieldDescription {
    pub fn new(name: impl Into<String>, type_oid: Oid, format: Format) -> Self {
        Self {
            name: name.into(),
            type_oid,
            format,
        }
    }
}

// ============================================================================
// PostgreSQL Values
// ============================================================================

/// PostgreSQL's 2000-01-01 epoch, as days from 0001-01-01.
const PG_EPOCH_DAYS_FROM_CE: i32 = 730_120;
/// PostgreSQL's epoch, as microseconds from the Unix epoch.
const PG_EPOCH_MICROS: i64 = 946_684_800 * 1_000_000;

/// A decoded PostgreSQL value.
///
/// `NULL` is not represented here: the row reports it before decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytea(Vec<u8>),
    Uuid(uuid::Uuid),
    // Timestamps stored as microseconds since 2000-01-01
    Timestamp(i64),
    // Days since 2000-01-01
    Date(i32),
    // Microseconds since midnight
    Time(i64),
    TimeTz(PgTime),
    Json(serde_json::Value),
    // For types we don't handle specially - store raw bytes
    Raw { oid: Oid, data: Vec<u8> },
}

fn fixed<const N: usize>(data: &[u8], type_name: &str) -> PgResult<[u8; N]> {
    data.try_into().map_err(|_| {
        PgError::Type(format!("Invalid {} length: {}", type_name, data.len()))
    })
}

fn utf8<'a>(data: &'a [u8], type_name: &str) -> PgResult<&'a str> {
    std::str::from_utf8(data)
        .map_err(|e| PgError::Type(format!("Invalid UTF-8 in {}: {}", type_name, e)))
}

fn json(text: &str) -> PgResult<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| PgError::Type(format!("Invalid JSON: {}", e)))
}

impl PgValue {
    /// Decode a column according to its field description.
    pub fn decode(field: &FieldDescription, data: &[u8]) -> PgResult<Self> {
        match field.format {
            Format::Binary => Self::decode_binary(field.type_oid, data),
            Format::Text => Self::decode_text(field.type_oid, data),
        }
    }

    /// Decode a value from binary format.
    pub fn decode_binary(oid: Oid, data: &[u8]) -> PgResult<Self> {
        match oid {
            Oid::BOOL => {
                let [byte] = fixed::<1>(data, "BOOL")?;
                Ok(PgValue::Bool(byte != 0))
            }

            Oid::INT2 => Ok(PgValue::Int2(i16::from_be_bytes(fixed(data, "INT2")?))),
            Oid::INT4 => Ok(PgValue::Int4(i32::from_be_bytes(fixed(data, "INT4")?))),
            Oid::INT8 => Ok(PgValue::Int8(i64::from_be_bytes(fixed(data, "INT8")?))),
            Oid::FLOAT4 => Ok(PgValue::Float4(f32::from_be_bytes(fixed(data, "FLOAT4")?))),
            Oid::FLOAT8 => Ok(PgValue::Float8(f64::from_be_bytes(fixed(data, "FLOAT8")?))),

            _ if oid.is_text_like() => Ok(PgValue::Text(utf8(data, "TEXT")?.to_string())),

            Oid::BYTEA => Ok(PgValue::Bytea(data.to_vec())),

            Oid::UUID => Ok(PgValue::Uuid(uuid::Uuid::from_bytes(fixed(data, "UUID")?))),

            Oid::TIMESTAMP | Oid::TIMESTAMPTZ => Ok(PgValue::Timestamp(i64::from_be_bytes(
                fixed(data, "TIMESTAMP")?,
            ))),

            Oid::DATE => Ok(PgValue::Date(i32::from_be_bytes(fixed(data, "DATE")?))),

            Oid::TIME => Ok(PgValue::Time(i64::from_be_bytes(fixed(data, "TIME")?))),

            Oid::TIMETZ => Ok(PgValue::TimeTz(PgTime::decode_binary(data)?)),

            Oid::JSON | Oid::JSONB => {
                // JSONB has a version byte prefix
                let json_data = if oid == Oid::JSONB && !data.is_empty() {
                    &data[1..]
                } else {
                    data
                };
                Ok(PgValue::Json(json(utf8(json_data, "JSON")?)?))
            }

            // For unknown types, store raw bytes
            _ => Ok(PgValue::Raw {
                oid,
                data: data.to_vec(),
            }),
        }
    }

    /// Decode from text format (simple query protocol)
    pub fn decode_text(oid: Oid, data: &[u8]) -> PgResult<Self> {
        let text = utf8(data, "text value")?;

        match oid {
            Oid::BOOL => match text {
                "t" | "true" | "1" => Ok(PgValue::Bool(true)),
                "f" | "false" | "0" => Ok(PgValue::Bool(false)),
                other => Err(PgError::Type(format!("Invalid BOOL: {}", other))),
            },

            Oid::INT2 => text
                .parse::<i16>()
                .map(PgValue::Int2)
                .map_err(|e| PgError::Type(format!("Invalid INT2: {}", e))),

            Oid::INT4 => text
                .parse::<i32>()
                .map(PgValue::Int4)
                .map_err(|e| PgError::Type(format!("Invalid INT4: {}", e))),

            Oid::INT8 => text
                .parse::<i64>()
                .map(PgValue::Int8)
                .map_err(|e| PgError::Type(format!("Invalid INT8: {}", e))),

            Oid::FLOAT4 => text
                .parse::<f32>()
                .map(PgValue::Float4)
                .map_err(|e| PgError::Type(format!("Invalid FLOAT4: {}", e))),

            Oid::FLOAT8 => text
                .parse::<f64>()
                .map(PgValue::Float8)
                .map_err(|e| PgError::Type(format!("Invalid FLOAT8: {}", e))),

            Oid::UUID => text
                .parse::<uuid::Uuid>()
                .map(PgValue::Uuid)
                .map_err(|e| PgError::Type(format!("Invalid UUID: {}", e))),

            Oid::DATE => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| PgValue::Date(days_since_pg_epoch(d)))
                .map_err(|e| PgError::Type(format!("Invalid DATE: {}", e))),

            Oid::TIMESTAMP => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .map(|ts| PgValue::Timestamp(micros_since_pg_epoch(ts)))
                .map_err(|e| PgError::Type(format!("Invalid TIMESTAMP: {}", e))),

            // Rendered in the session zone, e.g. `2024-01-01 09:00:00+05:30`
            Oid::TIMESTAMPTZ => DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
                .map(|ts| PgValue::Timestamp(micros_since_pg_epoch(ts.naive_utc())))
                .map_err(|e| PgError::Type(format!("Invalid TIMESTAMPTZ: {}", e))),

            Oid::TIME => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
                .map(|t| PgValue::Time(micros_since_midnight(t)))
                .map_err(|e| PgError::Type(format!("Invalid TIME: {}", e))),

            Oid::BYTEA => decode_bytea_hex(text).map(PgValue::Bytea),

            Oid::TIMETZ => text.parse().map(PgValue::TimeTz),

            Oid::JSON | Oid::JSONB => json(text).map(PgValue::Json),

            // Text types, and the default for everything else
            _ => Ok(PgValue::Text(text.to_string())),
        }
    }

    /// Short type name used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PgValue::Bool(_) => "BOOL",
            PgValue::Int2(_) => "INT2",
            PgValue::Int4(_) => "INT4",
            PgValue::Int8(_) => "INT8",
            PgValue::Float4(_) => "FLOAT4",
            PgValue::Float8(_) => "FLOAT8",
            PgValue::Text(_) => "TEXT",
            PgValue::Bytea(_) => "BYTEA",
            PgValue::Uuid(_) => "UUID",
            PgValue::Timestamp(_) => "TIMESTAMP",
            PgValue::Date(_) => "DATE",
            PgValue::Time(_) => "TIME",
            PgValue::TimeTz(_) => "TIMETZ",
            PgValue::Json(_) => "JSON",
            PgValue::Raw { .. } => "RAW",
        }
    }

    /// The value as a calendar date, for `DATE` values.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            PgValue::Date(days) => days
                .checked_add(PG_EPOCH_DAYS_FROM_CE)
                .and_then(NaiveDate::from_num_days_from_ce_opt),
            _ => None,
        }
    }

    /// The value as a UTC wall-clock timestamp, for `TIMESTAMP[TZ]` values.
    pub fn to_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            PgValue::Timestamp(micros) => {
                DateTime::<Utc>::from_timestamp_micros(micros.checked_add(PG_EPOCH_MICROS)?)
                    .map(|dt| dt.naive_utc())
            }
            _ => None,
        }
    }
}

fn days_since_pg_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - PG_EPOCH_DAYS_FROM_CE
}

fn micros_since_pg_epoch(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros() - PG_EPOCH_MICROS
}

pub(super) fn micros_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000 + i64::from(time.nanosecond() / 1_000)
}

/// Decodes bytea's text output (`bytea_output = hex`): `\x` then two hex
/// digits per byte.
fn decode_bytea_hex(text: &str) -> PgResult<Vec<u8>> {
    let invalid = || PgError::Type(format!("Invalid BYTEA: {:?}", text));
    let hex = text.strip_prefix("\\x").ok_or_else(invalid)?.as_bytes();
    if hex.len() % 2 != 0 {
        return Err(invalid());
    }
    hex.chunks_exact(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16).ok_or_else(invalid)?;
            let low = (pair[1] as char).to_digit(16).ok_or_else(invalid)?;
            Ok((high * 16 + low) as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pg::time::PgTimeZone;

    #[test]
    fn test_oid_classification() {
        assert!(Oid::TEXT.is_text_like());
        assert!(Oid::VARCHAR.is_text_like());
        assert!(!Oid::INT4.is_text_like());

    }

    #[test]
    fn test_decode_binary_ints() {
        assert_eq!(
            PgValue::decode_binary(Oid::INT4, &12345_i32.to_be_bytes()).unwrap(),
            PgValue::Int4(12345)
        );
        assert_eq!(
            PgValue::decode_binary(Oid::INT8, &(-7_i64).to_be_bytes()).unwrap(),
            PgValue::Int8(-7)
        );
        assert!(matches!(
            PgValue::decode_binary(Oid::INT4, &[0, 1]),
            Err(PgError::Type(_))
        ));
    }

    #[test]
    fn test_decode_binary_bool() {
        assert_eq!(
            PgValue::decode_binary(Oid::BOOL, &[1]).unwrap(),
            PgValue::Bool(true)
        );
        assert_eq!(
            PgValue::decode_binary(Oid::BOOL, &[0]).unwrap(),
            PgValue::Bool(false)
        );
        assert!(PgValue::decode_binary(Oid::BOOL, &[]).is_err());
    }

    #[test]
    fn test_decode_binary_jsonb_skips_version() {
        let mut data = vec![1u8];
        data.extend_from_slice(br#"{"a":1}"#);
        assert_eq!(
            PgValue::decode_binary(Oid::JSONB, &data).unwrap(),
            PgValue::Json(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn test_decode_binary_invalid_utf8() {
        assert!(matches!(
            PgValue::decode_binary(Oid::TEXT, &[0xff, 0xfe]),
            Err(PgError::Type(_))
        ));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(
            PgValue::decode_text(Oid::BOOL, b"t").unwrap(),
            PgValue::Bool(true)
        );
        assert!(PgValue::decode_text(Oid::BOOL, b"maybe").is_err());
        assert_eq!(
            PgValue::decode_text(Oid::INT2, b"-12").unwrap(),
            PgValue::Int2(-12)
        );
        assert_eq!(
            PgValue::decode_text(Oid::VARCHAR, b"hello").unwrap(),
            PgValue::Text("hello".to_string())
        );
        assert!(PgValue::decode_text(Oid::INT4, b"four").is_err());
    }

    #[test]
    fn test_decode_text_timetz() {
        assert_eq!(
            PgValue::decode_text(Oid::TIMETZ, b"10:00:00-05:30").unwrap(),
            PgValue::TimeTz(PgTime {
                micros: 36_000_000_000,
                zone: PgTimeZone::new(-5, -30),
            })
        );
    }

    #[test]
    fn test_dates_match_between_formats() {
        let text = PgValue::decode_text(Oid::DATE, b"2024-02-29").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(text.to_date(), Some(date));

        // 2000-01-01 is day zero on the wire.
        let binary = PgValue::decode_binary(Oid::DATE, &0_i32.to_be_bytes()).unwrap();
        assert_eq!(binary.to_date(), NaiveDate::from_ymd_opt(2000, 1, 1));
    }

    #[test]
    fn test_timestamps_match_between_formats() {
        let text = PgValue::decode_text(Oid::TIMESTAMP, b"2000-01-01 00:00:01.5").unwrap();
        assert_eq!(text, PgValue::Timestamp(1_500_000));

        let binary =
            PgValue::decode_binary(Oid::TIMESTAMP, &1_500_000_i64.to_be_bytes()).unwrap();
        assert_eq!(binary.to_timestamp(), text.to_timestamp());
    }

    #[test]
    fn test_unknown_oid_kept_raw() {
        let value = PgValue::decode_binary(Oid(869), &[1, 2, 3]).unwrap();
        assert_eq!(
            value,
            PgValue::Raw {
                oid: Oid(869),
                data: vec![1, 2, 3]
            }
        );
        assert_eq!(value.kind(), "RAW");
    }

    #[test]
    fn test_decode_text_time() {
        assert_eq!(
            PgValue::decode_text(Oid::TIME, b"09:30:00.5").unwrap(),
            PgValue::Time(34_200_500_000)
        );
        assert_eq!(
            PgValue::decode_text(Oid::TIME, b"09:30:00").unwrap(),
            PgValue::decode_binary(Oid::TIME, &34_200_000_000_i64.to_be_bytes()).unwrap()
        );
        assert!(PgValue::decode_text(Oid::TIME, b"9h30").is_err());
    }

    #[test]
    fn test_decode_text_timestamptz_normalises_to_utc() {
        let utc = PgValue::decode_text(Oid::TIMESTAMPTZ, b"2000-01-01 00:00:00+00").unwrap();
        assert_eq!(utc, PgValue::Timestamp(0));

        let shifted =
            PgValue::decode_text(Oid::TIMESTAMPTZ, b"2000-01-01 05:30:01.5+05:30").unwrap();
        assert_eq!(shifted, PgValue::Timestamp(1_500_000));

        let west = PgValue::decode_text(Oid::TIMESTAMPTZ, b"1999-12-31 19:00:00-0500").unwrap();
        assert_eq!(west, PgValue::Timestamp(0));

        assert!(PgValue::decode_text(Oid::TIMESTAMPTZ, b"2000-01-01 00:00:00").is_err());
    }

    #[test]
    fn test_decode_text_bytea_hex() {
        assert_eq!(
            PgValue::decode_text(Oid::BYTEA, b"\\x01ff0a").unwrap(),
            PgValue::Bytea(vec![0x01, 0xff, 0x0a])
        );
        assert_eq!(
            PgValue::decode_text(Oid::BYTEA, b"\\x").unwrap(),
            PgValue::Bytea(Vec::new())
        );
        for bad in [&b"0102"[..], b"\\x012", b"\\xzz"] {
            assert!(matches!(
                PgValue::decode_text(Oid::BYTEA, bad),
                Err(PgError::Type(_))
            ));
        }
    }
}
