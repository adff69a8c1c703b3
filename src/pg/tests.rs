//! Tests for reading PostgreSQL rows through typed keys.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing_test::traced_test;

use super::*;
use crate::error::{SqlError, SqlValueError};
use crate::query::SqlStatement;
use crate::row::SqlRow;

fn users() -> PgRows {
    PgRows::new(
        SqlStatement::new("SELECT id, email, nickname, created_on, zone, opens_at FROM users"),
        vec![
            FieldDescription::new("id", Oid::INT8, Format::Binary),
            FieldDescription::new("email", Oid::TEXT, Format::Text),
            FieldDescription::new("nickname", Oid::VARCHAR, Format::Text),
            FieldDescription::new("created_on", Oid::DATE, Format::Text),
            FieldDescription::new("zone", Oid::INT4, Format::Binary),
            FieldDescription::new("opens_at", Oid::TIMETZ, Format::Text),
        ],
    )
}

fn cell(data: impl Into<Bytes>) -> Option<Bytes> {
    Some(data.into())
}

fn alice(rows: &PgRows) -> SqlRow<PgClient> {
    rows.row(vec![
        cell(42_i64.to_be_bytes().to_vec()),
        cell("alice@example.com"),
        None,
        cell("2024-02-29"),
        cell((-530_i32).to_be_bytes().to_vec()),
        cell("09:30:00+05:30"),
    ])
    .unwrap()
}

// ============================================================================
// Typed reads
// ============================================================================

mod typed_reads {
    use super::*;

    #[test]
    fn test_binary_and_text_columns() {
        let rows = users();
        let row = alice(&rows);
        let cols = rows.columns();

        let id = cols.column_key::<i64>("id").unwrap();
        let email = cols.column_key::<String>("email").unwrap();
        let created_on = cols.column_key::<NaiveDate>("created_on").unwrap();

        assert_eq!(row.value(&id).unwrap(), 42);
        assert_eq!(row.value(&email).unwrap(), "alice@example.com");
        assert_eq!(
            row.value(&created_on).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_packed_zone_column() {
        let rows = users();
        let row = alice(&rows);
        let zone = rows.columns().column_key::<PgTimeZone>("zone").unwrap();
        assert_eq!(row.value(&zone).unwrap(), PgTimeZone::new(-5, -30));
    }

    #[test]
    fn test_timetz_column() {
        let rows = users();
        let row = alice(&rows);
        let cols = rows.columns();

        let opens_at = cols.column_key::<PgTime>("opens_at").unwrap();
        let value = row.value(&opens_at).unwrap();
        assert_eq!(value.zone, PgTimeZone::new(5, 30));
        assert_eq!(value.time(), NaiveTime::from_hms_opt(9, 30, 0));

        let wall_clock = cols.column_key::<NaiveTime>("opens_at").unwrap();
        assert_eq!(row.value(&wall_clock).unwrap(), value.time().unwrap());
    }

    #[test]
    fn test_text_format_time_timestamptz_and_bytea() {
        let rows = PgRows::new(
            SqlStatement::new("SELECT starts_at, created_at, payload FROM events"),
            vec![
                FieldDescription::new("starts_at", Oid::TIME, Format::Text),
                FieldDescription::new("created_at", Oid::TIMESTAMPTZ, Format::Text),
                FieldDescription::new("payload", Oid::BYTEA, Format::Text),
            ],
        );
        let row = rows
            .row(vec![
                cell("09:30:00"),
                cell("2024-01-01 05:30:00+05:30"),
                cell("\\x0102"),
            ])
            .unwrap();
        let cols = rows.columns();

        let starts_at = cols.column_key::<NaiveTime>("starts_at").unwrap();
        let created_at = cols.column_key::<DateTime<Utc>>("created_at").unwrap();
        let payload = cols.column_key::<Vec<u8>>("payload").unwrap();

        assert_eq!(
            row.value(&starts_at).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            row.value(&created_at).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(row.value(&payload).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_text_timetz_beyond_twelve_hours() {
        let rows = PgRows::new(
            SqlStatement::new("SELECT opens_at FROM shops"),
            vec![FieldDescription::new("opens_at", Oid::TIMETZ, Format::Text)],
        );
        let row = rows.row(vec![cell("10:00:00+14")]).unwrap();
        let zone = rows.columns().column_key::<PgTimeZone>("opens_at").unwrap();
        assert_eq!(row.value(&zone).unwrap(), PgTimeZone::new(14, 0));
    }

    #[test]
    fn test_dynamic_value() {
        let rows = users();
        let row = alice(&rows);
        let id = rows.columns().column_key_at::<PgValue>(0).unwrap();
        assert_eq!(row.value(&id).unwrap(), PgValue::Int8(42));
    }
}

// ============================================================================
// NULL handling
// ============================================================================

mod nulls {
    use super::*;

    #[test]
    fn test_non_null_key_fails_with_wrapped_null() {
        let rows = users();
        let row = alice(&rows);
        let nickname = rows.columns().column_key::<String>("nickname").unwrap();

        let err = row.value(&nickname).unwrap_err();
        match &err {
            SqlError::ValueInvalid { statement, key, .. } => {
                assert_eq!(statement, rows.columns().statement());
                assert_eq!(key, "\"nickname\" as String");
            }
            other => panic!("Expected ValueInvalid, got {other:?}"),
        }
        assert_eq!(err.cause_as::<SqlValueError>(), Some(&SqlValueError::Null));
    }

    #[test]
    fn test_nullable_key_returns_none() {
        let rows = users();
        let row = alice(&rows);
        let nickname = rows
            .columns()
            .nullable_column_key::<String>("nickname")
            .unwrap();
        assert_eq!(row.value(&nickname).unwrap(), None);
    }

    #[test]
    fn test_nullable_key_returns_present_value() {
        let rows = users();
        let row = alice(&rows);
        let email = rows
            .columns()
            .nullable_column_key::<String>("email")
            .unwrap();
        assert_eq!(
            row.value(&email).unwrap().as_deref(),
            Some("alice@example.com")
        );
    }
}

// ============================================================================
// Decoding failures
// ============================================================================

mod failures {
    use super::*;

    #[test]
    fn test_type_mismatch_is_the_cause() {
        let rows = users();
        let row = alice(&rows);
        let email = rows.columns().column_key::<i64>("email").unwrap();

        let err = row.value(&email).unwrap_err();
        assert!(!err.is_null_value());
        assert!(matches!(err.cause_as::<PgError>(), Some(PgError::Type(_))));
    }

    #[test]
    fn test_invalid_zone_offset_is_the_cause() {
        let rows = users();
        let row = rows
            .row(vec![
                cell(1_i64.to_be_bytes().to_vec()),
                cell("bob@example.com"),
                None,
                cell("2024-01-01"),
                cell(1260_i32.to_be_bytes().to_vec()),
                None,
            ])
            .unwrap();
        let zone = rows
            .columns()
            .nullable_column_key::<PgTimeZone>("zone")
            .unwrap();

        let err = row.value(&zone).unwrap_err();
        assert!(matches!(
            err.cause_as::<PgError>(),
            Some(PgError::InvalidTimeZoneOffset(1260))
        ));
        assert_eq!(err.key(), Some("\"zone\" as Option<PgTimeZone>"));
    }

    #[test]
    fn test_truncated_binary_column() {
        let rows = users();
        let row = rows
            .row(vec![
                cell(vec![0u8, 1]),
                cell("carol@example.com"),
                None,
                cell("2024-01-01"),
                None,
                None,
            ])
            .unwrap();
        let id = rows.columns().column_key::<i64>("id").unwrap();
        let err = row.value(&id).unwrap_err();
        assert!(matches!(err.cause_as::<PgError>(), Some(PgError::Type(_))));
    }

    #[test]
    fn test_row_width_must_match_description() {
        let rows = users();
        let err = rows.row(vec![None, None]).unwrap_err();
        assert!(matches!(err, PgError::Protocol(_)));
    }

    #[test]
    #[traced_test]
    fn test_failed_read_is_logged() {
        let rows = users();
        let row = alice(&rows);
        let nickname = rows.columns().column_key::<String>("nickname").unwrap();

        assert!(row.value(&nickname).is_err());
        assert!(logs_contain("column read failed"));
    }
}
