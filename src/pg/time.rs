//! PostgreSQL timezone offsets and `timetz` values.
//!
//! PostgreSQL reports fixed offsets either packed into one integer (`±hh`
//! or `±hhmm`), as seconds from UTC, or textually (`+05`, `-05:30`).
//! [`PgTimeZone`] accepts all three.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::{PgError, PgResult};
use super::types::micros_since_midnight;

/// A fixed displacement from UTC.
///
/// For negative offsets both fields are negative: `-05:30` is
/// `hours: -5, minutes: -30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PgTimeZone {
    pub hours: i32,
    pub minutes: i32,
}

impl PgTimeZone {
    pub const UTC: PgTimeZone = PgTimeZone {
        hours: 0,
        minutes: 0,
    };

    /// Builds an offset from its parts. Not validated.
    pub fn new(hours: i32, minutes: i32) -> Self {
        Self { hours, minutes }
    }

    /// Parses a packed `±hh` or `±hhmm` offset.
    ///
    /// Codes with magnitude 0 through 12 are whole hours, so `5` is `+05`
    /// and never `+00:05`. Codes 15 through 1200 are `hhmm` when the last
    /// two digits are a valid minute. Everything else, including 13 and 14,
    /// is rejected.
    pub fn from_packed_offset(time_code: i32) -> PgResult<Self> {
        let magnitude = time_code.unsigned_abs();
        match magnitude {
            0..=12 => Ok(Self::new(time_code, 0)),
            15..=1200 if magnitude % 100 < 60 => Ok(Self::new(time_code / 100, time_code % 100)),
            _ => Err(PgError::InvalidTimeZoneOffset(time_code)),
        }
    }

    /// Builds an offset from seconds east of UTC. Not validated; seconds
    /// that aren't a whole minute are truncated toward zero.
    pub fn from_seconds_from_utc(seconds: i32) -> Self {
        let minutes = seconds / 60;
        Self::new(minutes / 60, minutes % 60)
    }

    /// Samples `tz` at `instant`.
    pub fn at<Tz: TimeZone>(tz: &Tz, instant: &DateTime<Utc>) -> Self {
        let offset = tz.offset_from_utc_datetime(&instant.naive_utc()).fix();
        Self::from_seconds_from_utc(offset.local_minus_utc())
    }

    #[inline]
    pub fn seconds_from_utc(&self) -> i32 {
        (self.hours * 60 + self.minutes) * 60
    }

    /// [`seconds_from_utc`](Self::seconds_from_utc), or `None` on overflow.
    pub fn checked_seconds_from_utc(&self) -> Option<i32> {
        self.hours
            .checked_mul(60)?
            .checked_add(self.minutes)?
            .checked_mul(60)
    }

    /// Replaces both fields with those derived from `seconds`.
    pub fn set_seconds_from_utc(&mut self, seconds: i32) {
        *self = Self::from_seconds_from_utc(seconds);
    }

    /// `None` if chrono rejects the offset (a day or more from UTC).
    pub fn to_fixed_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.checked_seconds_from_utc()?)
    }
}

impl From<FixedOffset> for PgTimeZone {
    fn from(offset: FixedOffset) -> Self {
        PgTimeZone::from_seconds_from_utc(offset.local_minus_utc())
    }
}

impl fmt::Display for PgTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.hours < 0 || self.minutes < 0 {
            '-'
        } else {
            '+'
        };
        write!(f, "{}{:02}", sign, self.hours.unsigned_abs())?;
        if self.minutes != 0 {
            write!(f, ":{:02}", self.minutes.unsigned_abs())?;
        }
        Ok(())
    }
}

/// Largest hour field PostgreSQL prints for a `timetz` offset.
const MAX_TEXT_OFFSET_HOURS: i32 = 15;

/// Parses PostgreSQL's textual offsets: `±hh`, `±hhmm` or `±hh:mm`.
///
/// Unlike the packed form, the field boundaries are explicit here, so
/// `+00:05` is five minutes. The range is the one PostgreSQL itself
/// accepts for `timetz`: up to `±15:59`, which covers `+13` and `+14`.
impl FromStr for PgTimeZone {
    type Err = PgError;

    fn from_str(s: &str) -> PgResult<Self> {
        let invalid = || PgError::Type(format!("Invalid time zone offset: {:?}", s));

        let (negative, digits) = match s.as_bytes().first() {
            Some(b'+') => (false, &s[1..]),
            Some(b'-') => (true, &s[1..]),
            _ => return Err(invalid()),
        };
        if !digits.is_ascii() {
            return Err(invalid());
        }
        let (hh, mm) = match digits.len() {
            2 => (digits, "00"),
            4 => digits.split_at(2),
            5 if digits.as_bytes()[2] == b':' => (&digits[..2], &digits[3..]),
            _ => return Err(invalid()),
        };
        if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: i32 = hh.parse().map_err(|_| invalid())?;
        let minutes: i32 = mm.parse().map_err(|_| invalid())?;

        let sign = if negative { -1 } else { 1 };
        if hours > MAX_TEXT_OFFSET_HOURS || minutes >= 60 {
            return Err(PgError::InvalidTimeZoneOffset(sign * (hours * 100 + minutes)));
        }
        Ok(PgTimeZone::from_seconds_from_utc(
            sign * (hours * 3600 + minutes * 60),
        ))
    }
}

/// A `timetz` value: time of day plus the offset it was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PgTime {
    /// Microseconds since midnight, local to `zone`.
    pub micros: i64,
    pub zone: PgTimeZone,
}

impl PgTime {
    /// Decodes the binary wire form: 8-byte microseconds followed by a
    /// 4-byte offset in seconds *west* of UTC.
    pub fn decode_binary(data: &[u8]) -> PgResult<Self> {
        if data.len() != 12 {
            return Err(PgError::Type(format!(
                "Invalid TIMETZ length: {}",
                data.len()
            )));
        }
        let mut micros = [0u8; 8];
        micros.copy_from_slice(&data[..8]);
        let mut west = [0u8; 4];
        west.copy_from_slice(&data[8..]);
        Ok(PgTime {
            micros: i64::from_be_bytes(micros),
            zone: PgTimeZone::from_seconds_from_utc(i32::from_be_bytes(west).wrapping_neg()),
        })
    }

    pub fn time(&self) -> Option<NaiveTime> {
        let secs = u32::try_from(self.micros.div_euclid(1_000_000)).ok()?;
        let nanos = u32::try_from(self.micros.rem_euclid(1_000_000) * 1_000).ok()?;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    }
}

impl FromStr for PgTime {
    type Err = PgError;

    /// Parses the text form, e.g. `13:45:00.25+05:30`.
    fn from_str(s: &str) -> PgResult<Self> {
        let split = s
            .rfind(['+', '-'])
            .filter(|&i| i > 0)
            .ok_or_else(|| PgError::Type(format!("Invalid TIMETZ: {:?}", s)))?;
        let (time, zone) = s.split_at(split);
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S%.f")
            .map_err(|e| PgError::Type(format!("Invalid TIMETZ {:?}: {}", s, e)))?;
        Ok(PgTime {
            micros: micros_since_midnight(time),
            zone: zone.parse()?,
        })
    }
}
