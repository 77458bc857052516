//! crates/logging/src/timezone.rs
//! Process-wide timezone used when stamping records.
//!
//! Every [`Record`](crate::Record) is stamped with the current time converted
//! to the timezone stored here. Changing it affects all records created
//! afterwards, in every channel of the process. Until a timezone is set the
//! system local offset is used, falling back to UTC when the platform cannot
//! report it.
//!
//! Zones are either a fixed offset or a tz database name such as
//! `Europe/Paris`, whose offset follows daylight saving changes.

use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use chrono::{Offset, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset};

static TIMEZONE: RwLock<Option<Timezone>> = RwLock::new(None);

/// Error returned when a timezone specification cannot be parsed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unrecognized timezone \"{0}\", expected UTC, local, an offset or a zone name")]
pub struct TimezoneError(pub String);

/// A timezone records can be stamped in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timezone {
    /// The same offset at every instant.
    Fixed(UtcOffset),
    /// A tz database zone.
    Named(Tz),
}

impl Timezone {
    /// Returns the UTC offset in effect at `instant`.
    ///
    /// Instants outside the range the tz database covers resolve to UTC.
    #[must_use]
    pub fn offset_at(self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Fixed(offset) => offset,
            Self::Named(zone) => chrono::DateTime::from_timestamp(instant.unix_timestamp(), 0)
                .map(|utc| zone.offset_from_utc_datetime(&utc.naive_utc()).fix())
                .and_then(|fixed| UtcOffset::from_whole_seconds(fixed.local_minus_utc()).ok())
                .unwrap_or(UtcOffset::UTC),
        }
    }
}

impl From<UtcOffset> for Timezone {
    fn from(offset: UtcOffset) -> Self {
        Self::Fixed(offset)
    }
}

impl From<Tz> for Timezone {
    fn from(zone: Tz) -> Self {
        Self::Named(zone)
    }
}

impl FromStr for Timezone {
    type Err = TimezoneError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_timezone(text)
    }
}

/// Sets the timezone used for all subsequently created records.
pub fn set_timezone(zone: impl Into<Timezone>) {
    *TIMEZONE.write().unwrap_or_else(PoisonError::into_inner) = Some(zone.into());
}

/// Returns the timezone currently applied to new records.
#[must_use]
pub fn timezone() -> Timezone {
    TIMEZONE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .unwrap_or_else(|| Timezone::Fixed(local_offset()))
}

/// Returns the system local offset, or UTC when it is not available.
#[must_use]
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Returns the current time in the process timezone.
#[must_use]
pub fn now() -> OffsetDateTime {
    let utc = OffsetDateTime::now_utc();
    utc.to_offset(timezone().offset_at(utc))
}

/// Parses a timezone specification.
///
/// Accepted forms are those of [`parse_offset`] plus tz database names such
/// as `Europe/Paris` or `America/New_York`.
///
/// # Examples
///
/// ```
/// use logging::timezone::{Timezone, parse_timezone};
/// use time::UtcOffset;
///
/// assert_eq!(parse_timezone("UTC")?, Timezone::Fixed(UtcOffset::UTC));
/// assert_eq!(parse_timezone("Europe/Paris")?, Timezone::Named(chrono_tz::Europe::Paris));
/// assert!(parse_timezone("Mars/Olympus").is_err());
/// # Ok::<(), logging::timezone::TimezoneError>(())
/// ```
pub fn parse_timezone(text: &str) -> Result<Timezone, TimezoneError> {
    let trimmed = text.trim();
    if trimmed.starts_with(['+', '-']) || is_fixed_name(trimmed) {
        return parse_offset(text).map(Timezone::Fixed);
    }
    Tz::from_str(trimmed)
        .map(Timezone::Named)
        .map_err(|_| TimezoneError(text.to_owned()))
}

/// Parses a fixed offset.
///
/// Accepted forms are `UTC`, `GMT`, `Z`, `local`, and signed offsets written
/// as `+HH`, `+HHMM` or `+HH:MM`.
///
/// # Examples
///
/// ```
/// use logging::timezone::parse_offset;
/// use time::UtcOffset;
///
/// assert_eq!(parse_offset("UTC")?, UtcOffset::UTC);
/// assert_eq!(parse_offset("+02:30")?, UtcOffset::from_hms(2, 30, 0).unwrap());
/// assert_eq!(parse_offset("-0500")?, UtcOffset::from_hms(-5, 0, 0).unwrap());
/// assert!(parse_offset("Europe/Paris").is_err());
/// # Ok::<(), logging::timezone::TimezoneError>(())
/// ```
pub fn parse_offset(text: &str) -> Result<UtcOffset, TimezoneError> {
    let trimmed = text.trim();
    let invalid = || TimezoneError(text.to_owned());

    match trimmed.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" => return Ok(UtcOffset::UTC),
        "LOCAL" => return Ok(local_offset()),
        _ => {}
    }

    let (sign, digits) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1_i8, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1_i8, rest)
    } else {
        return Err(invalid());
    };

    // Only ASCII past this point, so byte offsets are char boundaries.
    if !digits.bytes().all(|byte| byte.is_ascii_digit() || byte == b':') {
        return Err(invalid());
    }

    let (hours, minutes) = match (digits.len(), digits.split_once(':')) {
        (_, Some((hours, minutes))) => (hours, minutes),
        (2, None) => (digits, "00"),
        (4, None) => digits.split_at(2),
        _ => return Err(invalid()),
    };

    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i8 = hours.parse().map_err(|_| invalid())?;
    let minutes: i8 = minutes.parse().map_err(|_| invalid())?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())
}

fn is_fixed_name(text: &str) -> bool {
    ["UTC", "GMT", "Z", "LOCAL"]
        .iter()
        .any(|name| text.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_named_zones() {
        assert_eq!(parse_offset("utc").unwrap(), UtcOffset::UTC);
        assert_eq!(parse_offset(" Z ").unwrap(), UtcOffset::UTC);
        assert_eq!(parse_offset("local").unwrap(), local_offset());
    }

    #[test]
    fn parses_signed_offsets() {
        assert_eq!(
            parse_offset("+01").unwrap(),
            UtcOffset::from_hms(1, 0, 0).unwrap()
        );
        assert_eq!(
            parse_offset("-03:30").unwrap(),
            UtcOffset::from_hms(-3, -30, 0).unwrap()
        );
        assert_eq!(
            parse_offset("+0545").unwrap(),
            UtcOffset::from_hms(5, 45, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_offsets() {
        for text in ["", "+", "+1", "02:00", "+2:00", "+99:00", "+ab:cd", "Europe/Paris"] {
            assert!(parse_offset(text).is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn rejects_multibyte_offsets_without_panicking() {
        for text in ["+1é1", "+é:00", "-0é", "+٠١:٠٠"] {
            assert_eq!(parse_offset(text), Err(TimezoneError(text.to_owned())));
            assert!(parse_timezone(text).is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn parses_tz_database_names() {
        assert_eq!(
            parse_timezone("Europe/Paris").unwrap(),
            Timezone::Named(chrono_tz::Europe::Paris)
        );
        assert_eq!(
            parse_timezone(" Asia/Kolkata ").unwrap(),
            Timezone::Named(chrono_tz::Asia::Kolkata)
        );
        assert_eq!(
            parse_timezone("gmt").unwrap(),
            Timezone::Fixed(UtcOffset::UTC)
        );
        assert_eq!(
            parse_timezone("+02:00").unwrap(),
            Timezone::Fixed(UtcOffset::from_hms(2, 0, 0).unwrap())
        );
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert!(parse_timezone("").is_err());
    }

    #[test]
    fn named_zones_follow_daylight_saving() {
        let paris = Timezone::Named(chrono_tz::Europe::Paris);
        assert_eq!(
            paris.offset_at(datetime!(2024-01-15 12:00 UTC)),
            UtcOffset::from_hms(1, 0, 0).unwrap()
        );
        assert_eq!(
            paris.offset_at(datetime!(2024-07-15 12:00 UTC)),
            UtcOffset::from_hms(2, 0, 0).unwrap()
        );

        let fixed = Timezone::from(UtcOffset::from_hms(-4, 0, 0).unwrap());
        assert_eq!(
            fixed.offset_at(datetime!(2024-07-15 12:00 UTC)),
            UtcOffset::from_hms(-4, 0, 0).unwrap()
        );
    }

    #[test]
    fn set_timezone_applies_to_new_timestamps() {
        let offset = UtcOffset::from_hms(9, 0, 0).unwrap();
        set_timezone(offset);
        assert_eq!(timezone(), Timezone::Fixed(offset));
        assert_eq!(now().offset(), offset);

        set_timezone(chrono_tz::Asia::Kolkata);
        assert_eq!(now().offset(), UtcOffset::from_hms(5, 30, 0).unwrap());
        set_timezone(local_offset());
    }
}
