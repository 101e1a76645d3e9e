//! Date handling: Excel serial conversion and free-text date parsing.
//!
//! Excel 1900-system serials count days from 1899-12-30, with serial 60
//! occupied by the nonexistent 1900-02-29; serials at or past the phantom day
//! are reduced by one before conversion. Time-of-day is carried in the
//! fractional part at second granularity.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

/// Days from 1899-12-30 to 1970-01-01.
const SERIAL_EPOCH_TO_UNIX: i64 = 25569;
const SECONDS_PER_DAY: i64 = 86_400;

/// Serials beyond roughly ±100k years are treated as garbage rather than
/// converted.
const MAX_SERIAL_DAYS: f64 = 35_000_000.0;

/// A calendar date-time at second granularity, no zone.
///
/// Displays as the API wire format `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl fmt::Display for SheetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for SheetDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Days since 1970-01-01 for a civil date (proleptic Gregorian).
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = u64::from(if month > 2 { month - 3 } else { month + 9 });
    let doy = (153 * mp + 2) / 5 + u64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i64 - 719_468
}

/// Civil date (proleptic Gregorian) for days since 1970-01-01.
#[allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if month <= 2 { y + 1 } else { y }, month, day)
}

/// Build a date-time with calendar rollover: out-of-range months, days,
/// hours, minutes, and seconds carry into the next larger unit.
fn build_datetime(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Option<SheetDateTime> {
    let year = year + (month - 1).div_euclid(12);
    let month = u32::try_from((month - 1).rem_euclid(12) + 1).ok()?;

    let total_seconds = hour * 3600 + minute * 60 + second;
    let carry_days = total_seconds.div_euclid(SECONDS_PER_DAY);
    let day_seconds = total_seconds.rem_euclid(SECONDS_PER_DAY);

    let days = days_from_civil(year, month, 1) + (day - 1) + carry_days;
    let (year, month, day) = civil_from_days(days);
    let year = i32::try_from(year).ok()?;

    let hour = u32::try_from(day_seconds / 3600).ok()?;
    let minute = u32::try_from((day_seconds % 3600) / 60).ok()?;
    let second = u32::try_from(day_seconds % 60).ok()?;

    Some(SheetDateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Convert an Excel 1900-system serial to a date-time.
///
/// Returns `None` for non-finite or absurdly large serials.
#[allow(clippy::cast_possible_truncation)]
pub fn excel_serial_to_datetime(serial: f64) -> Option<SheetDateTime> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    // Phantom 1900-02-29: serial 60 never existed.
    let adjusted = if serial >= 60.0 { serial - 1.0 } else { serial };
    let whole_days = adjusted.floor();
    let fraction = adjusted - whole_days;
    let whole_days = whole_days as i64;

    let total_seconds = (fraction * 86_400.0).round() as i64;
    let carry_days = total_seconds.div_euclid(SECONDS_PER_DAY);
    let day_seconds = total_seconds.rem_euclid(SECONDS_PER_DAY);

    let days_since_unix = whole_days - SERIAL_EPOCH_TO_UNIX + carry_days;
    let (year, month, day) = civil_from_days(days_since_unix);

    Some(SheetDateTime {
        year: i32::try_from(year).ok()?,
        month,
        day,
        hour: u32::try_from(day_seconds / 3600).ok()?,
        minute: u32::try_from((day_seconds % 3600) / 60).ok()?,
        second: u32::try_from(day_seconds % 60).ok()?,
    })
}

/// Inverse of [`excel_serial_to_datetime`], used for round-trip checks and
/// keyed-record input that carries date-times.
#[allow(clippy::cast_precision_loss)]
pub fn datetime_to_excel_serial(value: SheetDateTime) -> f64 {
    let days =
        days_from_civil(i64::from(value.year), value.month, value.day) + SERIAL_EPOCH_TO_UNIX;
    let seconds = i64::from(value.hour) * 3600 + i64::from(value.minute) * 60
        + i64::from(value.second);
    let raw = days as f64 + seconds as f64 / 86_400.0;
    if raw >= 60.0 {
        raw + 1.0
    } else {
        raw
    }
}

fn iso_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(
            r"(?i)^([0-9]{4})-([0-9]{2})-([0-9]{2})[T ]([0-9]{2}):([0-9]{2})(?::([0-9]{2}))?(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})?$",
        )
        .unwrap()
    })
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").unwrap()
    })
}

fn dmy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(
            r"(?i)^([0-9]{1,2})[/\-.]([0-9]{1,2})[/\-.]([0-9]{2,4})(?:[ T]([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?(?:\s*([AP])M)?)?$",
        )
        .unwrap()
    })
}

fn capture_i64(caps: &regex::Captures<'_>, index: usize) -> Option<i64> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

/// Two-digit years pivot at 70: 70–99 map to 19xx, 00–69 to 20xx.
fn expand_year(raw: &str) -> Option<i64> {
    let year: i64 = raw.parse().ok()?;
    if raw.len() == 2 {
        Some(if year >= 70 { 1900 + year } else { 2000 + year })
    } else {
        Some(year)
    }
}

/// Parse a free-text date: ISO date-time (optional seconds, fraction, zone),
/// ISO date-only, or day/month/year with optional time and AM/PM marker.
pub fn parse_text_datetime(value: &str) -> Option<SheetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(caps) = iso_datetime_re().captures(value) {
        let year = expand_year(caps.get(1)?.as_str())?;
        return build_datetime(
            year,
            capture_i64(&caps, 2)?,
            capture_i64(&caps, 3)?,
            capture_i64(&caps, 4)?,
            capture_i64(&caps, 5)?,
            capture_i64(&caps, 6).unwrap_or(0),
        );
    }

    if let Some(caps) = iso_date_re().captures(value) {
        let year = expand_year(caps.get(1)?.as_str())?;
        return build_datetime(
            year,
            capture_i64(&caps, 2)?,
            capture_i64(&caps, 3)?,
            0,
            0,
            0,
        );
    }

    if let Some(caps) = dmy_re().captures(value) {
        let year = expand_year(caps.get(3)?.as_str())?;
        let mut hour = capture_i64(&caps, 4).unwrap_or(0);
        let minute = capture_i64(&caps, 5).unwrap_or(0);
        let second = capture_i64(&caps, 6).unwrap_or(0);
        match caps.get(7).map(|m| m.as_str().to_ascii_uppercase()) {
            Some(ref meridiem) if meridiem == "P" && hour < 12 => hour += 12,
            Some(ref meridiem) if meridiem == "A" && hour == 12 => hour = 0,
            _ => {}
        }
        return build_datetime(
            year,
            capture_i64(&caps, 2)?,
            capture_i64(&caps, 1)?,
            hour,
            minute,
            second,
        );
    }

    None
}

/// Format a free-text date as the API wire value, if recognized.
pub fn to_api_date_value(value: &str) -> Option<String> {
    parse_text_datetime(value).map(|dt| dt.to_string())
}
