//! Compact date/time codec.
//!
//! WebUntis encodes dates as `YYYYMMDD` and times of day as `HHMM` without
//! leading zeros, either as JSON numbers or as numeric strings.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Hour and minute decoded from a compact `HHMM` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactTime {
    pub hour: u32,
    pub minute: u32,
}

/// Decodes `815` into 08:15 and `5` into 00:05.
pub fn parse_compact_time(value: impl ToString) -> Result<CompactTime> {
    let raw = value.to_string();
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.len() > 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedTime(raw));
    }

    let padded = format!("{trimmed:0>4}");
    let hour = padded[..2].parse::<u32>().map_err(|_| Error::MalformedTime(raw.clone()))?;
    let minute = padded[2..].parse::<u32>().map_err(|_| Error::MalformedTime(raw.clone()))?;

    if hour > 23 || minute > 59 {
        return Err(Error::MalformedTime(raw));
    }

    Ok(CompactTime { hour, minute })
}

/// Decodes `20230914` into 2023-09-14 00:00:00.
pub fn parse_compact_date(value: impl ToString) -> Result<NaiveDateTime> {
    let raw = value.to_string();
    let trimmed = raw.trim();

    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedDate(raw));
    }

    let year = trimmed[..4].parse::<i32>().map_err(|_| Error::MalformedDate(raw.clone()))?;
    let month = trimmed[4..6].parse::<u32>().map_err(|_| Error::MalformedDate(raw.clone()))?;
    let day = trimmed[6..].parse::<u32>().map_err(|_| Error::MalformedDate(raw.clone()))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or(Error::MalformedDate(raw))
}

/// Combines a compact date and time, shifting the hour by `hour_offset`.
///
/// The shift is added as a duration, so an hour pushed past 23 rolls over
/// into the next day.
pub fn parse_compact_date_time(
    date: impl ToString,
    time: impl ToString,
    hour_offset: i64,
) -> Result<NaiveDateTime> {
    let raw_time = time.to_string();
    let day = parse_compact_date(date)?;
    let time = parse_compact_time(&raw_time)?;

    i64::from(time.hour)
        .checked_add(hour_offset)
        .and_then(Duration::try_hours)
        .and_then(|shift| shift.checked_add(&Duration::minutes(i64::from(time.minute))))
        .and_then(|shift| day.checked_add_signed(shift))
        .ok_or_else(|| Error::MalformedTime(format!("{raw_time} shifted by {hour_offset}h")))
}

/// Encodes a date as `YYYY<sep>MM<sep>DD`.
pub fn format_compact_date(date: NaiveDate, separator: &str) -> String {
    format!(
        "{:04}{separator}{:02}{separator}{:02}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
