//! Wall-clock and calendar arithmetic.
//!
//! # Responsibility
//! - Convert between `HH:MM` (24h or 12h) text and minutes since midnight.
//! - Provide month arithmetic used by the month grid.
//! - Define the single interval-overlap primitive used by the engine.
//!
//! # Invariants
//! - Minute values are always in `0..MINUTES_PER_DAY`.
//! - An end minute lower than its start minute means "crosses midnight".
//! - All functions are pure; nothing here reads the system clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?:\s*([AaPp][Mm]))?$").expect("valid time regex")
});

pub type TimeResult<T> = Result<T, TimeError>;

/// Error for malformed wall-clock or calendar input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    InvalidFormat(String),
}

impl Display for TimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(message) => write!(f, "invalid format: {message}"),
        }
    }
}

impl Error for TimeError {}

/// 12-hour clock designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "AM" => Some(Self::Am),
            "PM" => Some(Self::Pm),
            _ => None,
        }
    }
}

/// Parses an `H:MM` / `HH:MM` value into minutes since local midnight.
///
/// A trailing `AM`/`PM` inside `time` and an explicit `period` are both
/// accepted; when both are present they must agree. With a designator the
/// hour must be 1-12, otherwise 0-23.
///
/// # Errors
/// - `TimeError::InvalidFormat` for non-numeric parts or out-of-range fields.
pub fn minutes_since_midnight(time: &str, period: Option<Meridiem>) -> TimeResult<u16> {
    let trimmed = time.trim();
    let caps = TIME_RE
        .captures(trimmed)
        .ok_or_else(|| TimeError::InvalidFormat(format!("`{trimmed}` is not HH:MM")))?;

    let hour: u32 = caps[1]
        .parse()
        .map_err(|_| TimeError::InvalidFormat(format!("bad hour in `{trimmed}`")))?;
    let minute: u32 = caps[2]
        .parse()
        .map_err(|_| TimeError::InvalidFormat(format!("bad minute in `{trimmed}`")))?;

    let inline = caps.get(3).and_then(|m| Meridiem::parse(m.as_str()));
    let meridiem = match (inline, period) {
        (Some(a), Some(b)) if a != b => {
            return Err(TimeError::InvalidFormat(format!(
                "conflicting AM/PM designators in `{trimmed}`"
            )));
        }
        (Some(a), _) => Some(a),
        (None, b) => b,
    };

    if minute > 59 {
        return Err(TimeError::InvalidFormat(format!(
            "minute {minute} outside 0-59"
        )));
    }

    let hour24 = match meridiem {
        None => {
            if hour > 23 {
                return Err(TimeError::InvalidFormat(format!("hour {hour} outside 0-23")));
            }
            hour
        }
        Some(designator) => {
            if !(1..=12).contains(&hour) {
                return Err(TimeError::InvalidFormat(format!(
                    "hour {hour} outside 1-12 for 12-hour time"
                )));
            }
            match (designator, hour) {
                (Meridiem::Am, 12) => 0,
                (Meridiem::Am, h) => h,
                (Meridiem::Pm, 12) => 12,
                (Meridiem::Pm, h) => h + 12,
            }
        }
    };

    Ok((hour24 * 60 + minute) as u16)
}

/// Formats minutes since midnight as 24-hour `HH:MM`.
pub fn format_minutes(minutes: u16) -> String {
    let minutes = u32::from(minutes) % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Formats minutes since midnight as `h:MM AM|PM`.
pub fn format_minutes_12h(minutes: u16) -> String {
    let minutes = u32::from(minutes) % MINUTES_PER_DAY;
    let (hour, minute) = (minutes / 60, minutes % 60);
    let designator = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12}:{minute:02} {designator}")
}

/// Time-of-day of an absolute timestamp, in minutes.
pub fn minutes_of(at: NaiveDateTime) -> u16 {
    (at.hour() * 60 + at.minute()) as u16
}

/// Returns `end` moved into next-day minute space when it regresses before `start`.
pub fn normalize_end(start: u32, end: u32) -> u32 {
    if end < start {
        end + MINUTES_PER_DAY
    } else {
        end
    }
}

/// Half-open overlap test over minute values.
///
/// Each end lower than its start is first shifted by one day. Touching
/// endpoints do not overlap.
pub fn intervals_overlap(start1: u32, end1: u32, start2: u32, end2: u32) -> bool {
    let end1 = normalize_end(start1, end1);
    let end2 = normalize_end(start2, end2);
    start1 < end2 && end1 > start2
}

/// Anchors minute values to `day`, rolling the end to the next day when the
/// event crosses midnight.
///
/// # Errors
/// - `TimeError::InvalidFormat` when the rolled end falls past the last
///   representable date.
pub fn anchor(
    day: NaiveDate,
    start: u16,
    end: u16,
) -> TimeResult<(NaiveDateTime, NaiveDateTime)> {
    let start_at = day.and_time(time_of(start));
    let mut end_at = day.and_time(time_of(end));
    if end < start {
        end_at = end_at
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| TimeError::InvalidFormat(format!("no day after {day}")))?;
    }
    Ok((start_at, end_at))
}

fn time_of(minutes: u16) -> NaiveTime {
    let minutes = u32::from(minutes) % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// First day of the given month.
///
/// # Errors
/// - `TimeError::InvalidFormat` when `month` is outside 1-12 or the year is
///   outside chrono's supported range.
pub fn first_of_month(year: i32, month: u32) -> TimeResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TimeError::InvalidFormat(format!("invalid month {year}-{month}")))
}

/// Calendar-correct number of days in `month` (1-12).
pub fn days_in_month(year: i32, month: u32) -> TimeResult<u32> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = shift_month(year, month, 1)?;
    let next_first = first_of_month(next_year, next_month)?;
    Ok((next_first - first).num_days() as u32)
}

/// Weekday index of day 1, with 0 = Sunday.
pub fn first_weekday_of_month(year: i32, month: u32) -> TimeResult<u32> {
    Ok(first_of_month(year, month)?
        .weekday()
        .num_days_from_sunday())
}

/// Moves `(year, month)` by `delta` months.
///
/// # Errors
/// - `TimeError::InvalidFormat` when `month` is outside 1-12 or the result
///   does not fit in an `i32` year.
pub fn shift_month(year: i32, month: u32, delta: i32) -> TimeResult<(i32, u32)> {
    if !(1..=12).contains(&month) {
        return Err(TimeError::InvalidFormat(format!("invalid month {year}-{month}")));
    }
    let zero_based = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(delta);
    let shifted_year = i32::try_from(zero_based.div_euclid(12)).map_err(|_| {
        TimeError::InvalidFormat(format!("{year}-{month} shifted by {delta} is out of range"))
    })?;
    Ok((shifted_year, zero_based.rem_euclid(12) as u32 + 1))
}

/// Sunday-first month grid: leading `None` cells, then every day of the month.
pub fn month_grid(year: i32, month: u32) -> TimeResult<Vec<Option<NaiveDate>>> {
    let leading = first_weekday_of_month(year, month)? as usize;
    let days = days_in_month(year, month)?;
    let mut cells = vec![None; leading];
    for day in 1..=days {
        cells.push(NaiveDate::from_ymd_opt(year, month, day));
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_24_hour_values() {
        assert_eq!(minutes_since_midnight("00:00", None), Ok(0));
        assert_eq!(minutes_since_midnight("9:05", None), Ok(545));
        assert_eq!(minutes_since_midnight("23:59", None), Ok(1439));
    }

    #[test]
    fn parses_12_hour_values() {
        assert_eq!(minutes_since_midnight("12:00", Some(Meridiem::Am)), Ok(0));
        assert_eq!(minutes_since_midnight("12:30", Some(Meridiem::Pm)), Ok(750));
        assert_eq!(minutes_since_midnight("1:15 pm", None), Ok(795));
        assert_eq!(minutes_since_midnight("11:59 PM", None), Ok(1439));
    }

    #[test]
    fn rejects_malformed_values() {
        for input in ["", "noon", "24:00", "12:60", "7", "ab:cd", "0:30 AM", "13:00 PM"] {
            assert!(
                matches!(
                    minutes_since_midnight(input, None),
                    Err(TimeError::InvalidFormat(_))
                ),
                "`{input}` should be rejected"
            );
        }
        assert!(minutes_since_midnight("1:00 AM", Some(Meridiem::Pm)).is_err());
    }

    #[test]
    fn every_minute_round_trips_through_both_formats() {
        for minute in 0..MINUTES_PER_DAY as u16 {
            assert_eq!(minutes_since_midnight(&format_minutes(minute), None), Ok(minute));
            assert_eq!(
                minutes_since_midnight(&format_minutes_12h(minute), None),
                Ok(minute)
            );
        }
    }

    #[test]
    fn month_lengths_are_leap_aware() {
        assert_eq!(days_in_month(2024, 2), Ok(29));
        assert_eq!(days_in_month(2023, 2), Ok(28));
        assert_eq!(days_in_month(1900, 2), Ok(28));
        assert_eq!(days_in_month(2000, 2), Ok(29));
        assert_eq!(days_in_month(2024, 4), Ok(30));
        assert_eq!(days_in_month(2024, 12), Ok(31));
        assert!(days_in_month(2024, 13).is_err());
    }

    #[test]
    fn first_weekday_uses_sunday_zero() {
        // 2024-09-01 was a Sunday, 2024-10-01 a Tuesday.
        assert_eq!(first_weekday_of_month(2024, 9), Ok(0));
        assert_eq!(first_weekday_of_month(2024, 10), Ok(2));
    }

    #[test]
    fn overlap_is_half_open_and_midnight_aware() {
        assert!(!intervals_overlap(540, 600, 600, 660));
        assert!(intervals_overlap(540, 600, 570, 630));
        assert!(intervals_overlap(1410, 30, 1420, 1435));
        assert!(!intervals_overlap(1410, 30, 45, 75));
    }

    #[test]
    fn anchor_rolls_end_over_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let (start, end) = anchor(day, 1410, 30).unwrap();
        assert_eq!(start.to_string(), "2024-03-04 23:30:00");
        assert_eq!(end.to_string(), "2024-03-05 00:30:00");
    }

    #[test]
    fn anchor_rejects_rollover_past_last_date() {
        assert!(matches!(
            anchor(NaiveDate::MAX, 1410, 30),
            Err(TimeError::InvalidFormat(_))
        ));
        let (start, end) = anchor(NaiveDate::MAX, 600, 660).unwrap();
        assert_eq!(start.date(), NaiveDate::MAX);
        assert_eq!(end.date(), NaiveDate::MAX);
    }

    #[test]
    fn shift_month_wraps_years() {
        assert_eq!(shift_month(2024, 1, -1), Ok((2023, 12)));
        assert_eq!(shift_month(2024, 12, 1), Ok((2025, 1)));
        assert_eq!(shift_month(2024, 6, 0), Ok((2024, 6)));
        assert_eq!(shift_month(2024, 3, -27), Ok((2021, 12)));
    }

    #[test]
    fn shift_month_rejects_out_of_range_results() {
        assert!(shift_month(i32::MAX, 12, 1).is_err());
        assert!(shift_month(i32::MIN, 1, -1).is_err());
        assert_eq!(shift_month(i32::MAX, 11, 1), Ok((i32::MAX, 12)));
        assert!(shift_month(2024, 0, 1).is_err());
    }

    #[test]
    fn month_grid_starts_with_blank_cells() {
        let grid = month_grid(2024, 10).unwrap();
        assert_eq!(grid.len(), 2 + 31);
        assert!(grid[0].is_none() && grid[1].is_none());
        assert_eq!(grid[2], NaiveDate::from_ymd_opt(2024, 10, 1));
    }
}
