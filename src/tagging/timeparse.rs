//! Date and time-of-day parsing for estimate fields
//!
//! Estimate fields arrive as free text in a handful of shapes. This module
//! turns a date field plus a time field into an absolute epoch, treating the
//! text as local wall-clock time at a given UTC offset.
//!
//! Accepted date shapes:
//! - `YYYY-MM-DD`
//! - `MM/DD/YY` or `MM/DD/YYYY` (two-digit years are 20YY)
//!
//! Accepted time shapes:
//! - 24-hour `H:MM` or `H:MM:SS`
//! - 12-hour `H:MM[:SS] AM|PM`, meridiem case-insensitive
//!
//! Anything else is unparseable and yields `None`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Time-of-day as written, before validation against a 24-hour clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Resolve local date and time text into epoch seconds.
///
/// With `allow_rollover`, an hour of 24 or more wraps into the next calendar
/// day (`24:30` on the 10th is `00:30` on the 11th). The composed wall-clock
/// time is shifted by `tz_offset_minutes` to obtain the true epoch.
///
/// Returns `None` when either text is absent or unparseable.
///
/// # Example
///
/// ```
/// use ticktag::tagging::timeparse::resolve_target_epoch;
///
/// // 2:00 PM at UTC-5 is 19:00 UTC
/// let epoch = resolve_target_epoch(Some("2024-03-10"), Some("2:00 PM"), -300, false);
/// assert_eq!(epoch, Some(1_710_097_200));
/// ```
pub fn resolve_target_epoch(
    date_text: Option<&str>,
    time_text: Option<&str>,
    tz_offset_minutes: i32,
    allow_rollover: bool,
) -> Option<i64> {
    let date = parse_date(date_text?)?;
    let time = parse_time(time_text?)?;
    compose(date, time, tz_offset_minutes, allow_rollover)
}

/// Parse a calendar date in one of the accepted shapes
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    static ISO_RE: OnceLock<Regex> = OnceLock::new();
    static US_RE: OnceLock<Regex> = OnceLock::new();

    let text = text.trim();
    let iso = ISO_RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("Invalid regex pattern")
    });
    let us = US_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})$").expect("Invalid regex pattern")
    });

    if let Some(caps) = iso.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = us.captures(text) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year_text = &caps[3];
        let mut year: i32 = year_text.parse().ok()?;
        if year_text.len() == 2 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// Parse a time of day in one of the accepted shapes.
///
/// 12-hour times are converted to a 24-hour hour (`12 AM` is 0, `PM` adds 12
/// except for 12). 24-hour times keep their hour as written, so `24:30`
/// parses here and is only resolved by rollover.
pub fn parse_time(text: &str) -> Option<TimeOfDay> {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();

    let re = TIME_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AaPp][Mm]))?$")
            .expect("Invalid regex pattern")
    });
    let caps = re.captures(text.trim())?;

    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    if minute > 59 || second > 59 {
        return None;
    }

    if let Some(meridiem) = caps.get(4) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    Some(TimeOfDay {
        hour,
        minute,
        second,
    })
}

/// Compose date and time as UTC wall-clock, then apply the offset
fn compose(
    mut date: NaiveDate,
    mut time: TimeOfDay,
    tz_offset_minutes: i32,
    allow_rollover: bool,
) -> Option<i64> {
    if allow_rollover && time.hour >= 24 {
        time.hour -= 24;
        date = date.succ_opt()?;
    }

    let naive_time = NaiveTime::from_hms_opt(time.hour, time.minute, time.second)?;
    let wall_clock = NaiveDateTime::new(date, naive_time).and_utc().timestamp();

    Some(wall_clock - i64::from(tz_offset_minutes) * 60)
}
