//! Bucket classification for schedule and trip records
//!
//! Both record kinds follow the same decision order:
//!
//! 1. Completed status is DONE, without looking at time fields
//! 2. A live record (underway schedule, gone-in trip) is LIVE
//! 3. Otherwise the first available estimate is resolved to an epoch and the
//!    time remaining decides HOT, WARM or COLD
//!
//! Missing or unparseable time data is COLD, never an error.

use crate::config::{ScheduleFields, TripFields};
use crate::models::{Bucket, ClockSnapshot, Record, RecordStatus};
use crate::tagging::timeparse::resolve_target_epoch;

/// Records due within this many seconds (or already past) are HOT
pub const HOT_WINDOW_SECS: i64 = 1800;

/// Records due within this many seconds are WARM
pub const WARM_WINDOW_SECS: i64 = 3600;

/// Base go-time values containing this text are known to be bogus
pub const BAD_GO_TIME_SENTINEL: &str = "00:00:00";

/// Classification inputs read from a schedule record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleInput {
    pub status: Option<String>,
    pub date: Option<String>,
    pub latest_estimate: Option<String>,
    pub base_estimate: Option<String>,
}

impl ScheduleInput {
    pub fn from_record(record: &Record, fields: &ScheduleFields) -> Self {
        Self {
            status: record.text(&fields.status),
            date: record.text(&fields.date),
            latest_estimate: record.text(&fields.latest_estimate),
            base_estimate: record.text(&fields.base_estimate),
        }
    }

    /// Time text consulted for the target, in priority order
    pub fn target_time(&self) -> Option<&str> {
        self.latest_estimate
            .as_deref()
            .or(self.base_estimate.as_deref())
    }
}

/// Classification inputs read from a trip record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripInput {
    pub status: Option<String>,
    pub live: bool,
    pub date: Option<String>,
    pub latest_go: Option<String>,
    pub base_go: Option<String>,
    pub start: Option<String>,
}

impl TripInput {
    pub fn from_record(record: &Record, fields: &TripFields) -> Self {
        Self {
            status: record.text(&fields.status),
            live: record.flag(&fields.live),
            date: record.text(&fields.date),
            latest_go: record.text(&fields.latest_go),
            base_go: record.text(&fields.base_go),
            start: record.text(&fields.start),
        }
    }

    /// Time text consulted for the target, in priority order.
    ///
    /// A base go-time carrying the sentinel is skipped.
    pub fn target_time(&self) -> Option<&str> {
        let base_go = self
            .base_go
            .as_deref()
            .filter(|t| !t.contains(BAD_GO_TIME_SENTINEL));

        self.latest_go
            .as_deref()
            .or(base_go)
            .or(self.start.as_deref())
    }
}

/// Classify a schedule record
pub fn classify_schedule(input: &ScheduleInput, clock: &ClockSnapshot) -> Bucket {
    match RecordStatus::parse(input.status.as_deref()) {
        RecordStatus::Completed => Bucket::Done,
        RecordStatus::Underway => Bucket::Live,
        RecordStatus::Other => classify_target(input.date.as_deref(), input.target_time(), clock),
    }
}

/// Classify a trip record
pub fn classify_trip(input: &TripInput, clock: &ClockSnapshot) -> Bucket {
    if RecordStatus::parse(input.status.as_deref()) == RecordStatus::Completed {
        return Bucket::Done;
    }
    if input.live {
        return Bucket::Live;
    }
    classify_target(input.date.as_deref(), input.target_time(), clock)
}

/// Bucket for the number of seconds remaining until the target
pub fn bucket_for_till(till: i64) -> Bucket {
    if till <= HOT_WINDOW_SECS {
        Bucket::Hot
    } else if till <= WARM_WINDOW_SECS {
        Bucket::Warm
    } else {
        Bucket::Cold
    }
}

fn classify_target(date: Option<&str>, time: Option<&str>, clock: &ClockSnapshot) -> Bucket {
    let allow_rollover = time.is_some_and(|t| t.starts_with("24"));

    match resolve_target_epoch(date, time, clock.tz_offset_minutes, allow_rollover) {
        Some(target) => bucket_for_till(target - clock.now_epoch),
        None => Bucket::Cold,
    }
}
