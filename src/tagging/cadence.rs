//! Re-evaluation cadence per mode and bucket
//!
//! | mode \ bucket | COLD | WARM | HOT/LIVE | DONE |
//! |---------------|------|------|----------|------|
//! | HOLDOVER      | -    | -    | -        | -    |
//! | DAY           | 1200 | 300  | 180      | -    |
//! | NIGHT         | 1200 | 1200 | 300      | -    |
//!
//! `-` means no further automatic check.

use crate::models::{Bucket, Mode};

/// Interval used for labels outside the known bucket set
pub const UNKNOWN_BUCKET_INTERVAL_SECS: i64 = 300;

/// Seconds until the next check, or `None` when no check is needed
pub fn interval_seconds(mode: Mode, bucket: Bucket) -> Option<i64> {
    match (mode, bucket) {
        (Mode::Holdover, _) | (_, Bucket::Done) => None,
        (Mode::Day, Bucket::Cold) => Some(1200),
        (Mode::Day, Bucket::Warm) => Some(300),
        (Mode::Day, Bucket::Hot | Bucket::Live) => Some(180),
        (Mode::Night, Bucket::Cold | Bucket::Warm) => Some(1200),
        (Mode::Night, Bucket::Hot | Bucket::Live) => Some(300),
    }
}

/// Interval for a raw stored label.
///
/// Labels that do not name a bucket fall back to the DAY non-HOT interval in
/// every mode except HOLDOVER.
pub fn interval_for_label(mode: Mode, label: Option<&str>) -> Option<i64> {
    match label.and_then(Bucket::parse) {
        Some(bucket) => interval_seconds(mode, bucket),
        None if mode == Mode::Holdover => None,
        None => Some(UNKNOWN_BUCKET_INTERVAL_SECS),
    }
}

/// Next-due epoch for a bucket at `now_epoch`
pub fn next_due(mode: Mode, bucket: Bucket, now_epoch: i64) -> Option<i64> {
    interval_seconds(mode, bucket).map(|interval| now_epoch + interval)
}
