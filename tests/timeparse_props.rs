//! Property tests for time parsing and bucketing

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use ticktag::models::{Bucket, ClockSnapshot};
use ticktag::tagging::bucket::{bucket_for_till, classify_schedule, ScheduleInput};
use ticktag::tagging::timeparse::resolve_target_epoch;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2090, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

proptest! {
    #[test]
    fn rollover_matches_next_day(
        date in date_strategy(),
        hour in 0u32..24,
        minute in 0u32..60,
        offset in -720i32..=840,
    ) {
        let rolled = resolve_target_epoch(
            Some(&iso(date)),
            Some(&format!("{}:{minute:02}", hour + 24)),
            offset,
            true,
        );
        let next_day = date.checked_add_days(Days::new(1)).unwrap();
        let plain = resolve_target_epoch(
            Some(&iso(next_day)),
            Some(&format!("{hour}:{minute:02}")),
            offset,
            false,
        );

        prop_assert!(rolled.is_some());
        prop_assert_eq!(rolled, plain);
    }

    #[test]
    fn hour_past_midnight_needs_rollover(
        date in date_strategy(),
        hour in 24u32..48,
        minute in 0u32..60,
    ) {
        let time = format!("{hour}:{minute:02}");
        prop_assert_eq!(resolve_target_epoch(Some(&iso(date)), Some(&time), 0, false), None);
    }

    #[test]
    fn offset_shifts_epoch(
        date in date_strategy(),
        hour in 0u32..24,
        minute in 0u32..60,
        offset in -720i32..=840,
    ) {
        let date = iso(date);
        let time = format!("{hour:02}:{minute:02}");
        let utc = resolve_target_epoch(Some(&date), Some(&time), 0, false).unwrap();
        let local = resolve_target_epoch(Some(&date), Some(&time), offset, false).unwrap();

        prop_assert_eq!(local, utc - i64::from(offset) * 60);
    }

    #[test]
    fn twelve_hour_agrees_with_twenty_four_hour(
        date in date_strategy(),
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let date = iso(date);
        let (h12, meridiem) = match hour {
            0 => (12, "AM"),
            1..=11 => (hour, "am"),
            12 => (12, "PM"),
            _ => (hour - 12, "pm"),
        };
        let twelve_text = format!("{h12}:{minute:02} {meridiem}");
        let twenty_four_text = format!("{hour}:{minute:02}");
        let twelve = resolve_target_epoch(Some(&date), Some(&twelve_text), 0, false);
        let twenty_four = resolve_target_epoch(Some(&date), Some(&twenty_four_text), 0, false);

        prop_assert!(twelve.is_some());
        prop_assert_eq!(twelve, twenty_four);
    }

    #[test]
    fn buckets_cool_with_distance(a in -10_000i64..20_000, b in -10_000i64..20_000) {
        let rank = |bucket: Bucket| match bucket {
            Bucket::Hot => 0,
            Bucket::Warm => 1,
            Bucket::Cold => 2,
            _ => unreachable!(),
        };
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(bucket_for_till(near)) <= rank(bucket_for_till(far)));
    }

    #[test]
    fn classification_is_deterministic(
        now in 1_600_000_000i64..1_900_000_000,
        offset in -720i32..=840,
        time in "[0-9]{1,2}:[0-9]{2}( [AP]M)?",
        date in "(20[0-9]{2}-[01][0-9]-[0-3][0-9])|([01]?[0-9]/[0-3]?[0-9]/[0-9]{2})",
    ) {
        let input = ScheduleInput {
            date: Some(date),
            latest_estimate: Some(time),
            ..Default::default()
        };
        let clock = ClockSnapshot::new(now, offset);

        let first = classify_schedule(&input, &clock);
        prop_assert_eq!(first, classify_schedule(&input, &clock));
        prop_assert!(matches!(first, Bucket::Hot | Bucket::Warm | Bucket::Cold));
    }
}
