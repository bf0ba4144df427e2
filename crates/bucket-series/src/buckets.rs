//! Calendar-aware bucket sequence generation.
//!
//! Hour and day buckets advance by a fixed duration. Month buckets advance by
//! the length of the month the current bucket starts in, so a sequence
//! started mid-month keeps its day-of-month only while months are long enough.

use std::iter::FusedIterator;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::types::{Granularity, SeriesResult};

/// Lazy, restartable sequence of bucket-start instants over an inclusive range.
#[derive(Debug, Clone)]
pub struct BucketRange {
    next: Option<NaiveDateTime>,
    upto: NaiveDateTime,
    granularity: Granularity,
}

/// Buckets from `from` to `upto` inclusive at the given granularity.
///
/// An inverted range (`from > upto`) produces no buckets.
pub fn bucket_range(
    from: NaiveDateTime,
    upto: NaiveDateTime,
    granularity: Granularity,
) -> BucketRange {
    BucketRange {
        next: Some(from),
        upto,
        granularity,
    }
}

/// Same as [`bucket_range`], with the granularity given by name.
pub fn bucket_range_named(
    from: NaiveDateTime,
    upto: NaiveDateTime,
    granularity: &str,
) -> SeriesResult<BucketRange> {
    Ok(bucket_range(from, upto, granularity.parse::<Granularity>()?))
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
        // December of the last representable year.
        _ => 31,
    }
}

impl BucketRange {
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    fn step(&self, current: NaiveDateTime) -> Duration {
        match self.granularity {
            Granularity::Hour => Duration::hours(1),
            Granularity::Day => Duration::days(1),
            Granularity::Month => {
                Duration::days(i64::from(days_in_month(current.year(), current.month())))
            }
        }
    }
}

impl Iterator for BucketRange {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take().filter(|dt| *dt <= self.upto)?;
        self.next = current.checked_add_signed(self.step(current));
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(dt) if dt <= self.upto => (1, None),
            _ => (0, Some(0)),
        }
    }
}

impl FusedIterator for BucketRange {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TIMESTAMP_FORMAT;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    fn labels(range: BucketRange) -> Vec<String> {
        range
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .collect()
    }

    #[test]
    fn test_month_steps_over_leap_february() {
        let range = bucket_range(
            ts("2024-02-01T00:00:00"),
            ts("2024-04-01T00:00:00"),
            Granularity::Month,
        );
        assert_eq!(
            labels(range),
            vec![
                "2024-02-01T00:00:00",
                "2024-03-01T00:00:00",
                "2024-04-01T00:00:00"
            ]
        );
    }

    #[test]
    fn test_month_step_uses_current_month_length() {
        let range = bucket_range(
            ts("2023-01-15T00:00:00"),
            ts("2023-05-01T00:00:00"),
            Granularity::Month,
        );
        assert_eq!(
            labels(range),
            vec![
                "2023-01-15T00:00:00",
                "2023-02-15T00:00:00",
                "2023-03-15T00:00:00",
                "2023-04-15T00:00:00"
            ]
        );

        // Jan 31 + 31 days lands in March in a common year.
        let range = bucket_range(
            ts("2023-01-31T00:00:00"),
            ts("2023-04-02T00:00:00"),
            Granularity::Month,
        );
        assert_eq!(
            labels(range),
            vec!["2023-01-31T00:00:00", "2023-03-03T00:00:00"]
        );
    }

    #[test]
    fn test_hour_single_bucket() {
        let at = ts("2022-09-01T10:00:00");
        let range = bucket_range(at, at, Granularity::Hour);
        assert_eq!(labels(range), vec!["2022-09-01T10:00:00"]);
    }

    #[test]
    fn test_hour_and_day_counts() {
        let from = ts("2022-10-01T00:00:00");
        let upto = ts("2022-11-30T23:59:00");
        assert_eq!(bucket_range(from, upto, Granularity::Day).count(), 61);
        assert_eq!(
            bucket_range(from, ts("2022-10-02T00:00:00"), Granularity::Hour).count(),
            25
        );
    }

    #[test]
    fn test_upper_bound_inclusive() {
        let range = bucket_range(
            ts("2022-09-01T00:00:00"),
            ts("2022-09-03T00:00:00"),
            Granularity::Day,
        );
        assert_eq!(range.last(), Some(ts("2022-09-03T00:00:00")));

        let range = bucket_range(
            ts("2022-09-01T00:00:00"),
            ts("2022-09-02T23:59:59"),
            Granularity::Day,
        );
        assert_eq!(range.count(), 2);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut range = bucket_range(
            ts("2022-09-02T00:00:00"),
            ts("2022-09-01T00:00:00"),
            Granularity::Hour,
        );
        assert_eq!(range.size_hint(), (0, Some(0)));
        assert_eq!(range.next(), None);
    }

    #[test]
    fn test_restartable() {
        let range = bucket_range(
            ts("2022-09-01T00:00:00"),
            ts("2022-12-01T00:00:00"),
            Granularity::Month,
        );
        let first: Vec<_> = range.clone().collect();
        let second: Vec<_> = range.collect();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_named_granularity() {
        let from = ts("2022-09-01T00:00:00");
        let range = bucket_range_named(from, from, "day").unwrap();
        assert_eq!(range.granularity(), Granularity::Day);
        assert!(bucket_range_named(from, from, "week").is_err());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }
}
