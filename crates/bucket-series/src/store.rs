//! Event store collaborator interface and the in-memory implementation.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::types::{AggregateRow, Event, Granularity, SeriesResult};

/// Range filter plus grouping requested from a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub from: NaiveDateTime,
    pub upto: NaiveDateTime,
    pub granularity: Granularity,
}

impl RangeQuery {
    /// Inclusive on both ends.
    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        *dt >= self.from && *dt <= self.upto
    }
}

/// A queryable event collection.
///
/// Implementations must keep only events with `from <= dt <= upto`, group
/// them by `granularity.bucket_key(dt)`, sum `value` per group, and return
/// the groups sorted by key ascending.
pub trait EventStore {
    fn aggregate(&self, query: &RangeQuery) -> SeriesResult<Vec<AggregateRow>>;
}

impl<T: EventStore + ?Sized> EventStore for &T {
    fn aggregate(&self, query: &RangeQuery) -> SeriesResult<Vec<AggregateRow>> {
        (**self).aggregate(query)
    }
}

impl<T: EventStore + ?Sized> EventStore for Box<T> {
    fn aggregate(&self, query: &RangeQuery) -> SeriesResult<Vec<AggregateRow>> {
        (**self).aggregate(query)
    }
}

/// In-memory container for all stored events.
#[derive(Debug, Clone)]
pub struct MemoryEventStore {
    pub events: Vec<Event>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEventStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        let now = unix_now();
        Self {
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn insert(&mut self, event: Event) {
        self.events.push(event);
        self.updated_at = unix_now();
    }

    pub fn extend<I: IntoIterator<Item = Event>>(&mut self, events: I) -> usize {
        let before = self.events.len();
        self.events.extend(events);
        self.updated_at = unix_now();
        self.events.len() - before
    }

    /// Return the number of events.
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Earliest and latest event timestamps, if any events exist.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.events.iter().map(|e| e.dt).min()?;
        let last = self.events.iter().map(|e| e.dt).max()?;
        Some((first, last))
    }
}

impl EventStore for MemoryEventStore {
    fn aggregate(&self, query: &RangeQuery) -> SeriesResult<Vec<AggregateRow>> {
        let mut groups: BTreeMap<String, f64> = BTreeMap::new();
        for event in self.events.iter().filter(|e| query.contains(&e.dt)) {
            *groups
                .entry(query.granularity.bucket_key(&event.dt))
                .or_insert(0.0) += event.value;
        }

        Ok(groups
            .into_iter()
            .map(|(bucket_key, total)| AggregateRow { bucket_key, total })
            .collect())
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TIMESTAMP_FORMAT;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    fn sample_store() -> MemoryEventStore {
        let mut store = MemoryEventStore::new();
        store.extend([
            Event::new(ts("2022-02-28T23:59:59"), 100.0),
            Event::new(ts("2022-03-01T00:00:00"), 1.0),
            Event::new(ts("2022-03-01T00:30:00"), 2.0),
            Event::new(ts("2022-03-01T05:00:00"), 4.0),
            Event::new(ts("2022-03-31T23:59:59"), 8.0),
            Event::new(ts("2022-04-01T00:00:00"), 1000.0),
        ]);
        store
    }

    #[test]
    fn test_range_filter_inclusive() {
        let store = sample_store();
        let rows = store
            .aggregate(&RangeQuery {
                from: ts("2022-03-01T00:00:00"),
                upto: ts("2022-03-31T23:59:59"),
                granularity: Granularity::Month,
            })
            .unwrap();
        assert_eq!(
            rows,
            vec![AggregateRow {
                bucket_key: "2022-03".to_string(),
                total: 15.0
            }]
        );
    }

    #[test]
    fn test_groups_sorted_by_key() {
        let store = sample_store();
        let rows = store
            .aggregate(&RangeQuery {
                from: ts("2022-02-01T00:00:00"),
                upto: ts("2022-04-30T00:00:00"),
                granularity: Granularity::Hour,
            })
            .unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.bucket_key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "2022-02-28T23",
                "2022-03-01T00",
                "2022-03-01T05",
                "2022-03-31T23",
                "2022-04-01T00"
            ]
        );
        assert_eq!(rows[1].total, 3.0);
    }

    #[test]
    fn test_empty_range() {
        let store = sample_store();
        let rows = store
            .aggregate(&RangeQuery {
                from: ts("2023-01-01T00:00:00"),
                upto: ts("2023-12-31T00:00:00"),
                granularity: Granularity::Day,
            })
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_span_and_count() {
        let store = sample_store();
        assert_eq!(store.count(), 6);
        assert_eq!(
            store.span(),
            Some((ts("2022-02-28T23:59:59"), ts("2022-04-01T00:00:00")))
        );
        assert_eq!(MemoryEventStore::new().span(), None);
    }
}
