// Copyright 2025 Cowboy AI, LLC.

//! Time-keyed schedules: an ordered list of `(effective time, value)` entries where the value in
//! force at `t` is the entry with the latest effective time at or before `t`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable, sorted schedule with floor lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedTransitions<V> {
    entries: Vec<(DateTime<Utc>, V)>,
}

impl<V> TimedTransitions<V> {
    /// Build a schedule from entries in any order. A later duplicate time replaces an earlier one.
    pub fn new(entries: impl IntoIterator<Item = (DateTime<Utc>, V)>) -> Self {
        let mut sorted: Vec<(DateTime<Utc>, V)> = Vec::new();
        for (at, value) in entries {
            match sorted.binary_search_by(|(t, _)| t.cmp(&at)) {
                Ok(i) => sorted[i].1 = value,
                Err(i) => sorted.insert(i, (at, value)),
            }
        }
        Self { entries: sorted }
    }

    /// A schedule with one value in force for all time
    pub fn constant(value: V) -> Self {
        Self {
            entries: vec![(DateTime::<Utc>::MIN_UTC, value)],
        }
    }

    /// Value in force at `at`, or `None` before the first entry
    pub fn value_at(&self, at: DateTime<Utc>) -> Option<&V> {
        let idx = self.entries.partition_point(|(t, _)| *t <= at);
        idx.checked_sub(1).map(|i| &self.entries[i].1)
    }

    /// Effective time of the first entry after `at`
    pub fn next_transition_after(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let idx = self.entries.partition_point(|(t, _)| *t <= at);
        self.entries.get(idx).map(|(t, _)| *t)
    }

    /// Entries in effective-time order
    pub fn entries(&self) -> &[(DateTime<Utc>, V)] {
        &self.entries
    }
}

impl<V> Default for TimedTransitions<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_floor_lookup() {
        let schedule = TimedTransitions::new(vec![(at(10), "b"), (at(1), "a"), (at(20), "c")]);
        assert_eq!(schedule.value_at(at(1)), Some(&"a"));
        assert_eq!(schedule.value_at(at(15)), Some(&"b"));
        assert_eq!(schedule.value_at(at(20)), Some(&"c"));
        assert_eq!(schedule.next_transition_after(at(10)), Some(at(20)));
        assert_eq!(schedule.next_transition_after(at(25)), None);
    }

    #[test]
    fn test_before_first_entry() {
        let schedule = TimedTransitions::new(vec![(at(10), 5)]);
        assert_eq!(schedule.value_at(at(9)), None);
        assert!(TimedTransitions::<u8>::default().value_at(at(1)).is_none());
        assert_eq!(TimedTransitions::constant(7).value_at(at(1)), Some(&7));
    }

    #[test]
    fn test_duplicate_time_replaces() {
        let schedule = TimedTransitions::new(vec![(at(3), 1), (at(3), 2)]);
        assert_eq!(schedule.entries().len(), 1);
        assert_eq!(schedule.value_at(at(3)), Some(&2));
    }

    proptest! {
        #[test]
        fn prop_lookup_matches_linear_scan(
            mut days in proptest::collection::vec(1u32..28, 1..10),
            query in 1u32..28,
        ) {
            days.sort_unstable();
            days.dedup();
            let schedule = TimedTransitions::new(days.iter().rev().map(|d| (at(*d), *d)));
            let expected = days.iter().filter(|d| **d <= query).max().copied();
            prop_assert_eq!(schedule.value_at(at(query)).copied(), expected);
        }
    }
}
