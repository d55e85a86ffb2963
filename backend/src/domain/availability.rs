//! Per-listing availability index arithmetic.
//!
//! The index is the denormalised year → month → day map each listing carries
//! so clients can grey out booked days without scanning booking records.
//! Month keys are zero-based, matching the shape existing clients consume.
//! Both operations are pure: they take the index by reference and return a
//! fresh value, never mutating their inputs.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Days booked within one calendar month, keyed by day of month (1-based).
pub type MonthIndex = BTreeMap<u32, bool>;

/// Months containing at least one booked day, keyed by zero-based month.
pub type YearIndex = BTreeMap<u32, MonthIndex>;

/// Booked days for a listing, keyed by calendar year.
pub type BookingsIndex = BTreeMap<i32, YearIndex>;

/// Mark every day of the inclusive `[check_in, check_out]` range as booked.
///
/// Walks the range one calendar day at a time; month and year rollovers fall
/// out of the calendar arithmetic. Days already marked stay marked, so
/// re-extending over an overlapping range is idempotent. A reversed range
/// produces no new entries rather than an error; ordering is the caller's
/// validation concern.
pub fn extend_index(
    existing: &BookingsIndex,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> BookingsIndex {
    let mut index = existing.clone();
    let mut cursor = check_in;
    while cursor <= check_out {
        index
            .entry(cursor.year())
            .or_default()
            .entry(cursor.month0())
            .or_default()
            .entry(cursor.day())
            .or_insert(true);
        match cursor.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    index
}

/// Deep union of two indexes.
///
/// Used when folding a computed contribution into the freshest stored index:
/// every day marked in either input is marked in the result, so a concurrent
/// writer's days are never lost.
pub fn merge_index(current: &BookingsIndex, contribution: &BookingsIndex) -> BookingsIndex {
    let mut merged = current.clone();
    for (year, months) in contribution {
        let year_entry = merged.entry(*year).or_default();
        for (month, days) in months {
            let month_entry = year_entry.entry(*month).or_default();
            for day in days.keys() {
                month_entry.entry(*day).or_insert(true);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn marked_days(index: &BookingsIndex) -> Vec<(i32, u32, u32)> {
        let mut days = Vec::new();
        for (year, months) in index {
            for (month, leaf) in months {
                for (day, booked) in leaf {
                    if *booked {
                        days.push((*year, *month, *day));
                    }
                }
            }
        }
        days
    }

    #[test]
    fn single_day_range_marks_exactly_one_day() {
        let index = extend_index(&BookingsIndex::new(), date(2026, 3, 14), date(2026, 3, 14));
        assert_eq!(marked_days(&index), vec![(2026, 2, 14)]);
    }

    #[test]
    fn month_keys_are_zero_based() {
        let index = extend_index(&BookingsIndex::new(), date(2026, 1, 1), date(2026, 1, 1));
        assert_eq!(marked_days(&index), vec![(2026, 0, 1)]);
    }

    #[test]
    fn range_spanning_a_month_boundary_splits_across_months() {
        let index = extend_index(&BookingsIndex::new(), date(2026, 1, 30), date(2026, 2, 2));
        assert_eq!(
            marked_days(&index),
            vec![(2026, 0, 30), (2026, 0, 31), (2026, 1, 1), (2026, 1, 2)]
        );
    }

    #[test]
    fn range_spanning_a_year_boundary_splits_across_years() {
        let index = extend_index(&BookingsIndex::new(), date(2026, 12, 30), date(2027, 1, 2));
        assert_eq!(
            marked_days(&index),
            vec![(2026, 11, 30), (2026, 11, 31), (2027, 0, 1), (2027, 0, 2)]
        );
    }

    #[test]
    fn reversed_range_adds_nothing() {
        let existing = extend_index(&BookingsIndex::new(), date(2026, 5, 1), date(2026, 5, 3));
        let index = extend_index(&existing, date(2026, 6, 10), date(2026, 6, 1));
        assert_eq!(index, existing);
    }

    #[test]
    fn output_is_a_superset_of_the_input() {
        let existing = extend_index(&BookingsIndex::new(), date(2026, 5, 1), date(2026, 5, 3));
        let extended = extend_index(&existing, date(2026, 5, 3), date(2026, 5, 6));
        for (year, month, day) in marked_days(&existing) {
            assert_eq!(
                extended
                    .get(&year)
                    .and_then(|months| months.get(&month))
                    .and_then(|days| days.get(&day)),
                Some(&true),
                "day {year}-{month}-{day} disappeared",
            );
        }
        assert_eq!(marked_days(&extended).len(), 6);
    }

    #[test]
    fn extending_does_not_mutate_the_input() {
        let existing = extend_index(&BookingsIndex::new(), date(2026, 5, 1), date(2026, 5, 2));
        let snapshot = existing.clone();
        let _ = extend_index(&existing, date(2026, 5, 2), date(2026, 5, 9));
        assert_eq!(existing, snapshot);
    }

    #[rstest]
    #[case(date(2026, 2, 26), date(2026, 3, 2), 5)] // February rollover
    #[case(date(2028, 2, 28), date(2028, 3, 1), 3)] // leap-year February
    #[case(date(2026, 7, 1), date(2026, 7, 31), 31)] // full month
    fn day_counts_cover_the_inclusive_range(
        #[case] check_in: NaiveDate,
        #[case] check_out: NaiveDate,
        #[case] expected: usize,
    ) {
        let index = extend_index(&BookingsIndex::new(), check_in, check_out);
        assert_eq!(marked_days(&index).len(), expected);
    }

    #[test]
    fn merge_unions_disjoint_contributions() {
        let left = extend_index(&BookingsIndex::new(), date(2026, 5, 1), date(2026, 5, 2));
        let right = extend_index(&BookingsIndex::new(), date(2026, 9, 10), date(2026, 9, 11));
        let merged = merge_index(&left, &right);
        assert_eq!(
            marked_days(&merged),
            vec![(2026, 4, 1), (2026, 4, 2), (2026, 8, 10), (2026, 8, 11)]
        );
    }

    #[test]
    fn merge_output_is_a_superset_of_both_inputs() {
        let left = extend_index(&BookingsIndex::new(), date(2026, 5, 1), date(2026, 5, 4));
        let right = extend_index(&BookingsIndex::new(), date(2026, 5, 3), date(2026, 5, 7));
        let merged = merge_index(&left, &right);
        for source in [&left, &right] {
            for (year, month, day) in marked_days(source) {
                assert_eq!(
                    merged
                        .get(&year)
                        .and_then(|months| months.get(&month))
                        .and_then(|days| days.get(&day)),
                    Some(&true),
                );
            }
        }
        assert_eq!(marked_days(&merged).len(), 7);
    }

    #[test]
    fn index_serialises_with_string_keys() {
        let index = extend_index(&BookingsIndex::new(), date(2026, 1, 5), date(2026, 1, 5));
        let json = serde_json::to_value(&index).expect("index serialises");
        assert_eq!(json, serde_json::json!({ "2026": { "0": { "5": true } } }));
    }
}
