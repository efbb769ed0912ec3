//! Generic grouping primitives.
//!
//! Every function here takes a slice of records plus closures that pick the
//! group key and the measured value, so the named dashboard views in
//! `views` stay one-liners. Measures accumulate in `Decimal`, which keeps
//! currency sums exact regardless of how many line items are added; a sum
//! that leaves the `Decimal` range is a `Numeric` error.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use rust_decimal::Decimal;

use crate::domain::{AggregateRow, Measure, Order, SortBy, checked_sum};
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: Decimal,
    count: u64,
}

/// Group `records` by `key_fn` and reduce `value_fn` with `measure`.
///
/// Rows come back ascending by key. Every record lands in exactly one group.
pub fn group_aggregate<R, K, FK, FV>(
    records: &[R],
    key_fn: FK,
    value_fn: FV,
    measure: Measure,
) -> Result<Vec<AggregateRow<K>>, PipelineError>
where
    K: Ord,
    FK: Fn(&R) -> K,
    FV: Fn(&R) -> Result<Decimal, PipelineError>,
{
    let mut groups: BTreeMap<K, Accumulator> = BTreeMap::new();
    for record in records {
        let value = value_fn(record)?;
        let acc = groups.entry(key_fn(record)).or_default();
        acc.sum = checked_sum(acc.sum, value)?;
        acc.count += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(key, acc)| {
            let value = match measure {
                Measure::Sum => acc.sum,
                Measure::Count => Decimal::from(acc.count),
                // Groups only exist once a record was added, so count >= 1
                // and the quotient is no larger than the sum.
                Measure::Mean => acc.sum / Decimal::from(acc.count),
            };
            AggregateRow::new(key, value)
        })
        .collect())
}

/// Sum `measure_fn` per group, ascending by key.
pub fn group_sum<R, K, FK, FM>(records: &[R], key_fn: FK, measure_fn: FM) -> Result<Vec<AggregateRow<K>>, PipelineError>
where
    K: Ord,
    FK: Fn(&R) -> K,
    FM: Fn(&R) -> Result<Decimal, PipelineError>,
{
    group_aggregate(records, key_fn, measure_fn, Measure::Sum)
}

/// Number of distinct non-null values of `distinct_fn` across `records`.
pub fn count_distinct<'a, R, V, FD>(records: &'a [R], distinct_fn: FD) -> usize
where
    V: Eq + Hash,
    FD: Fn(&'a R) -> Option<V>,
{
    records.iter().filter_map(distinct_fn).collect::<HashSet<V>>().len()
}

/// Number of distinct non-null values of `distinct_fn` within each group.
pub fn group_count_distinct<'a, R, K, V, FK, FD>(
    records: &'a [R],
    key_fn: FK,
    distinct_fn: FD,
) -> Vec<AggregateRow<K>>
where
    K: Ord,
    V: Eq + Hash,
    FK: Fn(&'a R) -> K,
    FD: Fn(&'a R) -> Option<V>,
{
    let mut groups: BTreeMap<K, HashSet<V>> = BTreeMap::new();
    for record in records {
        let seen = groups.entry(key_fn(record)).or_default();
        if let Some(value) = distinct_fn(record) {
            seen.insert(value);
        }
    }

    groups
        .into_iter()
        .map(|(key, seen)| AggregateRow::new(key, Decimal::from(seen.len())))
        .collect()
}

/// Stable sort of aggregate rows.
pub fn sort_rows<K: Ord>(rows: &mut [AggregateRow<K>], by: SortBy, order: Order) {
    rows.sort_by(|a, b| {
        let ord = match by {
            SortBy::Key => a.key.cmp(&b.key),
            SortBy::Measure => a.measure.cmp(&b.measure),
        };
        match order {
            Order::Ascending => ord,
            Order::Descending => ord.reverse(),
        }
    });
}

/// The first `n` rows after a stable sort; ties keep their incoming order.
pub fn top_n<K: Ord>(mut rows: Vec<AggregateRow<K>>, n: usize, by: SortBy, order: Order) -> Vec<AggregateRow<K>> {
    sort_rows(&mut rows, by, order);
    rows.truncate(n);
    rows
}

/// The `n` largest rows by measure, returned in ascending order.
pub fn largest_ascending<K: Ord>(mut rows: Vec<AggregateRow<K>>, n: usize) -> Vec<AggregateRow<K>> {
    sort_rows(&mut rows, SortBy::Measure, Order::Ascending);
    let skip = rows.len().saturating_sub(n);
    rows.split_off(skip)
}

/// Sum of measures, for total-invariant checks and footers.
pub fn total<K>(rows: &[AggregateRow<K>]) -> Result<Decimal, PipelineError> {
    rows.iter().try_fold(Decimal::ZERO, |acc, r| checked_sum(acc, r.measure))
}

/// Row with the largest measure (first one wins on ties).
pub fn max_row<K>(rows: &[AggregateRow<K>]) -> Option<&AggregateRow<K>> {
    rows.iter().fold(None, |best: Option<&AggregateRow<K>>, row| match best {
        Some(b) if b.measure.cmp(&row.measure) != Ordering::Less => Some(b),
        _ => Some(row),
    })
}
