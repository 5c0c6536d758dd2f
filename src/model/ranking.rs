//! Shared ordering, dense ranking and offset pagination.

use std::{cmp::Ordering, collections::HashMap, hash::Hash};

use serde::Serialize;

/// A row with its dense rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: u32,
    #[serde(flatten)]
    pub row: T
}

/// Dense rank for every distinct value: one plus the number of distinct
/// values strictly greater than it. NaN values are ignored.
pub fn dense_ranks(values: impl IntoIterator<Item = f64>) -> DenseRanks {
    let mut distinct: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);

    DenseRanks { distinct }
}

/// Lookup table produced by `dense_ranks`. Distinct values, highest first.
#[derive(Debug, Clone, Default)]
pub struct DenseRanks {
    distinct: Vec<f64>
}

impl DenseRanks {
    pub fn rank_of(&self, value: f64) -> u32 {
        // Count of distinct values strictly greater than `value`
        let greater = self.distinct.partition_point(|v| v.total_cmp(&value) == Ordering::Greater);
        greater as u32 + 1
    }
}

/// Sorts `rows` by `order` (a total order including tie-breakers) and attaches
/// the dense rank of `metric` to each row.
pub fn rank_by<T>(
    mut rows: Vec<T>,
    metric: impl Fn(&T) -> f64,
    order: impl Fn(&T, &T) -> Ordering
) -> Vec<Ranked<T>> {
    rows.sort_by(|a, b| order(a, b));
    let ranks = dense_ranks(rows.iter().map(&metric));

    rows.into_iter()
        .map(|row| Ranked {
            rank: ranks.rank_of(metric(&row)),
            row
        })
        .collect()
}

/// Dense ranks keyed by id, for ranking a row against a population other than
/// the one being displayed.
pub fn rank_index<K: Eq + Hash + Clone, T>(
    rows: &[T],
    key: impl Fn(&T) -> K,
    metric: impl Fn(&T) -> f64
) -> HashMap<K, u32> {
    let ranks = dense_ranks(rows.iter().map(&metric));
    rows.iter().map(|r| (key(r), ranks.rank_of(metric(r)))).collect()
}

/// Descending comparison for scores, with NaN sorting last.
pub fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// One page of a ranked population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub offset: usize,
    pub page_size: usize,
    /// Size of the full population the page was cut from
    pub total_count: usize
}

/// Rows `[offset, offset + page_size)` of `rows`. An offset past the end
/// yields an empty page, never an error.
pub fn paginate<T: Clone>(rows: &[T], offset: usize, page_size: usize) -> Page<T> {
    let start = offset.min(rows.len());
    let end = start.saturating_add(page_size).min(rows.len());

    Page {
        rows: rows[start..end].to_vec(),
        offset,
        page_size,
        total_count: rows.len()
    }
}
