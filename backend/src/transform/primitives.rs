//! Aggregation primitives shared by the view builders.
//!
//! Every primitive borrows the [`Dataset`] and returns new values; nothing
//! here mutates the table. Grouping keeps keys in the order they are first
//! seen, and a missing key (`None`) is a group of its own rather than being
//! dropped, so grouping always partitions the input.
//!
//! ```text
//! rows (dataset order)            group_sum(key, Amount)
//! ┌────────────────────┐         ┌──────────────┐
//! │ Gender: F, 10.00   │         │ F     30.00  │
//! │ Gender: F, 20.00   │   →     │ M     30.00  │
//! │ Gender: M, 30.00   │         │ None  40.00  │
//! │ Gender: -, 40.00   │         └──────────────┘
//! └────────────────────┘
//! ```

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

use super::stats::{mean, Metric};
use crate::error::{AggregateError, AggregateResult};
use crate::models::{ApplicationRecord, Column, Dataset, DemographicField, Money};

// =============================================================================
// Ordered grouping
// =============================================================================

/// Groups in discovery order.
type Groups<K, V> = IndexMap<K, V, FxBuildHasher>;

// =============================================================================
// Predicates
// =============================================================================

/// A row condition expressed against source columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Cell equals the value. Money and numeric columns compare numerically,
    /// other columns compare the exact text.
    Equals { column: Column, value: String },

    /// Numeric cell strictly greater than the value. Missing cells and text
    /// columns never match.
    GreaterThan { column: Column, value: f64 },

    /// Cell is missing.
    IsMissing { column: Column },

    /// Negation.
    Not { predicate: Box<Predicate> },

    /// Conjunction; an empty list matches every row.
    All { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn equals(column: Column, value: impl Into<String>) -> Self {
        Predicate::Equals { column, value: value.into() }
    }

    pub fn greater_than(column: Column, value: f64) -> Self {
        Predicate::GreaterThan { column, value }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All { mut predicates } => {
                predicates.push(other);
                Predicate::All { predicates }
            }
            first => Predicate::All { predicates: vec![first, other] },
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not { predicate: Box::new(self) }
    }

    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        match self {
            Predicate::Equals { column, value } => cell_equals(record, *column, value),
            Predicate::GreaterThan { column, value } => {
                record.numeric(*column).is_some_and(|cell| cell > *value)
            }
            Predicate::IsMissing { column } => record.is_missing(*column),
            Predicate::Not { predicate } => !predicate.matches(record),
            Predicate::All { predicates } => predicates.iter().all(|p| p.matches(record)),
        }
    }
}

fn cell_equals(record: &ApplicationRecord, column: Column, value: &str) -> bool {
    match column {
        Column::Amount | Column::RemainingBalance => {
            let cell = if column == Column::Amount {
                record.amount
            } else {
                record.remaining_balance
            };
            matches!((cell, value.parse::<Money>()), (Some(a), Ok(b)) if a == b)
        }
        Column::ProcessingTimeDays | Column::AppYear => {
            matches!((record.numeric(column), value.trim().parse::<f64>()), (Some(a), Ok(b)) if a == b)
        }
        _ => record.display(column).as_deref() == Some(value),
    }
}

// =============================================================================
// Primitives
// =============================================================================

/// Rows matching `predicate`, in dataset order. An empty result is valid.
pub fn filter<F>(dataset: &Dataset, predicate: F) -> Dataset
where
    F: Fn(&ApplicationRecord) -> bool,
{
    dataset.iter().filter(|r| predicate(r)).cloned().collect()
}

/// [`filter`] with a column-level [`Predicate`].
pub fn filter_by(dataset: &Dataset, predicate: &Predicate) -> Dataset {
    filter(dataset, |r| predicate.matches(r))
}

/// Rows where none of `columns` is missing.
pub fn drop_nulls(dataset: &Dataset, columns: &[Column]) -> Dataset {
    filter(dataset, |r| columns.iter().all(|&c| !r.is_missing(c)))
}

/// Sum of `value` per distinct `key`, in discovery order.
///
/// Missing values add nothing, but their row's key still forms a group.
pub fn group_sum<K, FK, FV>(dataset: &Dataset, key: FK, value: FV) -> Vec<(K, Money)>
where
    K: Eq + Hash + Clone,
    FK: Fn(&ApplicationRecord) -> K,
    FV: Fn(&ApplicationRecord) -> Option<Money>,
{
    let mut groups: Groups<K, Money> = Groups::default();
    for record in dataset {
        let total = groups.entry(key(record)).or_insert(Money::ZERO);
        if let Some(v) = value(record) {
            *total += v;
        }
    }
    groups.into_iter().collect()
}

/// Arithmetic mean of `value` per distinct `key`, in discovery order.
///
/// A group whose values are all missing is
/// [`AggregateError::EmptyGroupStatistics`].
pub fn group_mean<K, FK, FV>(dataset: &Dataset, key: FK, value: FV) -> Vec<(K, Metric<f64>)>
where
    K: Eq + Hash + Clone,
    FK: Fn(&ApplicationRecord) -> K,
    FV: Fn(&ApplicationRecord) -> Option<f64>,
{
    let mut groups: Groups<K, Vec<f64>> = Groups::default();
    for record in dataset {
        let values = groups.entry(key(record)).or_insert_with(Vec::new);
        values.extend(value(record));
    }
    groups
        .into_iter()
        .map(|(k, values)| (k, Metric::from(mean(&values))))
        .collect()
}

/// Row count per distinct `key`, in discovery order.
pub fn group_count<K, FK>(dataset: &Dataset, key: FK) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    FK: Fn(&ApplicationRecord) -> K,
{
    let mut groups: Groups<K, usize> = Groups::default();
    for record in dataset {
        *groups.entry(key(record)).or_insert(0) += 1;
    }
    groups.into_iter().collect()
}

/// Count of rows satisfying `counted` per distinct `key`, in discovery order.
///
/// Every key seen in the dataset forms a group, so a group where no row
/// satisfies `counted` reports zero.
pub fn group_count_where<K, FK, FC>(dataset: &Dataset, key: FK, counted: FC) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    FK: Fn(&ApplicationRecord) -> K,
    FC: Fn(&ApplicationRecord) -> bool,
{
    let mut groups: Groups<K, usize> = Groups::default();
    for record in dataset {
        let count = groups.entry(key(record)).or_insert(0);
        if counted(record) {
            *count += 1;
        }
    }
    groups.into_iter().collect()
}

/// Number of distinct present values of `key`; missing values are not counted.
pub fn count_distinct<K, FK>(dataset: &Dataset, key: FK) -> usize
where
    K: Eq + Hash,
    FK: Fn(&ApplicationRecord) -> Option<K>,
{
    dataset.iter().filter_map(key).collect::<FxHashSet<K>>().len()
}

/// Count of each combination of `fields`, most frequent first.
///
/// Ties keep the order in which the combinations were first seen.
pub fn distinct_value_counts(
    dataset: &Dataset,
    fields: &[DemographicField],
) -> Vec<(Vec<Option<String>>, usize)> {
    let mut counts = group_count(dataset, |r| {
        fields
            .iter()
            .map(|f| f.value(r).map(String::from))
            .collect::<Vec<_>>()
    });
    // stable: ties stay in discovery order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// `numerator / denominator`, failing on a zero denominator.
pub fn ratio(numerator: f64, denominator: f64) -> AggregateResult<f64> {
    if denominator == 0.0 {
        return Err(AggregateError::DivisionByZero);
    }
    Ok(numerator / denominator)
}
