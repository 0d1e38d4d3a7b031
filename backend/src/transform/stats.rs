//! Descriptive statistics and histogram binning.
//!
//! Statistics over zero values are not errors here: they come back as
//! [`Metric::Unavailable`] so one undefined number never blocks the rest of
//! a view. Callers that need the number get the typed error back through
//! [`Metric::value`].

use serde::Serialize;

use crate::error::{AggregateError, AggregateResult};

/// A metric that is either a number or explicitly undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric<T> {
    Available { value: T },
    Unavailable { reason: AggregateError },
}

impl<T> Metric<T> {
    pub fn available(value: T) -> Self {
        Metric::Available { value }
    }

    pub fn unavailable(reason: AggregateError) -> Self {
        Metric::Unavailable { reason }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available { .. })
    }

    /// The number, or the reason it is undefined as an error.
    pub fn value(&self) -> AggregateResult<&T> {
        match self {
            Metric::Available { value } => Ok(value),
            Metric::Unavailable { reason } => Err(*reason),
        }
    }

    pub fn into_result(self) -> AggregateResult<T> {
        match self {
            Metric::Available { value } => Ok(value),
            Metric::Unavailable { reason } => Err(reason),
        }
    }

    pub fn ok(self) -> Option<T> {
        self.into_result().ok()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Available { value } => Metric::Available { value: f(value) },
            Metric::Unavailable { reason } => Metric::Unavailable { reason },
        }
    }
}

impl<T> From<AggregateResult<T>> for Metric<T> {
    fn from(result: AggregateResult<T>) -> Self {
        match result {
            Ok(value) => Metric::Available { value },
            Err(reason) => Metric::Unavailable { reason },
        }
    }
}

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> AggregateResult<f64> {
    if values.is_empty() {
        return Err(AggregateError::EmptyGroupStatistics);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> AggregateResult<f64> {
    if values.is_empty() {
        return Err(AggregateError::EmptyGroupStatistics);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Mean, median and range of a set of whole-day durations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Metric<f64>,
    pub median: Metric<f64>,
    pub min: Metric<i64>,
    pub max: Metric<i64>,
}

impl Summary {
    pub fn of(values: &[i64]) -> Self {
        let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        let empty = || Metric::unavailable(AggregateError::EmptyGroupStatistics);

        Self {
            count: values.len(),
            mean: mean(&as_f64).into(),
            median: median(&as_f64).into(),
            min: values.iter().min().copied().map(Metric::available).unwrap_or_else(empty),
            max: values.iter().max().copied().map(Metric::available).unwrap_or_else(empty),
        }
    }
}

/// One histogram bin. `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Split the observed range into `bins` equal-width bins and count values.
///
/// A range of zero width is widened to `[v - 0.5, v + 0.5]`. Empty input or
/// zero bins gives no bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let range = hi - lo;
    let width = range / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = ((v - lo) * bins as f64 / range).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + i as f64 * width,
            upper: if i + 1 == bins { hi } else { lo + (i + 1) as f64 * width },
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_known_values() {
        let summary = Summary::of(&[2, 4, 4, 4, 6]);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, Metric::available(4.0));
        assert_eq!(summary.median, Metric::available(4.0));
        assert_eq!(summary.min, Metric::available(2));
        assert_eq!(summary.max, Metric::available(6));
    }

    #[test]
    fn test_summary_of_nothing_is_unavailable() {
        let summary = Summary::of(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean.value(), Err(AggregateError::EmptyGroupStatistics));
        assert!(!summary.median.is_available());
        assert!(!summary.min.is_available());
        assert!(!summary.max.is_available());
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[1.0, 10.0, 3.0, 4.0]), Ok(3.5));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.005_1), 2.01);
    }

    #[test]
    fn test_histogram_places_every_value() {
        let values = [2.0, 4.0, 4.0, 4.0, 6.0];
        let bins = histogram(&values, 20);

        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[10].count, 3);
        assert_eq!(bins[19].count, 1);
        assert_eq!(bins[0].lower, 2.0);
        assert_eq!(bins[19].upper, 6.0);
        assert!((bins[10].lower - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[7.0, 7.0], 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].lower, 6.5);
        assert_eq!(bins[19].upper, 7.5);
        assert_eq!(bins[10].count, 2);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], 20).is_empty());
        assert!(histogram(&[1.0], 0).is_empty());
    }

    #[test]
    fn test_metric_serialization() {
        let ok = serde_json::to_value(Metric::available(4.5)).unwrap();
        assert_eq!(ok, serde_json::json!({ "status": "available", "value": 4.5 }));

        let missing: Metric<f64> = Metric::unavailable(AggregateError::DivisionByZero);
        let json = serde_json::to_value(missing).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "unavailable", "reason": "division_by_zero" })
        );
    }

    #[test]
    fn test_metric_from_result() {
        let metric: Metric<f64> = Err(AggregateError::DivisionByZero).into();
        assert_eq!(metric.ok(), None);
        let metric: Metric<f64> = Ok(2.0).into();
        assert_eq!(metric.map(|v| v * 2.0).ok(), Some(4.0));
    }
}
