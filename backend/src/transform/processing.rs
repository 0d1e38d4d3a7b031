//! Processing time analysis.
//!
//! Only rows that carry both a request date and a payment-submitted value
//! take part; statistics then use the processing times present on those
//! rows. An empty cleaned set is not an error: every statistic comes back
//! unavailable and the histogram has no bins.

use chrono::NaiveDate;
use serde::Serialize;

use super::primitives::drop_nulls;
use super::stats::{histogram, HistogramBin, Summary};
use crate::models::{Column, Dataset};

/// Columns a row needs to be counted.
pub const REQUIRED_COLUMNS: [Column; 2] = [Column::GrantReqDate, Column::PaymentSubmitted];

/// Columns of the detail table.
pub const DETAIL_COLUMNS: [Column; 3] = [
    Column::GrantReqDate,
    Column::PaymentSubmitted,
    Column::ProcessingTimeDays,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingDetail {
    pub grant_req_date: Option<NaiveDate>,
    pub payment_submitted: Option<String>,
    pub processing_time_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingView {
    pub summary: Summary,
    pub bins: Vec<HistogramBin>,
    pub details: Vec<ProcessingDetail>,
    /// Rows excluded for lacking a required column.
    pub dropped: usize,
}

pub fn build(dataset: &Dataset, bins: usize) -> ProcessingView {
    let clean = drop_nulls(dataset, &REQUIRED_COLUMNS);

    let days: Vec<i64> = clean.iter().filter_map(|r| r.processing_time_days).collect();
    let as_f64: Vec<f64> = days.iter().map(|&d| d as f64).collect();

    let details = clean
        .iter()
        .map(|r| ProcessingDetail {
            grant_req_date: r.grant_req_date,
            payment_submitted: r.payment_submitted.clone(),
            processing_time_days: r.processing_time_days,
        })
        .collect();

    ProcessingView {
        summary: Summary::of(&days),
        bins: histogram(&as_f64, bins),
        details,
        dropped: dataset.len() - clean.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HISTOGRAM_BINS;
    use crate::error::AggregateError;
    use crate::models::ApplicationRecord;
    use crate::transform::stats::Metric;

    fn processed(days: Option<i64>) -> ApplicationRecord {
        ApplicationRecord {
            grant_req_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            payment_submitted: Some("Yes".into()),
            processing_time_days: days,
            ..Default::default()
        }
    }

    #[test]
    fn test_known_processing_times() {
        let dataset: Dataset = [2, 4, 4, 4, 6].into_iter().map(|d| processed(Some(d))).collect();
        let view = build(&dataset, HISTOGRAM_BINS);

        assert_eq!(view.summary.mean, Metric::available(4.0));
        assert_eq!(view.summary.median, Metric::available(4.0));
        assert_eq!(view.summary.min, Metric::available(2));
        assert_eq!(view.summary.max, Metric::available(6));
        assert_eq!(view.bins.len(), HISTOGRAM_BINS);
        assert_eq!(view.bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(view.details.len(), 5);
        assert_eq!(view.dropped, 0);
    }

    #[test]
    fn test_rows_missing_required_columns_are_dropped() {
        let dataset = Dataset::new(vec![
            processed(Some(3)),
            ApplicationRecord { payment_submitted: None, ..processed(Some(100)) },
            ApplicationRecord { grant_req_date: None, ..processed(Some(200)) },
            processed(None),
        ]);
        let view = build(&dataset, HISTOGRAM_BINS);

        assert_eq!(view.dropped, 2);
        assert_eq!(view.details.len(), 2);
        assert_eq!(view.details[1].processing_time_days, None);
        assert_eq!(view.summary.count, 1);
        assert_eq!(view.summary.max, Metric::available(3));
    }

    #[test]
    fn test_everything_dropped_is_unavailable() {
        let dataset = Dataset::new(vec![ApplicationRecord {
            processing_time_days: Some(5),
            ..Default::default()
        }]);
        let view = build(&dataset, HISTOGRAM_BINS);

        assert_eq!(view.summary.count, 0);
        assert_eq!(view.summary.mean.value(), Err(AggregateError::EmptyGroupStatistics));
        assert!(view.bins.is_empty());
        assert!(view.details.is_empty());
        assert_eq!(view.dropped, 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let dataset: Dataset = [1, 9].into_iter().map(|d| processed(Some(d))).collect();
        assert_eq!(build(&dataset, 20), build(&dataset, 20));
    }
}
