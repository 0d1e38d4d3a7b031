//! Foundation impact and progress summary.
//!
//! Patient-based ratios are undefined for a dataset without patients. They
//! are returned as unavailable metrics; [`Metric::value`] hands the caller
//! [`AggregateError::DivisionByZero`](crate::error::AggregateError).

use serde::Serialize;

use super::primitives::{count_distinct, distinct_value_counts, group_sum, ratio};
use super::stats::{mean, Metric};
use crate::models::{Dataset, DemographicField, Money};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistanceTotal {
    pub assistance_type: Option<String>,
    pub total_amount: Money,
}

/// One combination of the 13 demographic values and how many rows carry it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicCombination {
    pub values: Vec<Option<String>>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub total_patients: usize,
    pub total_granted: Money,
    pub avg_grant_per_patient: Metric<f64>,
    pub avg_processing_time: Metric<f64>,
    pub assistance_summary: Vec<AssistanceTotal>,
    pub fully_used_count: usize,
    /// Percentage of patients whose remaining balance is exactly zero.
    pub utilization_rate: Metric<f64>,
    pub demographic_summary: Vec<DemographicCombination>,
}

pub fn build(dataset: &Dataset) -> ImpactReport {
    let total_patients = count_distinct(dataset, |r| r.patient_id.clone());
    let total_granted: Money = dataset.iter().filter_map(|r| r.amount).sum();

    let avg_grant_per_patient: Metric<f64> = ratio(total_granted.as_f64(), total_patients as f64).into();

    let days: Vec<f64> = dataset
        .iter()
        .filter_map(|r| r.processing_time_days)
        .map(|d| d as f64)
        .collect();

    let assistance_summary = group_sum(dataset, |r| r.assistance_type.clone(), |r| r.amount)
        .into_iter()
        .map(|(assistance_type, total_amount)| AssistanceTotal { assistance_type, total_amount })
        .collect();

    let fully_used_count = dataset
        .iter()
        .filter(|r| r.remaining_balance.is_some_and(Money::is_zero))
        .count();
    let utilization_rate = Metric::from(ratio(fully_used_count as f64, total_patients as f64))
        .map(|share| share * 100.0);

    // combinations with any missing value are not counted
    let demographic_summary = distinct_value_counts(dataset, &DemographicField::ALL)
        .into_iter()
        .filter(|(values, _)| values.iter().all(Option::is_some))
        .map(|(values, count)| DemographicCombination { values, count })
        .collect();

    ImpactReport {
        total_patients,
        total_granted,
        avg_grant_per_patient,
        avg_processing_time: mean(&days).into(),
        assistance_summary,
        fully_used_count,
        utilization_rate,
        demographic_summary,
    }
}
