//! Grant utilization analysis.

use serde::Serialize;

use super::primitives::{filter, group_count_where, group_mean};
use super::stats::Metric;
use crate::models::{Dataset, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedYear {
    /// `None` collects the rows with no application year.
    pub app_year: Option<i32>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistanceAverage {
    pub assistance_type: Option<String>,
    pub average_amount: Metric<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationView {
    /// Grants with money left over, per year, ascending (missing year last).
    pub unused_by_year: Vec<UnusedYear>,
    /// Mean amount per assistance type over every row.
    pub avg_by_assistance_type: Vec<AssistanceAverage>,
}

pub fn build(dataset: &Dataset) -> UtilizationView {
    let unused = filter(dataset, |r| r.remaining_balance.is_some_and(Money::is_positive));

    // one count per grant with a patient ID; a year whose unused grants
    // all lack one still reports zero
    let mut unused_by_year: Vec<UnusedYear> =
        group_count_where(&unused, |r| r.app_year, |r| r.patient_id.is_some())
        .into_iter()
        .map(|(app_year, total_count)| UnusedYear { app_year, total_count })
        .collect();
    unused_by_year.sort_by_key(|y| (y.app_year.is_none(), y.app_year));

    let avg_by_assistance_type = group_mean(
        dataset,
        |r| r.assistance_type.clone(),
        |r| r.amount.map(Money::as_f64),
    )
    .into_iter()
    .map(|(assistance_type, average_amount)| AssistanceAverage { assistance_type, average_amount })
    .collect();

    UtilizationView { unused_by_year, avg_by_assistance_type }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationRecord;

    fn grant(id: Option<&str>, year: Option<i32>, remaining: i64, kind: &str, amount: i64) -> ApplicationRecord {
        ApplicationRecord {
            patient_id: id.map(String::from),
            app_year: year,
            remaining_balance: Some(Money::from_units(remaining)),
            assistance_type: Some(kind.to_string()),
            amount: Some(Money::from_units(amount)),
            ..Default::default()
        }
    }

    #[test]
    fn test_unused_by_year_sorted_with_missing_last() {
        let dataset = Dataset::new(vec![
            grant(Some("1"), Some(2024), 10, "Rent", 100),
            grant(Some("2"), None, 5, "Rent", 100),
            grant(Some("3"), Some(2022), 1, "Rent", 100),
            grant(Some("1"), Some(2024), 20, "Rent", 100),
            grant(Some("4"), Some(2023), 0, "Rent", 100),
            grant(None, Some(2022), 7, "Rent", 100),
        ]);
        let view = build(&dataset);

        assert_eq!(
            view.unused_by_year,
            vec![
                UnusedYear { app_year: Some(2022), total_count: 1 },
                UnusedYear { app_year: Some(2024), total_count: 2 },
                UnusedYear { app_year: None, total_count: 1 },
            ]
        );
    }

    #[test]
    fn test_year_without_patient_ids_reports_zero() {
        let dataset = Dataset::new(vec![
            grant(None, Some(2023), 5, "Rent", 100),
            grant(Some("1"), Some(2024), 0, "Rent", 100),
        ]);
        assert_eq!(
            build(&dataset).unused_by_year,
            vec![UnusedYear { app_year: Some(2023), total_count: 0 }]
        );
    }

    #[test]
    fn test_average_uses_full_dataset() {
        let dataset = Dataset::new(vec![
            grant(Some("1"), Some(2024), 0, "Utilities", 100),
            grant(Some("2"), Some(2024), 50, "Rent", 300),
            grant(Some("3"), Some(2024), 0, "Utilities", 200),
        ]);
        let view = build(&dataset);

        assert_eq!(view.avg_by_assistance_type.len(), 2);
        assert_eq!(view.avg_by_assistance_type[0].assistance_type.as_deref(), Some("Utilities"));
        assert_eq!(view.avg_by_assistance_type[0].average_amount, Metric::available(150.0));
        assert_eq!(view.avg_by_assistance_type[1].average_amount, Metric::available(300.0));
    }

    #[test]
    fn test_negative_and_missing_balances_are_not_unused() {
        let dataset = Dataset::new(vec![
            grant(Some("1"), Some(2024), -5, "Rent", 10),
            ApplicationRecord { remaining_balance: None, ..grant(Some("2"), Some(2024), 0, "Rent", 10) },
        ]);
        assert!(build(&dataset).unused_by_year.is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let view = build(&Dataset::default());
        assert!(view.unused_by_year.is_empty());
        assert!(view.avg_by_assistance_type.is_empty());
    }
}
