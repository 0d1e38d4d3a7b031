//! Support given by demographics: total amount per value of one field.

use serde::Serialize;

use super::primitives::group_sum;
use crate::models::{Dataset, DemographicField, Money};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicRow {
    /// `None` collects the rows where the field is missing.
    pub value: Option<String>,
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicsView {
    pub field: DemographicField,
    pub rows: Vec<DemographicRow>,
}

impl DemographicsView {
    pub fn total(&self) -> Money {
        self.rows.iter().map(|r| r.total_amount).sum()
    }
}

pub fn build(dataset: &Dataset, field: DemographicField) -> DemographicsView {
    let rows = group_sum(dataset, |r| field.value(r).map(String::from), |r| r.amount)
        .into_iter()
        .map(|(value, total_amount)| DemographicRow { value, total_amount })
        .collect();

    DemographicsView { field, rows }
}
