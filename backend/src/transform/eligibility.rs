//! Applications ready for review.
//!
//! The queue is every pending application; the signed filter narrows what
//! is shown, while the signed tally always covers the whole queue.

use serde::Serialize;

use super::primitives::{filter, filter_by, group_count, Predicate};
use crate::models::{Column, Dataset, SignedFilter};

/// Status value that puts an application in the review queue.
pub const PENDING_STATUS: &str = "Pending";

/// Definitively signed vs unsigned applications in the queue.
///
/// Any other value of `Application Signed?` (including the literal
/// `"Missing"`) is left out of this tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignedCounts {
    pub yes: usize,
    pub no: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityView {
    pub signed_filter: SignedFilter,
    pub full_queue: Dataset,
    pub filtered_queue: Dataset,
    pub signed_counts: SignedCounts,
}

pub fn build(dataset: &Dataset, signed: SignedFilter) -> EligibilityView {
    let full_queue = filter_by(dataset, &Predicate::equals(Column::RequestStatus, PENDING_STATUS));

    let filtered_queue = match signed {
        SignedFilter::All => full_queue.clone(),
        other => filter(&full_queue, |r| other.matches(r)),
    };

    let mut signed_counts = SignedCounts::default();
    for (value, count) in group_count(&full_queue, |r| r.application_signed.clone()) {
        match value.as_deref() {
            Some("Yes") => signed_counts.yes = count,
            Some("No") => signed_counts.no = count,
            _ => {}
        }
    }

    EligibilityView {
        signed_filter: signed,
        full_queue,
        filtered_queue,
        signed_counts,
    }
}
