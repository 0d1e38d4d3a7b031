//! View selection and the load-then-build pipeline.
//!
//! [`build_view`] is the pure entry point: pick one of the five views and
//! run its builder over an already-loaded dataset. [`report_file`] and
//! [`report_bytes`] load the table first and wrap the result for a
//! presentation layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use grantview::config::LoadOptions;
//! use grantview::transform::pipeline::{report_file, ViewRequest};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let response = report_file(
//!         Path::new("cleaned_data.csv"),
//!         &ViewRequest::Impact,
//!         &LoadOptions::default(),
//!     )?;
//!
//!     println!("{}", response.bundle.render_text());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::demographics::DemographicsView;
use super::eligibility::EligibilityView;
use super::impact::ImpactReport;
use super::processing::ProcessingView;
use super::utilization::UtilizationView;
use super::{demographics, eligibility, impact, processing, utilization};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::api::types::ViewResponse;
use crate::config::{LoadOptions, HISTOGRAM_BINS};
use crate::error::PipelineResult;
use crate::models::{Dataset, DemographicField, SignedFilter};
use crate::parser::{load_bytes, load_file, LoadResult};

/// The five dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Eligibility,
    Demographics,
    ProcessingTime,
    Utilization,
    Impact,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Eligibility,
        View::Demographics,
        View::ProcessingTime,
        View::Utilization,
        View::Impact,
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::Eligibility => "Applications Ready for Review",
            View::Demographics => "Support Given by Demographics",
            View::ProcessingTime => "Processing Time Analysis",
            View::Utilization => "Grant Utilization Analysis",
            View::Impact => "Foundation Impact & Progress Summary",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A view together with its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewRequest {
    Eligibility {
        #[serde(default)]
        signed: SignedFilter,
    },
    Demographics {
        field: DemographicField,
    },
    ProcessingTime,
    Utilization,
    Impact,
}

impl ViewRequest {
    pub fn view(&self) -> View {
        match self {
            ViewRequest::Eligibility { .. } => View::Eligibility,
            ViewRequest::Demographics { .. } => View::Demographics,
            ViewRequest::ProcessingTime => View::ProcessingTime,
            ViewRequest::Utilization => View::Utilization,
            ViewRequest::Impact => View::Impact,
        }
    }
}

/// Output of one builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewResult {
    Eligibility(EligibilityView),
    Demographics(DemographicsView),
    ProcessingTime(ProcessingView),
    Utilization(UtilizationView),
    Impact(ImpactReport),
}

impl ViewResult {
    pub fn view(&self) -> View {
        match self {
            ViewResult::Eligibility(_) => View::Eligibility,
            ViewResult::Demographics(_) => View::Demographics,
            ViewResult::ProcessingTime(_) => View::ProcessingTime,
            ViewResult::Utilization(_) => View::Utilization,
            ViewResult::Impact(_) => View::Impact,
        }
    }
}

/// Run the builder selected by `request`.
pub fn build_view(dataset: &Dataset, request: &ViewRequest) -> ViewResult {
    match *request {
        ViewRequest::Eligibility { signed } => {
            ViewResult::Eligibility(eligibility::build(dataset, signed))
        }
        ViewRequest::Demographics { field } => {
            ViewResult::Demographics(demographics::build(dataset, field))
        }
        ViewRequest::ProcessingTime => {
            ViewResult::ProcessingTime(processing::build(dataset, HISTOGRAM_BINS))
        }
        ViewRequest::Utilization => ViewResult::Utilization(utilization::build(dataset)),
        ViewRequest::Impact => ViewResult::Impact(impact::build(dataset)),
    }
}

/// Load a CSV file and build one view from it.
pub fn report_file(
    path: &Path,
    request: &ViewRequest,
    options: &LoadOptions,
) -> PipelineResult<ViewResponse> {
    let loaded = load_file(path, options)?;
    Ok(report_loaded(&loaded, request))
}

/// Same as [`report_file`] for content already in memory.
pub fn report_bytes(
    bytes: &[u8],
    request: &ViewRequest,
    options: &LoadOptions,
) -> PipelineResult<ViewResponse> {
    let loaded = load_bytes(bytes, options)?;
    Ok(report_loaded(&loaded, request))
}

fn report_loaded(loaded: &LoadResult, request: &ViewRequest) -> ViewResponse {
    log_info(format!("📊 Building \"{}\"...", request.view().title()));
    let result = build_view(&loaded.dataset, request);

    if let ViewResult::ProcessingTime(view) = &result {
        if view.dropped > 0 {
            log_warning(format!(
                "{} rows without a request date or payment status left out",
                view.dropped
            ));
        }
    }

    let response = ViewResponse::from(result);
    let unavailable = response.bundle.unavailable_count();
    if unavailable > 0 {
        log_warning(format!("{} metric(s) unavailable for this data", unavailable));
    } else {
        log_success("View ready");
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::logs::LOG_BROADCASTER;
    use crate::models::{ApplicationRecord, Column, Money};

    fn sample() -> Dataset {
        Dataset::new(vec![
            ApplicationRecord {
                patient_id: Some("1".into()),
                request_status: Some("Pending".into()),
                amount: Some(Money::from_units(100)),
                remaining_balance: Some(Money::ZERO),
                ..Default::default()
            },
            ApplicationRecord {
                patient_id: Some("2".into()),
                request_status: Some("Approved".into()),
                amount: Some(Money::from_units(50)),
                remaining_balance: Some(Money::from_units(10)),
                ..Default::default()
            },
        ])
    }

    fn csv_content() -> String {
        let headers: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
        let mut content = headers.join(",");
        content.push('\n');
        for (id, amount, balance) in [("1", "100", "0"), ("2", "50", "10")] {
            let cells: Vec<&str> = Column::ALL
                .iter()
                .map(|c| match c {
                    Column::PatientId => id,
                    Column::Amount => amount,
                    Column::RemainingBalance => balance,
                    Column::AssistanceType => "A",
                    Column::ProcessingTimeDays => "3",
                    _ => "",
                })
                .collect();
            content.push_str(&cells.join(","));
            content.push('\n');
        }
        content
    }

    #[test]
    fn test_build_view_dispatch() {
        let dataset = sample();
        for request in [
            ViewRequest::Eligibility { signed: SignedFilter::All },
            ViewRequest::Demographics { field: DemographicField::Gender },
            ViewRequest::ProcessingTime,
            ViewRequest::Utilization,
            ViewRequest::Impact,
        ] {
            assert_eq!(build_view(&dataset, &request).view(), request.view());
        }
    }

    #[test]
    fn test_build_view_is_idempotent() {
        let dataset = sample();
        for view in View::ALL {
            let request = match view {
                View::Eligibility => ViewRequest::Eligibility { signed: SignedFilter::Yes },
                View::Demographics => ViewRequest::Demographics { field: DemographicField::Race },
                View::ProcessingTime => ViewRequest::ProcessingTime,
                View::Utilization => ViewRequest::Utilization,
                View::Impact => ViewRequest::Impact,
            };
            assert_eq!(build_view(&dataset, &request), build_view(&dataset, &request));
        }
    }

    #[test]
    fn test_request_deserialization() {
        let request: ViewRequest =
            serde_json::from_str(r#"{"view":"demographics","field":"gender"}"#).unwrap();
        assert_eq!(request, ViewRequest::Demographics { field: DemographicField::Gender });

        let request: ViewRequest = serde_json::from_str(r#"{"view":"eligibility"}"#).unwrap();
        assert_eq!(request, ViewRequest::Eligibility { signed: SignedFilter::All });
    }

    #[test]
    fn test_view_titles() {
        assert_eq!(View::Impact.to_string(), "Foundation Impact & Progress Summary");
        assert_eq!(ViewRequest::ProcessingTime.view().title(), "Processing Time Analysis");
    }

    #[test]
    fn test_report_bytes_end_to_end() {
        LOG_BROADCASTER.set_echo(false);
        let response =
            report_bytes(csv_content().as_bytes(), &ViewRequest::Impact, &LoadOptions::default())
                .unwrap();

        assert_eq!(response.view, View::Impact);
        assert_eq!(response.status, "ready");
        assert_eq!(
            response.bundle.scalar("Grant Utilization Rate").unwrap().text,
            "50.00% of patients fully used their grant."
        );
        match response.result {
            ViewResult::Impact(report) => assert_eq!(report.total_patients, 2),
            other => panic!("unexpected view {:?}", other.view()),
        }
    }

    #[test]
    fn test_report_file_missing_file() {
        LOG_BROADCASTER.set_echo(false);
        let result = report_file(
            Path::new("/nonexistent/cleaned_data.csv"),
            &ViewRequest::Utilization,
            &LoadOptions::default(),
        );
        assert!(result.is_err());
    }
}
