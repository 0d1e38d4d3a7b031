//! Presentation types handed to a dashboard or terminal.
//!
//! A [`ResultBundle`] flattens any view into tables, labeled scalars and
//! chart series. Scalars carry the sentence the dashboard shows, e.g.
//! `"$150.00 provided in assistance."`; an undefined metric keeps a `null`
//! value, its reason, and the text `"No data available."`.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AggregateError;
use crate::models::{ApplicationRecord, Column, Dataset, DemographicField, Money};
use crate::transform::demographics::DemographicsView;
use crate::transform::eligibility::EligibilityView;
use crate::transform::impact::ImpactReport;
use crate::transform::pipeline::{View, ViewResult};
use crate::transform::processing::{ProcessingView, DETAIL_COLUMNS};
use crate::transform::stats::{round2, Metric};
use crate::transform::utilization::UtilizationView;

/// Text shown for a metric that cannot be computed.
pub const NO_DATA_TEXT: &str = "No data available.";

/// Category label used for a missing grouping key in chart series.
pub const MISSING_LABEL: &str = "(missing)";

/// Response for one view request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready", or "partial" when some metric is unavailable
    pub status: String,

    pub view: View,

    /// Display-ready rendering
    pub bundle: ResultBundle,

    /// Typed builder output
    pub result: ViewResult,
}

impl From<ViewResult> for ViewResponse {
    fn from(result: ViewResult) -> Self {
        let bundle = ResultBundle::from(&result);
        let status = if bundle.unavailable_count() == 0 { "ready" } else { "partial" };

        ViewResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            view: result.view(),
            bundle,
            result,
        }
    }
}

/// Tables, scalars and series of one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    pub title: String,
    pub tables: Vec<Table>,
    pub scalars: Vec<Scalar>,
    pub series: Vec<Series>,
}

/// A grid; missing cells are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// One labeled metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scalar {
    pub label: String,
    pub value: Value,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AggregateError>,
}

/// Category/value pairs for a bar chart or histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(String, f64)>,
}

impl Scalar {
    pub fn new(label: impl Into<String>, value: Value, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            text: text.into(),
            reason: None,
        }
    }

    /// Scalar for a metric, rendering an available value with `text`.
    pub fn metric<T>(label: impl Into<String>, metric: &Metric<T>, text: impl FnOnce(&T) -> String) -> Self
    where
        T: Serialize,
    {
        match metric {
            Metric::Available { value } => Self::new(label, json!(value), text(value)),
            Metric::Unavailable { reason } => Self {
                label: label.into(),
                value: Value::Null,
                text: NO_DATA_TEXT.to_string(),
                reason: Some(*reason),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.reason.is_none()
    }
}

impl ResultBundle {
    fn new(view: View) -> Self {
        Self {
            title: view.title().to_string(),
            tables: Vec::new(),
            scalars: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn unavailable_count(&self) -> usize {
        self.scalars.iter().filter(|s| !s.is_available()).count()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn scalar(&self, label: &str) -> Option<&Scalar> {
        self.scalars.iter().find(|s| s.label == label)
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, "=".repeat(self.title.chars().count()));

        for scalar in &self.scalars {
            out.push_str(&format!("\n{}\n  {}\n", scalar.label, scalar.text));
        }

        for table in &self.tables {
            out.push_str(&format!("\n{} ({} rows)\n", table.name, table.rows.len()));
            out.push_str(&format!("  {}\n", table.columns.join(" | ")));
            for row in &table.rows {
                let cells: Vec<String> = row.iter().map(cell_text).collect();
                out.push_str(&format!("  {}\n", cells.join(" | ")));
            }
        }

        for series in &self.series {
            out.push_str(&format!("\n{} ({} by {})\n", series.name, series.y_label, series.x_label));
            for (category, value) in &series.points {
                out.push_str(&format!("  {}: {}\n", category, value));
            }
        }

        out
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn category(value: Option<&str>) -> String {
    value.unwrap_or(MISSING_LABEL).to_string()
}

fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| json!(v))
}

/// JSON cell for a record column; numbers stay numeric.
fn cell(record: &ApplicationRecord, column: Column) -> Value {
    match column {
        Column::Amount => record.amount.map_or(Value::Null, |m| json!(m)),
        Column::RemainingBalance => record.remaining_balance.map_or(Value::Null, |m| json!(m)),
        Column::ProcessingTimeDays => record.processing_time_days.map_or(Value::Null, |d| json!(d)),
        Column::AppYear => record.app_year.map_or(Value::Null, |y| json!(y)),
        other => text_or_null(record.display(other).as_deref()),
    }
}

fn record_table(name: &str, dataset: &Dataset, columns: &[Column]) -> Table {
    Table {
        name: name.to_string(),
        columns: columns.iter().map(|c| c.header().to_string()).collect(),
        rows: dataset
            .iter()
            .map(|r| columns.iter().map(|&c| cell(r, c)).collect())
            .collect(),
    }
}

fn days_text(label: &str, value: f64) -> String {
    format!("{}: {:.2} days", label, value)
}

// =============================================================================
// View conversions
// =============================================================================

impl From<&EligibilityView> for ResultBundle {
    fn from(view: &EligibilityView) -> Self {
        let mut bundle = ResultBundle::new(View::Eligibility);
        let pending = view.full_queue.len();

        bundle.scalars.push(Scalar::new(
            "Applications Ready for Review",
            json!(pending),
            format!("{} applications ready for review.", pending),
        ));
        bundle.scalars.push(Scalar::new(
            "Filter by Application Signed Status",
            json!(view.signed_filter.label()),
            format!(
                "{} applications shown for \"{}\".",
                view.filtered_queue.len(),
                view.signed_filter.label()
            ),
        ));

        bundle.tables.push(record_table("Applications Ready for Review", &view.full_queue, &Column::ALL));
        bundle.tables.push(record_table("Filtered Applications", &view.filtered_queue, &Column::ALL));

        bundle.series.push(Series {
            name: "Signed vs. Unsigned Applications".to_string(),
            x_label: Column::ApplicationSigned.header().to_string(),
            y_label: "Count".to_string(),
            points: vec![
                ("Yes".to_string(), view.signed_counts.yes as f64),
                ("No".to_string(), view.signed_counts.no as f64),
            ],
        });
        bundle
    }
}

impl From<&DemographicsView> for ResultBundle {
    fn from(view: &DemographicsView) -> Self {
        let mut bundle = ResultBundle::new(View::Demographics);
        let header = view.field.header();
        let name = format!("Total Support Given by {}", header);

        bundle.tables.push(Table {
            name: name.clone(),
            columns: vec![header.to_string(), Column::Amount.header().to_string()],
            rows: view
                .rows
                .iter()
                .map(|r| vec![text_or_null(r.value.as_deref()), json!(r.total_amount)])
                .collect(),
        });
        bundle.series.push(Series {
            name,
            x_label: header.to_string(),
            y_label: Column::Amount.header().to_string(),
            points: view
                .rows
                .iter()
                .map(|r| (category(r.value.as_deref()), r.total_amount.as_f64()))
                .collect(),
        });
        bundle
    }
}

impl From<&ProcessingView> for ResultBundle {
    fn from(view: &ProcessingView) -> Self {
        let mut bundle = ResultBundle::new(View::ProcessingTime);
        let summary = &view.summary;

        bundle.scalars.push(Scalar::metric("Average Processing Time", &summary.mean, |v| {
            days_text("Average Processing Time", *v)
        }));
        bundle.scalars.push(Scalar::metric("Median Processing Time", &summary.median, |v| {
            days_text("Median Processing Time", *v)
        }));
        bundle.scalars.push(Scalar::metric("Minimum Processing Time", &summary.min, |v| {
            format!("Minimum Processing Time: {} days", v)
        }));
        bundle.scalars.push(Scalar::metric("Maximum Processing Time", &summary.max, |v| {
            format!("Maximum Processing Time: {} days", v)
        }));
        bundle.scalars.push(Scalar::new(
            "Requests Excluded",
            json!(view.dropped),
            format!(
                "{} requests without a request date or payment status were excluded.",
                view.dropped
            ),
        ));

        bundle.series.push(Series {
            name: "Distribution of Processing Time".to_string(),
            x_label: Column::ProcessingTimeDays.header().to_string(),
            y_label: "Number of Requests".to_string(),
            points: view
                .bins
                .iter()
                .map(|b| (format!("{:.1}-{:.1}", b.lower, b.upper), b.count as f64))
                .collect(),
        });

        bundle.tables.push(Table {
            name: "Processing Time Per Request".to_string(),
            columns: DETAIL_COLUMNS.iter().map(|c| c.header().to_string()).collect(),
            rows: view
                .details
                .iter()
                .map(|d| {
                    vec![
                        d.grant_req_date
                            .map_or(Value::Null, |date| json!(date.format("%Y-%m-%d").to_string())),
                        text_or_null(d.payment_submitted.as_deref()),
                        d.processing_time_days.map_or(Value::Null, |days| json!(days)),
                    ]
                })
                .collect(),
        });
        bundle
    }
}

impl From<&UtilizationView> for ResultBundle {
    fn from(view: &UtilizationView) -> Self {
        let mut bundle = ResultBundle::new(View::Utilization);
        let assistance = Column::AssistanceType.header().to_string();

        bundle.tables.push(Table {
            name: "Patients Who Did Not Use Full Grant (By Application Year)".to_string(),
            columns: vec!["Application Year".to_string(), "Total Patients".to_string()],
            rows: view
                .unused_by_year
                .iter()
                .map(|y| vec![y.app_year.map_or(Value::Null, |year| json!(year)), json!(y.total_count)])
                .collect(),
        });

        bundle.tables.push(Table {
            name: "Average Amount Given by Assistance Type".to_string(),
            columns: vec![assistance.clone(), Column::Amount.header().to_string()],
            rows: view
                .avg_by_assistance_type
                .iter()
                .map(|a| {
                    vec![
                        text_or_null(a.assistance_type.as_deref()),
                        a.average_amount.ok().map_or(Value::Null, |v| json!(round2(v))),
                    ]
                })
                .collect(),
        });

        bundle.series.push(Series {
            name: "Average Grant Given by Assistance Type".to_string(),
            x_label: assistance,
            y_label: Column::Amount.header().to_string(),
            points: view
                .avg_by_assistance_type
                .iter()
                .filter_map(|a| {
                    let value = a.average_amount.ok()?;
                    Some((category(a.assistance_type.as_deref()), value))
                })
                .collect(),
        });
        bundle
    }
}

impl From<&ImpactReport> for ResultBundle {
    fn from(report: &ImpactReport) -> Self {
        let mut bundle = ResultBundle::new(View::Impact);
        let assistance = Column::AssistanceType.header().to_string();

        bundle.scalars.push(Scalar::new(
            "Total Patients Assisted",
            json!(report.total_patients),
            format!("{} patients received grants.", report.total_patients),
        ));
        bundle.scalars.push(Scalar::new(
            "Total Amount Granted",
            json!(report.total_granted),
            format!("{} provided in assistance.", report.total_granted.to_currency()),
        ));
        bundle.scalars.push(Scalar::metric("Average Grant Per Patient", &report.avg_grant_per_patient, |v| {
            format!("{} per patient on average.", Money::from_f64(*v).to_currency())
        }));
        bundle.scalars.push(Scalar::metric("Processing Efficiency", &report.avg_processing_time, |v| {
            format!("Average processing time: {:.2} days.", v)
        }));
        bundle.scalars.push(Scalar::metric("Grant Utilization Rate", &report.utilization_rate, |v| {
            format!("{:.2}% of patients fully used their grant.", v)
        }));

        bundle.tables.push(Table {
            name: "Funds Allocated by Assistance Type".to_string(),
            columns: vec![assistance.clone(), Column::Amount.header().to_string()],
            rows: report
                .assistance_summary
                .iter()
                .map(|a| vec![text_or_null(a.assistance_type.as_deref()), json!(a.total_amount)])
                .collect(),
        });

        let mut columns: Vec<String> = DemographicField::ALL.iter().map(|f| f.header().to_string()).collect();
        columns.push("count".to_string());
        bundle.tables.push(Table {
            name: "Patient Demographics".to_string(),
            columns,
            rows: report
                .demographic_summary
                .iter()
                .map(|combo| {
                    let mut row: Vec<Value> = combo.values.iter().map(|v| text_or_null(v.as_deref())).collect();
                    row.push(json!(combo.count));
                    row
                })
                .collect(),
        });

        bundle.series.push(Series {
            name: "Grant Distribution by Assistance Type".to_string(),
            x_label: assistance,
            y_label: Column::Amount.header().to_string(),
            points: report
                .assistance_summary
                .iter()
                .map(|a| (category(a.assistance_type.as_deref()), a.total_amount.as_f64()))
                .collect(),
        });
        bundle
    }
}

impl From<&ViewResult> for ResultBundle {
    fn from(result: &ViewResult) -> Self {
        match result {
            ViewResult::Eligibility(view) => view.into(),
            ViewResult::Demographics(view) => view.into(),
            ViewResult::ProcessingTime(view) => view.into(),
            ViewResult::Utilization(view) => view.into(),
            ViewResult::Impact(report) => report.into(),
        }
    }
}
