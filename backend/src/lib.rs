//! # Grantview - reporting over grant-application records
//!
//! Grantview loads a cleaned table of patient grant applications and builds
//! the five dashboard views of a patient-assistance foundation: the review
//! queue, support by demographics, processing time, grant utilization and
//! the stakeholder impact summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Builders   │────▶│   Bundle    │
//! │  (ISO/UTF8) │     │  (Dataset)  │     │ (5 views)   │     │ (JSON/text) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use grantview::{build_view, load_file, LoadOptions, ViewRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loaded = load_file("cleaned_data.csv", &LoadOptions::default())?;
//!     let result = build_view(&loaded.dataset, &ViewRequest::Utilization);
//!     println!("{}", grantview::ResultBundle::from(&result).render_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Record schema (ApplicationRecord, Dataset, Money)
//! - [`config`] - Constants and environment settings
//! - [`parser`] - CSV loading with auto-detection
//! - [`validation`] - Header checks against the record schema
//! - [`transform`] - Aggregation primitives, view builders and pipeline
//! - [`api`] - Result bundles and the log stream

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Loading
pub mod parser;

// Validation
pub mod validation;

// Reports
pub mod transform;

// Presentation
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError,
    CellError,
    CsvError,
    PipelineError,
    SchemaError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ApplicationRecord,
    Column,
    Dataset,
    DemographicField,
    Demographics,
    Money,
    SignedFilter,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::{LoadOptions, Settings, HISTOGRAM_BINS};

// =============================================================================
// Re-exports - CSV Loading
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_bytes,
    load_file,
    LoadResult,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{missing_columns, validate_headers};

// =============================================================================
// Re-exports - Builders
// =============================================================================

pub use transform::demographics::DemographicsView;
pub use transform::eligibility::{EligibilityView, SignedCounts};
pub use transform::impact::ImpactReport;
pub use transform::processing::ProcessingView;
pub use transform::utilization::UtilizationView;
pub use transform::{Metric, Predicate, Summary};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_view,
    report_bytes,
    report_file,
    View,
    ViewRequest,
    ViewResult,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{ResultBundle, Scalar, Series, Table, ViewResponse};
