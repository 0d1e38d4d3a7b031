//! Report building.
//!
//! This module turns a loaded [`Dataset`](crate::models::Dataset) into views:
//! - Primitives: filtering, grouping and ratios
//! - Stats: metrics, summaries and histogram binning
//! - One builder per dashboard view
//! - Pipeline: view selection and load-then-build

pub mod primitives;
pub mod stats;

pub mod demographics;
pub mod eligibility;
pub mod impact;
pub mod processing;
pub mod utilization;

pub mod pipeline;

pub use pipeline::*;
pub use primitives::*;
pub use stats::{histogram, mean, median, round2, HistogramBin, Metric, Summary};
