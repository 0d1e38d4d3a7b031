//! Error types for the grantview reporting engine.
//!
//! One error type per concern:
//!
//! - [`CsvError`] - loading and decoding the source table
//! - [`SchemaError`] - the loaded table does not carry the expected columns
//! - [`AggregateError`] - undefined numeric results (zero denominators, empty groups)
//! - [`PipelineError`] - top-level load-then-build orchestration
//!
//! Aggregation failures never abort a view; they travel inside
//! unavailable metrics instead.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use std::fmt;

use thiserror::Error;

// =============================================================================
// Cell Errors
// =============================================================================

/// A single cell that could not be converted to its column's type.
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl CellError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            _ => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for CellError {}

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors while reading the source table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Malformed CSV structure.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Delimiter outside the ASCII range.
    #[error("Unsupported delimiter '{0}' (must be a single ASCII character)")]
    InvalidDelimiter(char),

    /// A typed cell could not be parsed.
    #[error("Invalid cell: {0}")]
    InvalidCell(#[from] CellError),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The table handed to the builders does not match the record schema.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// A required column is absent.
    #[error("Schema violation: missing column '{column}'")]
    SchemaViolation { column: String },
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Numeric results that are undefined for the given input.
///
/// Also serialized as the reason of an unavailable metric.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateError {
    /// A ratio was requested with a zero denominator.
    #[error("Division by zero")]
    DivisionByZero,

    /// A statistic was requested over zero values.
    #[error("Statistic requested over an empty group")]
    EmptyGroupStatistics,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::transform::pipeline::report_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Schema error.
    #[error("{0}")]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for schema checks.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for aggregation primitives.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
