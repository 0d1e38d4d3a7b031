//! Schema checks for the loaded table.
//!
//! The builders trust the values they receive; the only thing checked is
//! that the table carries every column of the record schema. A missing
//! column means the loader produced an incompatible table, so the check
//! fails fast with [`SchemaError::SchemaViolation`] naming the first absent
//! column.
//!
//! # Example
//!
//! ```rust,ignore
//! use grantview::validation::validate_headers;
//!
//! let headers = vec!["Patient ID#".to_string(), "Amount".to_string()];
//! let err = validate_headers(&headers).unwrap_err();
//! assert!(err.to_string().contains("Request Status"));
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::models::Column;

/// Columns of the schema absent from `headers`, in schema order.
pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<Column> {
    Column::ALL
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h.as_ref().trim() == column.header()))
        .collect()
}

/// Check that every schema column is present.
pub fn validate_headers<S: AsRef<str>>(headers: &[S]) -> SchemaResult<()> {
    match missing_columns(headers).first() {
        Some(column) => Err(SchemaError::SchemaViolation {
            column: column.header().to_string(),
        }),
        None => Ok(()),
    }
}

/// Position of each schema column within `headers`.
///
/// Columns absent from `headers` are skipped, so callers run
/// [`validate_headers`] first. When a header repeats, the first occurrence
/// wins.
pub fn column_positions<S: AsRef<str>>(headers: &[S]) -> Vec<(Column, usize)> {
    Column::ALL
        .into_iter()
        .filter_map(|column| {
            headers
                .iter()
                .position(|h| h.as_ref().trim() == column.header())
                .map(|idx| (column, idx))
        })
        .collect()
}
