//! Runtime configuration.
//!
//! Defaults live here as constants. The binary loads a `.env` file (if
//! present) before reading the environment, and CLI flags override both.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of equal-width bins in the processing-time histogram.
pub const HISTOGRAM_BINS: usize = 20;

/// Data file used when neither a flag nor the environment names one.
pub const DEFAULT_DATA_FILE: &str = "cleaned_data.csv";

/// Environment variable holding the path of the cleaned data file.
pub const DATA_PATH_ENV: &str = "GRANTVIEW_DATA";

/// Environment variable forcing the CSV delimiter.
pub const DELIMITER_ENV: &str = "GRANTVIEW_DELIMITER";

/// Environment variable forcing the file encoding.
pub const ENCODING_ENV: &str = "GRANTVIEW_ENCODING";

/// Delimiters tried during auto-detection, in priority order.
pub const CANDIDATE_DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// How the loader reads the source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Force a delimiter instead of detecting it.
    pub delimiter: Option<char>,
    /// Force an encoding instead of detecting it.
    pub encoding: Option<String>,
}

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub load: LoadOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            load: LoadOptions::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_path = non_empty(DATA_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        let delimiter = non_empty(DELIMITER_ENV).and_then(|v| parse_delimiter(&v));
        let encoding = non_empty(ENCODING_ENV).map(|v| v.trim().to_lowercase());

        Self {
            data_path,
            load: LoadOptions { delimiter, encoding },
        }
    }
}

/// Parse a delimiter setting; accepts a single character or the words `tab`
/// and `\t`.
pub fn parse_delimiter(value: &str) -> Option<char> {
    match value {
        "\\t" | "tab" | "TAB" | "\t" => Some('\t'),
        other => {
            let trimmed = other.trim();
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
    }
}
