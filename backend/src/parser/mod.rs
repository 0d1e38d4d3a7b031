//! Dataset loader: CSV bytes to a typed [`Dataset`].
//!
//! Detects the encoding and delimiter, reads rows with the `csv` crate,
//! checks the header against the record schema, then converts every row
//! into an [`ApplicationRecord`]. The table is expected to be the output of
//! the cleaning step, so the only conversions are type conversions: empty
//! and `nan`-style cells become missing values, nothing is imputed.

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::path::Path;

use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::config::{LoadOptions, CANDIDATE_DELIMITERS};
use crate::error::{CellError, CsvError, CsvResult, PipelineResult};
use crate::models::{ApplicationRecord, Column, Dataset, Money};
use crate::validation::{column_positions, missing_columns, validate_headers};

/// Cell texts the cleaning step writes for missing values.
const MISSING_MARKERS: [&str; 6] = ["nan", "NaN", "NaT", "None", "null", "NULL"];

/// Date layouts accepted for `Grant Req Date`.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Raw table before type conversion.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Column headers, trimmed
    pub headers: Vec<String>,
    /// Data rows with their 1-based source line
    pub rows: Vec<(usize, StringRecord)>,
}

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Typed records
    pub dataset: Dataset,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => {
                let (decoded, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(CsvError::EncodingError(format!(
                        "content is not valid {}",
                        enc.name()
                    )));
                }
                Ok(decoded.into_owned())
            }
            None => Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

/// Detect the delimiter by counting occurrences in the header line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;

    for &sep in &CANDIDATE_DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read a CSV string into headers and rows.
///
/// Fully blank rows are skipped; quoted fields are honored.
pub fn read_table(content: &str, delimiter: char) -> CsvResult<RawTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let delim = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(CsvError::InvalidDelimiter(delimiter))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        // +1 for 0-index, +1 for header
        let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
        rows.push((line, record));
    }

    Ok(RawTable { headers, rows })
}

/// Convert a raw table into typed records.
///
/// Fails with a schema violation when a column is absent, or with a
/// [`CellError`] when a typed cell does not parse.
pub fn table_to_dataset(table: &RawTable) -> PipelineResult<Dataset> {
    validate_headers(&table.headers)?;
    let positions = column_positions(&table.headers);

    let records = table
        .rows
        .iter()
        .map(|(line, row)| {
            let mut record = ApplicationRecord::default();
            for &(column, idx) in &positions {
                let raw = row.get(idx).unwrap_or_default();
                if let Some(text) = normalize_cell(raw) {
                    assign(&mut record, column, text).map_err(|e| {
                        CellError::new(*line, e)
                            .with_column(column.header())
                            .with_value(raw.trim())
                    })?;
                }
            }
            Ok(record)
        })
        .collect::<Result<Vec<_>, CellError>>()
        .map_err(CsvError::from)?;

    Ok(Dataset::new(records))
}

/// Load a CSV file with auto-detection unless `options` forces a setting.
pub fn load_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> PipelineResult<LoadResult> {
    log_info(format!("📖 Reading {}...", path.as_ref().display()));
    let bytes = std::fs::read(path.as_ref()).map_err(CsvError::from)?;
    load_bytes(&bytes, options)
}

/// Load CSV bytes with auto-detection unless `options` forces a setting.
pub fn load_bytes(bytes: &[u8], options: &LoadOptions) -> PipelineResult<LoadResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile.into());
    }

    let encoding = match &options.encoding {
        Some(enc) => enc.clone(),
        None => {
            let detected = detect_encoding(bytes);
            log_success(format!("Detected encoding: {}", detected));
            detected
        }
    };
    let content = decode_content(bytes, &encoding)?;

    let delimiter = match options.delimiter {
        Some(d) => d,
        None => {
            let detected = detect_delimiter(&content);
            log_success(format!("Detected separator: '{}'", format_delimiter(detected)));
            detected
        }
    };

    let table = read_table(&content, delimiter)?;
    log_info(format!("📋 CSV has {} columns:", table.headers.len()));
    for (i, col) in table.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }
    for column in missing_columns(&table.headers) {
        log_error(format!("Missing column: {}", column.header()));
    }
    let dataset = table_to_dataset(&table)?;

    if dataset.is_empty() {
        log_warning("No data rows found");
    } else {
        log_success(format!("Loaded {} records", dataset.len()));
    }

    Ok(LoadResult {
        dataset,
        encoding,
        delimiter,
        headers: table.headers,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

// =============================================================================
// Cell conversion
// =============================================================================

fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Spreadsheet exports write integer columns with gaps as floats (`42.0`).
fn strip_integral_suffix(text: String) -> String {
    match text.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) => head.to_string(),
        _ => text,
    }
}

fn parse_integer(text: &str) -> Result<i64, String> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(n);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err("expected a whole number".to_string()),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| "expected a date (YYYY-MM-DD)".to_string())
}

fn parse_money(text: &str) -> Result<Money, String> {
    text.parse::<Money>().map_err(|_| "expected a monetary amount".to_string())
}

fn assign(record: &mut ApplicationRecord, column: Column, text: String) -> Result<(), String> {
    match column {
        Column::PatientId => record.patient_id = Some(strip_integral_suffix(text)),
        Column::RequestStatus => record.request_status = Some(text),
        Column::ApplicationSigned => record.application_signed = Some(text),
        Column::Amount => record.amount = Some(parse_money(&text)?),
        Column::RemainingBalance => record.remaining_balance = Some(parse_money(&text)?),
        Column::GrantReqDate => record.grant_req_date = Some(parse_date(&text)?),
        Column::PaymentSubmitted => record.payment_submitted = Some(text),
        Column::ProcessingTimeDays => {
            let days = parse_integer(&text)?;
            if days < 0 {
                return Err("processing time cannot be negative".to_string());
            }
            record.processing_time_days = Some(days);
        }
        Column::AppYear => {
            let year = parse_integer(&text)?;
            record.app_year = Some(i32::try_from(year).map_err(|_| "year out of range".to_string())?);
        }
        Column::AssistanceType => record.assistance_type = Some(text),
        Column::Demographic(field) => {
            *field.slot_mut(&mut record.demographics) = Some(strip_integral_suffix(text))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, SchemaError};
    use crate::models::DemographicField;
    use std::io::Write;

    fn header_line(sep: char) -> String {
        Column::ALL
            .iter()
            .map(|c| c.header())
            .collect::<Vec<_>>()
            .join(&sep.to_string())
    }

    /// Builds a full-width row; unspecified columns are empty.
    fn row(sep: char, cells: &[(Column, &str)]) -> String {
        Column::ALL
            .iter()
            .map(|c| {
                cells
                    .iter()
                    .find(|(col, _)| col == c)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(&sep.to_string())
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_read_table_quoted_and_blank_rows() {
        let csv = "name,value\n\"Smith, Jane\",\"10\"\n\n,\nBob,20\n";
        let table = read_table(csv, ',').unwrap();

        assert_eq!(table.headers, vec!["name", "value"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].1.get(0), Some("Smith, Jane"));
        assert_eq!(table.rows[1].1.get(1), Some("20"));
    }

    #[test]
    fn test_read_table_empty() {
        assert!(matches!(read_table("   \n", ','), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_read_table_rejects_non_ascii_delimiter() {
        assert!(matches!(read_table("a§b", '§'), Err(CsvError::InvalidDelimiter('§'))));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let decoded = decode_content(b"\xEF\xBB\xBFPatient ID#", "utf-8").unwrap();
        assert_eq!(decoded, "Patient ID#");
    }

    #[test]
    fn test_load_typed_records() {
        let csv = format!(
            "{}\n{}\n{}\n",
            header_line(';'),
            row(
                ';',
                &[
                    (Column::PatientId, "1001.0"),
                    (Column::RequestStatus, "Pending"),
                    (Column::ApplicationSigned, "Yes"),
                    (Column::Amount, "$1,250.50"),
                    (Column::RemainingBalance, "0"),
                    (Column::GrantReqDate, "2023-04-01"),
                    (Column::PaymentSubmitted, "2023-04-11"),
                    (Column::ProcessingTimeDays, "10.0"),
                    (Column::AppYear, "2023"),
                    (Column::AssistanceType, "Medical"),
                    (Column::Demographic(DemographicField::Gender), "F"),
                    (Column::Demographic(DemographicField::Age), "54.0"),
                ]
            ),
            row(';', &[(Column::PatientId, "1002"), (Column::Amount, "nan")]),
        );

        let result = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.dataset.len(), 2);

        let first = &result.dataset.records()[0];
        assert_eq!(first.patient_id.as_deref(), Some("1001"));
        assert_eq!(first.amount, Some(Money::from_cents(125_050)));
        assert_eq!(first.remaining_balance, Some(Money::ZERO));
        assert_eq!(first.grant_req_date, NaiveDate::from_ymd_opt(2023, 4, 1));
        assert_eq!(first.processing_time_days, Some(10));
        assert_eq!(first.app_year, Some(2023));
        assert_eq!(first.demographics.gender.as_deref(), Some("F"));
        assert_eq!(first.demographics.age.as_deref(), Some("54"));

        let second = &result.dataset.records()[1];
        assert_eq!(second.amount, None);
        assert_eq!(second.request_status, None);
    }

    #[test]
    fn test_missing_column_is_schema_violation() {
        let csv = "Patient ID#,Amount\n1,10\n";
        let err = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::SchemaViolation { ref column }) if column == "Request Status"
        ));
    }

    #[test]
    fn test_bad_cell_reports_line_and_column() {
        let csv = format!(
            "{}\n{}\n",
            header_line(','),
            row(',', &[(Column::Amount, "lots")])
        );
        let err = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        match err {
            PipelineError::Csv(CsvError::InvalidCell(cell)) => {
                assert_eq!(cell.line, 2);
                assert_eq!(cell.column.as_deref(), Some("Amount"));
                assert_eq!(cell.value.as_deref(), Some("lots"));
                assert_eq!(cell.message, "expected a monetary amount");
                assert!(cell.to_string().contains("(value 'lots')"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_cell_value_is_trimmed() {
        let csv = format!(
            "{}\n{}\n",
            header_line(','),
            row(',', &[(Column::ProcessingTimeDays, " -3 ")])
        );
        let err = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        match err {
            PipelineError::Csv(CsvError::InvalidCell(cell)) => {
                assert_eq!(cell.column.as_deref(), Some("Processing Time (Days)"));
                assert_eq!(cell.value.as_deref(), Some("-3"));
                assert_eq!(cell.message, "processing time cannot be negative");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_datetime_cells_keep_date() {
        let csv = format!(
            "{}\n{}\n",
            header_line(','),
            row(',', &[(Column::GrantReqDate, "2024-01-05 00:00:00")])
        );
        let result = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(
            result.dataset.records()[0].grant_req_date,
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_forced_delimiter() {
        let csv = format!("{}\n{}\n", header_line('|'), row('|', &[(Column::PatientId, "7")]));
        let options = LoadOptions { delimiter: Some('|'), encoding: Some("utf-8".into()) };
        let result = load_bytes(csv.as_bytes(), &options).unwrap();
        assert_eq!(result.delimiter, '|');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.dataset.records()[0].patient_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", header_line(',')).unwrap();
        writeln!(file, "{}", row(',', &[(Column::Amount, "5")])).unwrap();

        let result = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.headers.len(), Column::ALL.len());
    }

    #[test]
    fn test_empty_bytes() {
        let err = load_bytes(b"", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(CsvError::EmptyFile)));
    }
}
