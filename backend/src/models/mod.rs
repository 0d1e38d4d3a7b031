//! Domain models for the grantview reporting engine.
//!
//! This module contains the record schema shared by every view builder:
//!
//! - [`Money`] - Fixed-point amount in cents
//! - [`Column`] - The source columns and their header text
//! - [`DemographicField`] - The 13 demographic columns a view can group by
//! - [`ApplicationRecord`] - One typed row of the source table
//! - [`Dataset`] - The immutable, ordered table handed to the builders
//! - [`SignedFilter`] - Filter choice for the eligibility queue

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

// =============================================================================
// Money
// =============================================================================

/// A monetary amount stored as whole cents.
///
/// Amounts are fixed-point so that comparisons such as "remaining balance is
/// zero" are exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole currency units, e.g. `Money::from_units(150)` is `150.00`.
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Round a floating amount to the nearest cent.
    pub fn from_f64(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Render with a currency sign and thousands separators: `$1,234.50`.
    pub fn to_currency(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}${}.{:02}", sign, group_thousands(abs / 100), abs % 100)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Error returned when text is not a monetary amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError(String);

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a monetary amount: '{}'", self.0)
    }
}

impl std::error::Error for ParseMoneyError {}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Accepts `-`, `$`, thousands separators and any number of fractional
    /// digits (rounded half away from zero to the cent).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError(s.to_string());
        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let cleaned: String = rest.chars().filter(|c| *c != ',').collect();

        let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(err());
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let units: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| err())? };
        let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|d| d >= 5);

        let mut cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths))
            .ok_or_else(err)?;
        if round_up {
            cents += 1;
        }
        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Money::from_f64)
    }
}

// =============================================================================
// Columns
// =============================================================================

/// A column of the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    PatientId,
    RequestStatus,
    ApplicationSigned,
    Amount,
    RemainingBalance,
    GrantReqDate,
    PaymentSubmitted,
    ProcessingTimeDays,
    AppYear,
    AssistanceType,
    Demographic(DemographicField),
}

impl Column {
    /// Every column the loader requires, in schema order.
    pub const ALL: [Column; 23] = [
        Column::PatientId,
        Column::RequestStatus,
        Column::ApplicationSigned,
        Column::Amount,
        Column::RemainingBalance,
        Column::GrantReqDate,
        Column::PaymentSubmitted,
        Column::ProcessingTimeDays,
        Column::AppYear,
        Column::AssistanceType,
        Column::Demographic(DemographicField::PtCity),
        Column::Demographic(DemographicField::PtState),
        Column::Demographic(DemographicField::PtZip),
        Column::Demographic(DemographicField::Language),
        Column::Demographic(DemographicField::MaritalStatus),
        Column::Demographic(DemographicField::Gender),
        Column::Demographic(DemographicField::Race),
        Column::Demographic(DemographicField::HispanicLatino),
        Column::Demographic(DemographicField::SexualOrientation),
        Column::Demographic(DemographicField::HouseholdSize),
        Column::Demographic(DemographicField::MonthlyHouseholdIncomeRange),
        Column::Demographic(DemographicField::InsuranceType),
        Column::Demographic(DemographicField::Age),
    ];

    /// Header text as it appears in the source table.
    pub fn header(self) -> &'static str {
        match self {
            Column::PatientId => "Patient ID#",
            Column::RequestStatus => "Request Status",
            Column::ApplicationSigned => "Application Signed?",
            Column::Amount => "Amount",
            Column::RemainingBalance => "Remaining Balance",
            Column::GrantReqDate => "Grant Req Date",
            Column::PaymentSubmitted => "Payment Submitted?",
            Column::ProcessingTimeDays => "Processing Time (Days)",
            Column::AppYear => "App Year",
            Column::AssistanceType => "Type of Assistance (CLASS)",
            Column::Demographic(field) => field.header(),
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        Column::ALL.into_iter().find(|c| c.header() == header)
    }

    /// Whether the column holds a number usable in comparisons.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Column::Amount | Column::RemainingBalance | Column::ProcessingTimeDays | Column::AppYear
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// The demographic columns, in the order the summary reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DemographicField {
    PtCity,
    PtState,
    PtZip,
    Language,
    MaritalStatus,
    Gender,
    Race,
    HispanicLatino,
    SexualOrientation,
    HouseholdSize,
    MonthlyHouseholdIncomeRange,
    InsuranceType,
    Age,
}

impl DemographicField {
    pub const ALL: [DemographicField; 13] = [
        DemographicField::PtCity,
        DemographicField::PtState,
        DemographicField::PtZip,
        DemographicField::Language,
        DemographicField::MaritalStatus,
        DemographicField::Gender,
        DemographicField::Race,
        DemographicField::HispanicLatino,
        DemographicField::SexualOrientation,
        DemographicField::HouseholdSize,
        DemographicField::MonthlyHouseholdIncomeRange,
        DemographicField::InsuranceType,
        DemographicField::Age,
    ];

    pub fn header(self) -> &'static str {
        match self {
            DemographicField::PtCity => "Pt City",
            DemographicField::PtState => "Pt State",
            DemographicField::PtZip => "Pt Zip",
            DemographicField::Language => "Language",
            DemographicField::MaritalStatus => "Marital Status",
            DemographicField::Gender => "Gender",
            DemographicField::Race => "Race",
            DemographicField::HispanicLatino => "Hispanic/Latino",
            DemographicField::SexualOrientation => "Sexual Orientation",
            DemographicField::HouseholdSize => "Household Size",
            DemographicField::MonthlyHouseholdIncomeRange => "Monthly Household Income Range",
            DemographicField::InsuranceType => "Insurance Type",
            DemographicField::Age => "Age",
        }
    }

    pub fn column(self) -> Column {
        Column::Demographic(self)
    }

    /// The record's value for this field.
    pub fn value(self, record: &ApplicationRecord) -> Option<&str> {
        let d = &record.demographics;
        let slot = match self {
            DemographicField::PtCity => &d.pt_city,
            DemographicField::PtState => &d.pt_state,
            DemographicField::PtZip => &d.pt_zip,
            DemographicField::Language => &d.language,
            DemographicField::MaritalStatus => &d.marital_status,
            DemographicField::Gender => &d.gender,
            DemographicField::Race => &d.race,
            DemographicField::HispanicLatino => &d.hispanic_latino,
            DemographicField::SexualOrientation => &d.sexual_orientation,
            DemographicField::HouseholdSize => &d.household_size,
            DemographicField::MonthlyHouseholdIncomeRange => &d.monthly_household_income_range,
            DemographicField::InsuranceType => &d.insurance_type,
            DemographicField::Age => &d.age,
        };
        slot.as_deref()
    }

    pub(crate) fn slot_mut(self, demographics: &mut Demographics) -> &mut Option<String> {
        match self {
            DemographicField::PtCity => &mut demographics.pt_city,
            DemographicField::PtState => &mut demographics.pt_state,
            DemographicField::PtZip => &mut demographics.pt_zip,
            DemographicField::Language => &mut demographics.language,
            DemographicField::MaritalStatus => &mut demographics.marital_status,
            DemographicField::Gender => &mut demographics.gender,
            DemographicField::Race => &mut demographics.race,
            DemographicField::HispanicLatino => &mut demographics.hispanic_latino,
            DemographicField::SexualOrientation => &mut demographics.sexual_orientation,
            DemographicField::HouseholdSize => &mut demographics.household_size,
            DemographicField::MonthlyHouseholdIncomeRange => {
                &mut demographics.monthly_household_income_range
            }
            DemographicField::InsuranceType => &mut demographics.insurance_type,
            DemographicField::Age => &mut demographics.age,
        }
    }
}

impl fmt::Display for DemographicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// =============================================================================
// Application Record
// =============================================================================

/// Demographic attributes of the patient on a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub pt_city: Option<String>,
    pub pt_state: Option<String>,
    pub pt_zip: Option<String>,
    pub language: Option<String>,
    pub marital_status: Option<String>,
    pub gender: Option<String>,
    pub race: Option<String>,
    pub hispanic_latino: Option<String>,
    pub sexual_orientation: Option<String>,
    pub household_size: Option<String>,
    pub monthly_household_income_range: Option<String>,
    pub insurance_type: Option<String>,
    pub age: Option<String>,
}

/// One grant-application row.
///
/// `None` marks a missing cell; no field is assumed present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub patient_id: Option<String>,
    pub request_status: Option<String>,
    pub application_signed: Option<String>,
    pub amount: Option<Money>,
    pub remaining_balance: Option<Money>,
    pub grant_req_date: Option<NaiveDate>,
    pub payment_submitted: Option<String>,
    pub processing_time_days: Option<i64>,
    pub app_year: Option<i32>,
    pub assistance_type: Option<String>,
    #[serde(flatten)]
    pub demographics: Demographics,
}

impl ApplicationRecord {
    pub fn is_missing(&self, column: Column) -> bool {
        match column {
            Column::PatientId => self.patient_id.is_none(),
            Column::RequestStatus => self.request_status.is_none(),
            Column::ApplicationSigned => self.application_signed.is_none(),
            Column::Amount => self.amount.is_none(),
            Column::RemainingBalance => self.remaining_balance.is_none(),
            Column::GrantReqDate => self.grant_req_date.is_none(),
            Column::PaymentSubmitted => self.payment_submitted.is_none(),
            Column::ProcessingTimeDays => self.processing_time_days.is_none(),
            Column::AppYear => self.app_year.is_none(),
            Column::AssistanceType => self.assistance_type.is_none(),
            Column::Demographic(field) => field.value(self).is_none(),
        }
    }

    /// Text rendering of a cell, `None` when missing.
    pub fn display(&self, column: Column) -> Option<String> {
        match column {
            Column::PatientId => self.patient_id.clone(),
            Column::RequestStatus => self.request_status.clone(),
            Column::ApplicationSigned => self.application_signed.clone(),
            Column::Amount => self.amount.map(|m| m.to_string()),
            Column::RemainingBalance => self.remaining_balance.map(|m| m.to_string()),
            Column::GrantReqDate => self.grant_req_date.map(|d| d.format("%Y-%m-%d").to_string()),
            Column::PaymentSubmitted => self.payment_submitted.clone(),
            Column::ProcessingTimeDays => self.processing_time_days.map(|d| d.to_string()),
            Column::AppYear => self.app_year.map(|y| y.to_string()),
            Column::AssistanceType => self.assistance_type.clone(),
            Column::Demographic(field) => field.value(self).map(String::from),
        }
    }

    /// Numeric value of a numeric column; `None` for text columns or missing cells.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Amount => self.amount.map(Money::as_f64),
            Column::RemainingBalance => self.remaining_balance.map(Money::as_f64),
            Column::ProcessingTimeDays => self.processing_time_days.map(|d| d as f64),
            Column::AppYear => self.app_year.map(f64::from),
            _ => None,
        }
    }
}

// =============================================================================
// Signed Filter
// =============================================================================

/// Which applications the eligibility queue shows by signature status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SignedFilter {
    #[default]
    All,
    Yes,
    No,
    Missing,
}

impl SignedFilter {
    pub fn label(self) -> &'static str {
        match self {
            SignedFilter::All => "All",
            SignedFilter::Yes => "Yes",
            SignedFilter::No => "No",
            SignedFilter::Missing => "Missing",
        }
    }

    /// `Missing` is a literal value written by the cleaning step, so a
    /// record with no value at all only matches `All`.
    pub fn matches(self, record: &ApplicationRecord) -> bool {
        match self {
            SignedFilter::All => true,
            other => record.application_signed.as_deref() == Some(other.label()),
        }
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// The loaded table. Builders borrow it and never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<ApplicationRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ApplicationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ApplicationRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ApplicationRecord] {
        &self.records
    }
}

impl From<Vec<ApplicationRecord>> for Dataset {
    fn from(records: Vec<ApplicationRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<ApplicationRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = ApplicationRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a ApplicationRecord;
    type IntoIter = std::slice::Iter<'a, ApplicationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
