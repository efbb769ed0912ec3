//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages by reference
//! - exported to JSON/CSV
//! - rendered by the terminal report layer

use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Canonical customer identifier.
///
/// Exports often store the identifier as a float column (`17850.0`) and
/// sometimes as an integer (`17850`). Both spell the same customer, so
/// integral numeric values are normalized to their integer form before any
/// grouping happens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Normalize a raw identifier. Returns `None` for an empty value.
    pub fn canonical(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(value) = raw.parse::<Decimal>() {
            if value.fract().is_zero() {
                return Some(Self(value.trunc().normalize().to_string()));
            }
        }

        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One invoice line item.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub invoice_no: String,
    pub description: String,
    /// Units sold. Returns and cancellations show up as negative quantities.
    pub quantity: i64,
    pub unit_price: Decimal,
    pub invoice_date: NaiveDateTime,
    pub customer_id: Option<CustomerId>,
    pub country: String,
}

impl TransactionRecord {
    /// `quantity × unit_price`, exact.
    ///
    /// Fails with `Numeric` when the product leaves the `Decimal` range. The
    /// loader rejects such rows, so this only fails for hand-built records.
    pub fn line_revenue(&self) -> Result<Decimal, PipelineError> {
        Decimal::from(self.quantity).checked_mul(self.unit_price).ok_or_else(|| {
            PipelineError::Numeric(format!(
                "line revenue overflows on invoice {} ({} x {})",
                self.invoice_no, self.quantity, self.unit_price
            ))
        })
    }

    /// Calendar date of the invoice (time of day discarded).
    pub fn invoice_day(&self) -> NaiveDate {
        self.invoice_date.date()
    }
}

/// An immutable, ordered collection of transaction records.
///
/// A dataset is never edited in place: filtering builds a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<TransactionRecord>,
}

impl Dataset {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }

    /// Sum of line revenue over every record.
    pub fn total_revenue(&self) -> Result<Decimal, PipelineError> {
        self.records.iter().try_fold(Decimal::ZERO, |acc, r| checked_sum(acc, r.line_revenue()?))
    }
}

impl FromIterator<TransactionRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = TransactionRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// `a + b`, or `Numeric` when the sum leaves the `Decimal` range.
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, PipelineError> {
    a.checked_add(b)
        .ok_or_else(|| PipelineError::Numeric(format!("revenue sum overflows ({a} + {b})")))
}

/// A grouped `(key, measure)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow<K> {
    pub key: K,
    pub measure: Decimal,
}

impl<K> AggregateRow<K> {
    pub fn new(key: K, measure: Decimal) -> Self {
        Self { key, measure }
    }
}

/// Which column of an [`AggregateRow`] drives ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Key,
    Measure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Ascending,
    Descending,
}

/// How grouped values are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Sum,
    Count,
    Mean,
}

/// Origin of a [`TimePoint`]. Display hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesLabel {
    Actual,
    Predicted,
}

impl SeriesLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesLabel::Actual => "Actual",
            SeriesLabel::Predicted => "Predicted",
        }
    }
}

/// One labeled observation in the combined actual + forecast series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
    pub series: SeriesLabel,
}

/// A fitted straight line over point index → revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub slope: f64,
    pub intercept: f64,
}

impl ForecastModel {
    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Where the forecast date labels begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ForecastStart {
    /// First label is the last observed date itself.
    #[default]
    LastObserved,
    /// First label is the day after the last observed date.
    NextDay,
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Options that change which rows survive the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LoadOptions {
    /// Drop rows whose CustomerID is empty instead of keeping them with no customer.
    pub require_customer: bool,
}

/// A run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and `.env`).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    /// Countries to keep. `None` keeps the full domain.
    pub countries: Option<Vec<String>>,
    pub load: LoadOptions,
}
