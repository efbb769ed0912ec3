//! Shared report pipeline used by every CLI subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load (memoized) -> country filter -> aggregate -> fit/project -> assemble
//!
//! The CLI can then focus on presentation (printing vs exporting).

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::aggregate::{self, CustomerStats, SummaryMetrics};
use crate::domain::{AggregateRow, CustomerId, Dataset, ForecastModel, ForecastStart, RunConfig, TimePoint};
use crate::error::PipelineError;
use crate::forecast;
use crate::io::{DatasetCache, IngestedData};

/// Result of a report that can legitimately have nothing to show.
#[derive(Debug, Clone, PartialEq)]
pub enum View<T> {
    /// The selection contains no usable records.
    Empty,
    Ready(T),
}

impl<T> View<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, View::Empty)
    }

    /// Treat the empty state as an error, for callers that need rows.
    pub fn into_result(self) -> Result<T, PipelineError> {
        match self {
            View::Empty => Err(PipelineError::EmptyResult),
            View::Ready(value) => Ok(value),
        }
    }

    fn non_empty(
        dataset: &Dataset,
        build: impl FnOnce(&Dataset) -> Result<T, PipelineError>,
    ) -> Result<Self, PipelineError> {
        if dataset.is_empty() {
            Ok(View::Empty)
        } else {
            build(dataset).map(View::Ready)
        }
    }
}

/// Dashboard page: headline metrics plus the daily revenue trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: SummaryMetrics,
    pub daily: Vec<AggregateRow<NaiveDate>>,
}

/// Customer page. Built from the customer-eligible subset only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerReport {
    pub top: Vec<AggregateRow<CustomerId>>,
    pub distribution: Vec<AggregateRow<CustomerId>>,
    pub stats: CustomerStats,
}

/// Everything a forecast request produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRun {
    pub horizon: usize,
    pub start: ForecastStart,
    pub model: ForecastModel,
    /// First predicted value (the "next day" headline). `None` when `horizon == 0`.
    pub next_day: Option<f64>,
    #[serde(skip)]
    pub actual: Vec<(NaiveDate, f64)>,
    #[serde(skip)]
    pub predicted: Vec<(NaiveDate, f64)>,
    pub series: Vec<TimePoint>,
}

/// Load the configured source through the cache.
pub fn load(cache: &mut DatasetCache, config: &RunConfig) -> Result<Arc<IngestedData>, PipelineError> {
    cache.get_or_load(&config.data_path, config.load)
}

/// Apply the country selection. `None` keeps every country.
pub fn filter(dataset: &Dataset, countries: Option<&[String]>) -> Dataset {
    crate::filter::countries(dataset, countries)
}

/// Dashboard page. Aggregation errors (revenue overflow) are `Numeric`.
pub fn dashboard(dataset: &Dataset) -> Result<View<Dashboard>, PipelineError> {
    View::non_empty(dataset, |d| {
        Ok(Dashboard {
            summary: aggregate::summary(d)?,
            daily: aggregate::daily_revenue(d)?,
        })
    })
}

pub fn products(dataset: &Dataset, top: usize) -> Result<View<Vec<AggregateRow<String>>>, PipelineError> {
    View::non_empty(dataset, |d| aggregate::top_products(d, top))
}

/// Customer page. Also `Empty` when records exist but none is customer-eligible.
pub fn customers(dataset: &Dataset, top: usize, distribution: usize) -> Result<View<CustomerReport>, PipelineError> {
    let spending = aggregate::customer_spending(dataset)?;
    let Some(stats) = aggregate::customer_stats(&spending)? else {
        return Ok(View::Empty);
    };

    Ok(View::Ready(CustomerReport {
        top: aggregate::top_spenders(spending.clone(), top),
        distribution: aggregate::largest_ascending(spending, distribution),
        stats,
    }))
}

/// Fit a trend on daily revenue and project `horizon` days.
///
/// An empty selection or a single trading day is `InsufficientData`.
pub fn forecast(dataset: &Dataset, horizon: usize, start: ForecastStart) -> Result<ForecastRun, PipelineError> {
    let actual = daily_series(dataset)?;
    let projection = forecast::project(&actual, horizon, start)?;
    let series = forecast::combine(&actual, &projection.points);

    Ok(ForecastRun {
        horizon,
        start,
        model: projection.model,
        next_day: projection.points.first().map(|(_, v)| *v),
        actual,
        predicted: projection.points,
        series,
    })
}

/// Daily revenue as `(date, f64)` pairs for the regression.
fn daily_series(dataset: &Dataset) -> Result<Vec<(NaiveDate, f64)>, PipelineError> {
    aggregate::daily_revenue(dataset)?
        .into_iter()
        .map(|row| {
            row.measure
                .to_f64()
                .map(|v| (row.key, v))
                .ok_or_else(|| PipelineError::Numeric(format!("revenue on {} does not fit in f64", row.key)))
        })
        .collect()
}
