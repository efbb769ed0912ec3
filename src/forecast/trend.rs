//! Index-based linear trend.
//!
//! Each observed day gets the integer index of its position in the series
//! (`0..k-1`). Missing calendar days are not filled in, so the slope is
//! "revenue per observed day", not per elapsed day. For example a series
//! with sales on Mon, Tue and Fri uses indices 0, 1, 2. A daily series holds
//! one value per date; a repeated date is rejected.
//!
//! Predictions are the fitted line evaluated at `k..k+h-1`. They are not
//! clamped, so a falling trend can forecast negative revenue.

use chrono::{Days, NaiveDate};

use crate::domain::{ForecastModel, ForecastStart};
use crate::error::PipelineError;
use crate::math::{LineFitError, fit_line};

/// A line needs two points.
pub const MIN_POINTS: usize = 2;

/// Longest projection accepted, in days (ten years).
pub const MAX_HORIZON_DAYS: usize = 3650;

impl ForecastModel {
    /// Fit a line to `values` indexed `0..values.len()`.
    pub fn fit(values: &[f64]) -> Result<Self, PipelineError> {
        if values.len() < MIN_POINTS {
            return Err(PipelineError::InsufficientData {
                required: MIN_POINTS,
                actual: values.len(),
            });
        }

        let index: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        let fit = fit_line(&index, values).map_err(|e| match e {
            LineFitError::Shape => PipelineError::InsufficientData {
                required: MIN_POINTS,
                actual: values.len(),
            },
            LineFitError::Degenerate => PipelineError::Numeric("day index has zero variance".to_string()),
            LineFitError::NonFinite => PipelineError::Numeric("non-finite value in daily series or fit".to_string()),
        })?;

        let model = ForecastModel {
            slope: fit.slope,
            intercept: fit.intercept,
        };
        log::debug!(
            "fitted trend over {} points: slope={:.6} intercept={:.6}",
            values.len(),
            model.slope,
            model.intercept
        );
        Ok(model)
    }
}

/// A fitted model plus the projected `(date, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub model: ForecastModel,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Fit a trend on `daily_series` and project it `horizon_days` forward.
pub fn fit_and_project(
    daily_series: &[(NaiveDate, f64)],
    horizon_days: usize,
    start: ForecastStart,
) -> Result<Vec<(NaiveDate, f64)>, PipelineError> {
    Ok(project(daily_series, horizon_days, start)?.points)
}

/// Like [`fit_and_project`] but also returns the fitted model.
pub fn project(
    daily_series: &[(NaiveDate, f64)],
    horizon_days: usize,
    start: ForecastStart,
) -> Result<Projection, PipelineError> {
    if horizon_days > MAX_HORIZON_DAYS {
        return Err(PipelineError::Numeric(format!(
            "forecast horizon of {horizon_days} days exceeds the maximum of {MAX_HORIZON_DAYS}"
        )));
    }

    let mut series = daily_series.to_vec();
    series.sort_by_key(|(date, _)| *date);

    if let Some(w) = series.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(PipelineError::Numeric(format!("daily series has more than one value for {}", w[0].0)));
    }
    if series.len() < MIN_POINTS {
        return Err(PipelineError::InsufficientData {
            required: MIN_POINTS,
            actual: series.len(),
        });
    }

    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let model = ForecastModel::fit(&values)?;

    // `series.len() >= 2` guarantees a last element.
    let Some(&(last_date, _)) = series.last() else {
        return Err(PipelineError::InsufficientData {
            required: MIN_POINTS,
            actual: 0,
        });
    };
    let first_offset = match start {
        ForecastStart::LastObserved => 0,
        ForecastStart::NextDay => 1,
    };

    let k = values.len();
    let points = (0..horizon_days)
        .map(|step| -> Result<(NaiveDate, f64), PipelineError> {
            let offset = (first_offset + step) as u64;
            let date = last_date.checked_add_days(Days::new(offset)).ok_or_else(|| {
                PipelineError::Numeric(format!("forecast date overflow {offset} days after {last_date}"))
            })?;
            let value = model.predict((k + step) as f64);
            if !value.is_finite() {
                return Err(PipelineError::Numeric(format!("non-finite prediction at step {step}")));
            }
            Ok((date, value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Projection { model, points })
}
