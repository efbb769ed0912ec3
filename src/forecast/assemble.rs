//! Merge actual and forecast series for display.

use chrono::NaiveDate;

use crate::domain::{SeriesLabel, TimePoint};

/// `actual` labeled `Actual`, then `predicted` labeled `Predicted`.
///
/// Plain concatenation: no re-sorting, and a date present in both inputs
/// appears twice.
pub fn combine(actual: &[(NaiveDate, f64)], predicted: &[(NaiveDate, f64)]) -> Vec<TimePoint> {
    let mut out = Vec::with_capacity(actual.len() + predicted.len());
    out.extend(labeled(actual, SeriesLabel::Actual));
    out.extend(labeled(predicted, SeriesLabel::Predicted));
    out
}

fn labeled(points: &[(NaiveDate, f64)], series: SeriesLabel) -> impl Iterator<Item = TimePoint> + '_ {
    points.iter().map(move |&(date, value)| TimePoint { date, value, series })
}
