//! Export report rows and forecast runs.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. The JSON export carries the whole forecast run (model, headline
//! value, combined series).

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::app::pipeline::ForecastRun;
use crate::domain::{AggregateRow, TimePoint};
use crate::error::PipelineError;

fn export_error(path: &Path, err: impl Display) -> PipelineError {
    PipelineError::Export {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, PipelineError> {
    csv::Writer::from_path(path).map_err(|e| export_error(path, e))
}

/// Write `key,revenue` rows. Revenue is written exactly (no float rounding).
pub fn write_rows_csv<K: Display>(path: &Path, rows: &[AggregateRow<K>], key_header: &str) -> Result<(), PipelineError> {
    let mut wtr = csv_writer(path)?;
    wtr.write_record([key_header, "revenue"]).map_err(|e| export_error(path, e))?;
    for row in rows {
        wtr.write_record([row.key.to_string(), row.measure.normalize().to_string()])
            .map_err(|e| export_error(path, e))?;
    }
    wtr.flush().map_err(|e| export_error(path, e))?;
    log::info!("exported {} rows to '{}'", rows.len(), path.display());
    Ok(())
}

/// Write the combined series as `date,value,series`.
pub fn write_series_csv(path: &Path, series: &[TimePoint]) -> Result<(), PipelineError> {
    let mut wtr = csv_writer(path)?;
    for point in series {
        wtr.serialize(point).map_err(|e| export_error(path, e))?;
    }
    wtr.flush().map_err(|e| export_error(path, e))?;
    log::info!("exported {} series points to '{}'", series.len(), path.display());
    Ok(())
}

/// Write the forecast run as pretty JSON.
pub fn write_forecast_json(path: &Path, run: &ForecastRun) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| export_error(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, run).map_err(|e| export_error(path, e))?;
    writer.flush().map_err(|e| export_error(path, e))?;
    log::info!("exported forecast run to '{}'", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::domain::{CustomerId, ForecastModel, ForecastStart, SeriesLabel};

    fn run() -> ForecastRun {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        ForecastRun {
            horizon: 1,
            start: ForecastStart::NextDay,
            model: ForecastModel { slope: 10.0, intercept: 10.0 },
            next_day: Some(20.0),
            actual: vec![(d1, 10.0)],
            predicted: vec![(d2, 20.0)],
            series: vec![
                TimePoint { date: d1, value: 10.0, series: SeriesLabel::Actual },
                TimePoint { date: d2, value: 20.0, series: SeriesLabel::Predicted },
            ],
        }
    }

    #[test]
    fn rows_csv_has_header_and_exact_revenue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.csv");
        let rows = vec![
            AggregateRow::new(CustomerId::canonical("17850.0").unwrap(), dec!(5391.21)),
            AggregateRow::new(CustomerId::canonical("13047").unwrap(), dec!(0.10)),
        ];
        write_rows_csv(&path, &rows, "customer_id").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "customer_id,revenue\n17850,5391.21\n13047,0.1\n");
    }

    #[test]
    fn series_csv_labels_each_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_series_csv(&path, &run().series).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["date,value,series", "2024-01-01,10.0,Actual", "2024-01-02,20.0,Predicted"]);
    }

    #[test]
    fn forecast_json_round_trips_model_and_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.json");
        write_forecast_json(&path, &run()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["start"], "next-day");
        assert_eq!(value["next_day"], 20.0);
        assert_eq!(value["model"]["slope"], 10.0);
        assert_eq!(value["series"].as_array().unwrap().len(), 2);
        assert_eq!(value["series"][1]["series"], "Predicted");
        assert!(value.get("actual").is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_is_export_error_for_every_format() {
        let full = Path::new("/dev/full");
        assert!(matches!(
            write_forecast_json(full, &run()),
            Err(PipelineError::Export { .. })
        ));
        assert!(matches!(
            write_series_csv(full, &run().series),
            Err(PipelineError::Export { .. })
        ));
    }

    #[test]
    fn unwritable_path_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(matches!(
            write_series_csv(&path, &run().series),
            Err(PipelineError::Export { .. })
        ));
    }
}
