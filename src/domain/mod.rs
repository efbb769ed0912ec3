//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - transaction records and the immutable `Dataset`
//! - aggregation outputs (`AggregateRow`) and ordering enums
//! - forecast types (`ForecastModel`, `TimePoint`, `SeriesLabel`)
//! - run configuration (`RunConfig`, `LoadOptions`)

pub mod types;

pub use types::*;
