//! Command-line parsing for the e-commerce reporting pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the loading/aggregation code.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};

use crate::domain::{ExportFormat, ForecastStart};
use crate::forecast::MAX_HORIZON_DAYS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ecom", version, about = "E-commerce sales reports and revenue forecast")]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every report.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Transaction file (CSV, UTF-8 or Latin-1).
    #[arg(long, global = true, env = "ECOM_DATA", default_value = "data.csv")]
    pub data: PathBuf,

    /// Keep only these countries (repeatable). Omit to keep all.
    #[arg(short = 'c', long = "country", global = true, value_name = "NAME")]
    pub countries: Vec<String>,

    /// Drop rows without a CustomerID at load time.
    #[arg(long, global = true)]
    pub require_customer: bool,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Revenue, orders and customers, plus the daily revenue trend.
    Summary(SummaryArgs),
    /// Best-selling products by revenue.
    Products(ProductArgs),
    /// Top customers, spending distribution and spend statistics.
    Customers(CustomerArgs),
    /// Linear revenue forecast over the daily series.
    Forecast(ForecastArgs),
    /// List the countries present in the data.
    Countries,
}

#[derive(Debug, Args, Clone, Default)]
pub struct SummaryArgs {
    /// Show only the last N days of the trend.
    #[arg(long)]
    pub days: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct ProductArgs {
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Write the ranked rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CustomerArgs {
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Number of customers in the spending distribution.
    #[arg(long, default_value_t = 50)]
    pub distribution: usize,

    /// Write the top-customer rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Days to project.
    #[arg(
        long,
        default_value_t = 30,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_HORIZON_DAYS as u64)
    )]
    pub horizon: usize,

    /// Date of the first forecast label.
    #[arg(long, value_enum, default_value_t = ForecastStart::LastObserved)]
    pub start: ForecastStart,

    /// Write the combined actual + predicted series.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
}
