//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - loads and filters the transaction file
//! - prints reports
//! - writes optional exports

use clap::Parser;
use env_logger::{Env, Target};

use crate::app::pipeline::View;
use crate::cli::{Command, CustomerArgs, ForecastArgs, ProductArgs, SourceArgs, SummaryArgs};
use crate::domain::{Dataset, ExportFormat, LoadOptions, RunConfig};
use crate::error::AppError;
use crate::io::DatasetCache;

pub mod pipeline;

/// Entry point for the `ecom` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();

    // We want a bare `ecom` (or `ecom --country France`) to show the dashboard.
    //
    // Clap requires a subcommand name, so the argv list is rewritten before
    // parsing rather than making the subcommand optional.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let config = run_config_from_args(&cli.source);

    let mut cache = DatasetCache::new();
    let ingested = pipeline::load(&mut cache, &config)?;
    let dataset = pipeline::filter(&ingested.dataset, config.countries.as_deref());

    match cli.command {
        Command::Summary(args) => handle_summary(&dataset, &args),
        Command::Products(args) => handle_products(&dataset, &args),
        Command::Customers(args) => handle_customers(&dataset, &args),
        Command::Forecast(args) => handle_forecast(&dataset, &args),
        Command::Countries => {
            // The domain comes from the unfiltered data.
            let names = crate::filter::distinct_values(&ingested.dataset, crate::filter::Field::Country);
            println!("{}", crate::report::format_countries(&names));
            Ok(())
        }
    }
}

fn handle_summary(dataset: &Dataset, args: &SummaryArgs) -> Result<(), AppError> {
    match pipeline::dashboard(dataset)? {
        View::Empty => println!("{}", crate::report::EMPTY_SELECTION),
        View::Ready(dashboard) => {
            println!("{}", crate::report::format_summary(&dashboard.summary));
            println!("{}", crate::report::format_daily_trend(&dashboard.daily, args.days));
        }
    }
    Ok(())
}

fn handle_products(dataset: &Dataset, args: &ProductArgs) -> Result<(), AppError> {
    let view = pipeline::products(dataset, args.top)?;
    if let Some(path) = &args.export {
        let rows = view.into_result()?;
        crate::io::write_rows_csv(path, &rows, "description")?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
        return Ok(());
    }

    match view {
        View::Empty => println!("{}", crate::report::EMPTY_SELECTION),
        View::Ready(rows) => println!("{}", crate::report::format_rows("Top products", "description", &rows)),
    }
    Ok(())
}

fn handle_customers(dataset: &Dataset, args: &CustomerArgs) -> Result<(), AppError> {
    let view = pipeline::customers(dataset, args.top, args.distribution)?;
    if let Some(path) = &args.export {
        let report = view.into_result()?;
        crate::io::write_rows_csv(path, &report.top, "customer_id")?;
        println!("Wrote {} rows to {}", report.top.len(), path.display());
        return Ok(());
    }

    match view {
        View::Empty => println!("{}", crate::report::EMPTY_SELECTION),
        View::Ready(report) => println!("{}", crate::report::format_customer_report(&report)),
    }
    Ok(())
}

fn handle_forecast(dataset: &Dataset, args: &ForecastArgs) -> Result<(), AppError> {
    let run = pipeline::forecast(dataset, args.horizon, args.start)?;
    println!("{}", crate::report::format_forecast(&run));

    if let Some(path) = &args.export {
        match args.format {
            ExportFormat::Csv => crate::io::write_series_csv(path, &run.series)?,
            ExportFormat::Json => crate::io::write_forecast_json(path, &run)?,
        }
        println!("Wrote forecast to {}", path.display());
    }
    Ok(())
}

pub fn run_config_from_args(args: &SourceArgs) -> RunConfig {
    RunConfig {
        data_path: args.data.clone(),
        countries: (!args.countries.is_empty()).then(|| args.countries.clone()),
        load: LoadOptions {
            require_customer: args.require_customer,
        },
    }
}

const SUBCOMMANDS: [&str; 5] = ["summary", "products", "customers", "forecast", "countries"];

/// Global flags that consume the next token as their value.
const GLOBAL_VALUE_FLAGS: [&str; 3] = ["--data", "--country", "-c"];

/// Rewrite argv so `ecom` defaults to `ecom summary`.
///
/// Rules:
/// - `ecom`                        -> `ecom summary`
/// - `ecom --country France ...`   -> `ecom summary --country France ...`
/// - `ecom --help/--version/-h`    -> unchanged (show top-level help/version)
/// - `ecom --data x.csv forecast`  -> unchanged (a subcommand is named)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1) else {
        argv.push("summary".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version || !arg1.starts_with('-') {
        return argv;
    }

    if !SUBCOMMANDS.contains(&first_positional(&argv[1..])) {
        argv.insert(1, "summary".to_string());
    }
    argv
}

/// The first token that is neither a flag nor the value of a global flag.
fn first_positional(args: &[String]) -> &str {
    let mut tokens = args.iter();
    while let Some(token) = tokens.next() {
        if GLOBAL_VALUE_FLAGS.contains(&token.as_str()) {
            tokens.next();
        } else if !token.starts_with('-') {
            return token;
        }
    }
    ""
}
