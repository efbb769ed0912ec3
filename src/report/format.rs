//! Plain-text formatting of report pages.
//!
//! We keep formatting code in one place so:
//! - the aggregation/forecast code stays clean and testable
//! - output changes are localized

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::aggregate::SummaryMetrics;
use crate::app::pipeline::{CustomerReport, ForecastRun};
use crate::domain::{AggregateRow, ForecastStart};

const KEY_WIDTH: usize = 36;

/// Headline metrics block.
pub fn format_summary(summary: &SummaryMetrics) -> String {
    let mut out = String::new();
    out.push_str("=== ecom - Sales Summary ===\n");
    out.push_str(&format!("Total revenue:   {}\n", fmt_money(summary.total_revenue)));
    out.push_str(&format!("Total orders:    {}\n", summary.total_orders));
    out.push_str(&format!("Total customers: {}\n", summary.total_customers));
    out
}

/// Daily revenue table, optionally limited to the last `days` rows.
pub fn format_daily_trend(daily: &[AggregateRow<NaiveDate>], days: Option<usize>) -> String {
    let skip = days.map_or(0, |n| daily.len().saturating_sub(n));
    format_rows("Daily revenue", "date", &daily[skip..])
}

/// Title + two-column `key | revenue` table.
pub fn format_rows<K: ToString>(title: &str, key_label: &str, rows: &[AggregateRow<K>]) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push_str(":\n");
    out.push_str(&format_table(key_label, rows));
    out
}

pub fn format_customer_report(report: &CustomerReport) -> String {
    let mut out = String::new();

    out.push_str("Customer stats:\n");
    out.push_str(&format!("- customers : {}\n", report.stats.customers));
    out.push_str(&format!("- mean spend: {}\n", fmt_money(report.stats.mean_spend)));
    out.push_str(&format!("- max spend : {}\n", fmt_money(report.stats.max_spend)));
    out.push('\n');

    out.push_str(&format_rows("Top customers", "customer_id", &report.top));
    out.push('\n');
    out.push_str(&format_rows(
        "Spending distribution (ascending)",
        "customer_id",
        &report.distribution,
    ));
    out
}

pub fn format_forecast(run: &ForecastRun) -> String {
    let mut out = String::new();

    out.push_str("=== ecom - Sales Forecast ===\n");
    match run.next_day {
        Some(v) => out.push_str(&format!("Next-day prediction: {}\n", fmt_money_f64(v))),
        None => out.push_str("Next-day prediction: (horizon is 0)\n"),
    }
    out.push_str(&format!(
        "Model: revenue = {:.6} + {:.6} * day_index\n",
        run.model.intercept, run.model.slope
    ));
    let start = match run.start {
        ForecastStart::LastObserved => "last observed date",
        ForecastStart::NextDay => "day after last observed date",
    };
    out.push_str(&format!(
        "Observed days: {} | horizon: {} days from {start}\n",
        run.actual.len(),
        run.horizon
    ));
    out.push('\n');

    out.push_str(&format!("{:<10} {:>16} {:<9}\n", "date", "revenue", "series"));
    out.push_str(&format!("{:-<10} {:-<16} {:-<9}\n", "", "", ""));
    for p in &run.series {
        out.push_str(&format!(
            "{:<10} {:>16} {:<9}\n",
            p.date,
            fmt_money_f64(p.value),
            p.series.as_str()
        ));
    }
    out
}

pub fn format_countries(names: &[String]) -> String {
    let mut out = format!("Countries ({}):\n", names.len());
    for name in names {
        out.push_str(&format!("- {name}\n"));
    }
    out
}

fn format_table<K: ToString>(key_label: &str, rows: &[AggregateRow<K>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<w$} {:>16}\n", key_label, "revenue", w = KEY_WIDTH));
    out.push_str(&format!("{:-<w$} {:-<16}\n", "", "", w = KEY_WIDTH));
    for r in rows {
        out.push_str(&format!(
            "{:<w$} {:>16}\n",
            truncate(&r.key.to_string(), KEY_WIDTH),
            fmt_money(r.measure),
            w = KEY_WIDTH
        ));
    }
    out
}

/// `$1,234.56` style. Negative amounts keep the sign in front: `-$12.00`.
pub fn fmt_money(v: Decimal) -> String {
    let rounded = v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn fmt_money_f64(v: f64) -> String {
    match Decimal::from_f64_retain(v) {
        Some(d) => fmt_money(d),
        None => format!("{v:.2}"),
    }
}

fn group_thousands(whole: &str) -> String {
    let mut out = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
