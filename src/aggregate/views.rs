//! Named aggregates behind each report page.
//!
//! Product and time views group every record of the dataset, so their
//! measures always add up to `Dataset::total_revenue`. Customer views first
//! drop records without a customer id and records with non-positive revenue
//! (returns, cancellations, zero-price lines). Customer totals are therefore
//! not expected to reconcile with the product or time totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::group::{count_distinct, group_sum, largest_ascending, max_row, top_n, total};
use crate::domain::{AggregateRow, CustomerId, Dataset, Order, SortBy, TransactionRecord};
use crate::error::PipelineError;

/// Headline numbers for the dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_revenue: Decimal,
    /// Distinct invoice numbers.
    pub total_orders: usize,
    /// Distinct known customers. Anonymous rows are not counted.
    pub total_customers: usize,
}

/// Spend statistics over the customer spending table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerStats {
    pub customers: usize,
    pub mean_spend: Decimal,
    pub max_spend: Decimal,
}

pub fn summary(dataset: &Dataset) -> Result<SummaryMetrics, PipelineError> {
    let records = dataset.records();
    Ok(SummaryMetrics {
        total_revenue: dataset.total_revenue()?,
        total_orders: count_distinct(records, |r| Some(r.invoice_no.as_str())),
        total_customers: count_distinct(records, |r| r.customer_id.as_ref()),
    })
}

/// Revenue per calendar day, ascending by date.
///
/// Days without any sale are absent, not zero.
pub fn daily_revenue(dataset: &Dataset) -> Result<Vec<AggregateRow<NaiveDate>>, PipelineError> {
    group_sum(dataset.records(), TransactionRecord::invoice_day, TransactionRecord::line_revenue)
}

/// Revenue per product description.
pub fn revenue_by_product(dataset: &Dataset) -> Result<Vec<AggregateRow<String>>, PipelineError> {
    group_sum(dataset.records(), |r| r.description.clone(), TransactionRecord::line_revenue)
}

/// The `n` best-selling products by revenue.
pub fn top_products(dataset: &Dataset, n: usize) -> Result<Vec<AggregateRow<String>>, PipelineError> {
    Ok(top_n(revenue_by_product(dataset)?, n, SortBy::Measure, Order::Descending))
}

/// Spend per customer, ascending by customer id.
///
/// Only records with a customer and a strictly positive line revenue are
/// grouped; see the module docs for why these totals differ from the
/// product/time views.
pub fn customer_spending(dataset: &Dataset) -> Result<Vec<AggregateRow<CustomerId>>, PipelineError> {
    let mut eligible: Vec<(CustomerId, Decimal)> = Vec::new();
    for record in dataset.iter() {
        let Some(id) = &record.customer_id else {
            continue;
        };
        let revenue = record.line_revenue()?;
        if revenue > Decimal::ZERO {
            eligible.push((id.clone(), revenue));
        }
    }

    group_sum(&eligible, |(id, _)| id.clone(), |(_, revenue)| Ok(*revenue))
}

/// The `n` highest-spending rows of a spending table, biggest first.
pub fn top_spenders(spending: Vec<AggregateRow<CustomerId>>, n: usize) -> Vec<AggregateRow<CustomerId>> {
    top_n(spending, n, SortBy::Measure, Order::Descending)
}

/// The `n` highest-spending customers, biggest first.
pub fn top_customers(dataset: &Dataset, n: usize) -> Result<Vec<AggregateRow<CustomerId>>, PipelineError> {
    Ok(top_spenders(customer_spending(dataset)?, n))
}

/// The `n` highest-spending customers in ascending order of spend.
///
/// This is the tail of the spending table sorted ascending, which reads
/// left-to-right as a distribution.
pub fn spending_distribution(dataset: &Dataset, n: usize) -> Result<Vec<AggregateRow<CustomerId>>, PipelineError> {
    Ok(largest_ascending(customer_spending(dataset)?, n))
}

/// Count, mean and maximum of a spending table. `None` when it is empty.
pub fn customer_stats(spending: &[AggregateRow<CustomerId>]) -> Result<Option<CustomerStats>, PipelineError> {
    let Some(max) = max_row(spending) else {
        return Ok(None);
    };
    let customers = spending.len();
    Ok(Some(CustomerStats {
        customers,
        mean_spend: total(spending)? / Decimal::from(customers),
        max_spend: max.measure,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(invoice: &str, day: u32, desc: &str, qty: i64, price: Decimal, customer: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            invoice_no: invoice.to_string(),
            description: desc.to_string(),
            quantity: qty,
            unit_price: price,
            invoice_date: NaiveDate::from_ymd_opt(2011, 3, day)
                .unwrap()
                .and_hms_opt(10 + day, 30, 0)
                .unwrap(),
            customer_id: customer.and_then(CustomerId::canonical),
            country: "United Kingdom".to_string(),
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            record("A1", 1, "MUG", 2, dec!(3.50), Some("100.0")),
            record("A1", 1, "JUG", 1, dec!(10.00), Some("100")),
            record("A2", 2, "MUG", 4, dec!(3.50), None),
            record("C3", 2, "MUG", -1, dec!(3.50), Some("200")),
            record("A4", 4, "LAMP", 1, dec!(25.00), Some("300")),
            record("A5", 4, "JUG", 3, dec!(10.00), Some("200")),
        ])
    }

    #[test]
    fn summary_counts_orders_and_known_customers() {
        let s = summary(&sample()).unwrap();
        assert_eq!(s.total_revenue, dec!(82.50));
        assert_eq!(s.total_orders, 5);
        assert_eq!(s.total_customers, 3);
    }

    #[test]
    fn product_and_time_views_reconcile_with_dataset_total() {
        let data = sample();
        let daily = daily_revenue(&data).unwrap();
        let days: Vec<u32> = daily.iter().map(|r| chrono::Datelike::day(&r.key)).collect();
        assert_eq!(days, [1, 2, 4]);
        assert_eq!(total(&daily), data.total_revenue());
        assert_eq!(total(&revenue_by_product(&data).unwrap()), data.total_revenue());
    }

    #[test]
    fn top_products_rank_by_revenue() {
        let top = top_products(&sample(), 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], AggregateRow::new("JUG".to_string(), dec!(40.00)));
        assert_eq!(top[1], AggregateRow::new("LAMP".to_string(), dec!(25.00)));
    }

    #[test]
    fn anonymous_record_counts_for_products_but_not_customers() {
        let data = sample();
        let mug = revenue_by_product(&data).unwrap().into_iter().find(|r| r.key == "MUG").unwrap();
        // 7.00 + 14.00 (anonymous) - 3.50 (return)
        assert_eq!(mug.measure, dec!(17.50));

        let spending = customer_spending(&data).unwrap();
        let ids: Vec<&str> = spending.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(ids, ["100", "200", "300"]);
        assert_eq!(spending[0].measure, dec!(17.00));
        assert_eq!(spending[1].measure, dec!(30.00));
        assert_ne!(total(&spending), data.total_revenue());
    }

    #[test]
    fn top_customers_and_distribution() {
        let data = sample();
        let top = top_customers(&data, 1).unwrap();
        assert_eq!(top[0].key.as_str(), "200");

        let dist = spending_distribution(&data, 2).unwrap();
        let ids: Vec<&str> = dist.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(ids, ["300", "200"]);
        assert_eq!(spending_distribution(&data, 50).unwrap().len(), 3);
    }

    #[test]
    fn customer_stats_over_spending() {
        let stats = customer_stats(&customer_spending(&sample()).unwrap()).unwrap().unwrap();
        assert_eq!(stats.customers, 3);
        assert_eq!(stats.mean_spend, dec!(24.00));
        assert_eq!(stats.max_spend, dec!(30.00));
        assert_eq!(customer_stats(&[]), Ok(None));
    }

    #[test]
    fn overflowing_revenue_fails_every_view_instead_of_panicking() {
        let data = Dataset::new(vec![
            record("B1", 1, "GOLD", 1, Decimal::MAX, Some("1")),
            record("B2", 1, "GOLD", 1, Decimal::MAX, Some("1")),
        ]);
        assert!(matches!(summary(&data), Err(PipelineError::Numeric(_))));
        assert!(matches!(daily_revenue(&data), Err(PipelineError::Numeric(_))));
        assert!(matches!(top_products(&data, 5), Err(PipelineError::Numeric(_))));
        assert!(matches!(customer_spending(&data), Err(PipelineError::Numeric(_))));
    }

    #[test]
    fn empty_dataset_gives_empty_views() {
        let empty = Dataset::default();
        assert!(daily_revenue(&empty).unwrap().is_empty());
        assert!(top_products(&empty, 10).unwrap().is_empty());
        assert!(customer_spending(&empty).unwrap().is_empty());
        assert_eq!(summary(&empty).unwrap().total_orders, 0);
    }
}
