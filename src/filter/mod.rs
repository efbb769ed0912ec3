//! Categorical filtering of a dataset.
//!
//! Filtering never edits records: it copies the matching ones, in their
//! original order, into a new `Dataset`.

use std::collections::HashSet;

use crate::domain::{CustomerId, Dataset, TransactionRecord};

/// A categorical column that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    InvoiceNo,
    Description,
    Country,
    CustomerId,
}

impl Field {
    /// The record's value for this field, if it has one.
    pub fn value(self, record: &TransactionRecord) -> Option<&str> {
        match self {
            Field::InvoiceNo => Some(record.invoice_no.as_str()),
            Field::Description => Some(record.description.as_str()),
            Field::Country => Some(record.country.as_str()),
            Field::CustomerId => record.customer_id.as_ref().map(CustomerId::as_str),
        }
    }
}

/// Keep the records whose `field` value is in `allowed`.
///
/// An empty `allowed` set yields an empty dataset. Records with no value for
/// `field` (an anonymous customer) never match.
pub fn apply(dataset: &Dataset, field: Field, allowed: &HashSet<String>) -> Dataset {
    dataset
        .iter()
        .filter(|r| field.value(r).is_some_and(|v| allowed.contains(v)))
        .cloned()
        .collect()
}

/// Distinct values of `field`, in first-seen order.
pub fn distinct_values(dataset: &Dataset, field: Field) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in dataset.iter().filter_map(|r| field.value(r)) {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Country selection used by every report.
///
/// `None` means "no selection made" and keeps the whole dataset.
pub fn countries(dataset: &Dataset, selection: Option<&[String]>) -> Dataset {
    let Some(selection) = selection else {
        return dataset.clone();
    };
    let allowed: HashSet<String> = selection.iter().map(|c| c.trim().to_string()).collect();
    let filtered = apply(dataset, Field::Country, &allowed);
    log::info!(
        "country filter kept {} of {} records ({} countries selected)",
        filtered.len(),
        dataset.len(),
        allowed.len()
    );
    filtered
}
