//! Reporting utilities: formatted terminal output for each report page.

pub mod format;

pub use format::*;

/// Printed whenever a selection leaves nothing to report.
pub const EMPTY_SELECTION: &str = "No data available for selected filter.";
