//! Grouping and the named report views.
//!
//! - generic group/sort/top-n primitives (`group`)
//! - dashboard, product and customer views (`views`)

pub mod group;
pub mod views;

pub use group::*;
pub use views::*;
