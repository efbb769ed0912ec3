//! Input/output helpers.
//!
//! - CSV ingest + cleaning (`ingest`)
//! - memoized loading keyed by source fingerprint (`cache`)
//! - result exports (CSV/JSON) (`export`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
