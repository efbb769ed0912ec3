//! Sales forecasting.
//!
//! - index-based linear trend fit + projection (`trend`)
//! - actual/predicted series assembly (`assemble`)

pub mod assemble;
pub mod trend;

pub use assemble::*;
pub use trend::*;
