//! `ecom-analytics` library crate.
//!
//! The binary (`ecom`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the load/filter/aggregate/forecast pipeline is reusable behind other front ends
//! - code stays easy to navigate as the project grows

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod io;
pub mod math;
pub mod report;
