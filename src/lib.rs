//! Periodically scrapes the World Bank population and CO2-emission indicator
//! downloads, derives absolute and per-capita emission tables, and publishes
//! the latest snapshot for concurrent readers.

pub mod config;
pub mod error;
pub mod fetch;
pub mod process;
pub mod refresh;
pub mod store;
