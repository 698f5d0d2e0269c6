//! Station aggregation for the chart views.
//!
//! This module classifies readings into AQI severity bands and computes the
//! per-band counts, pollutant averages, top-N ranking and PM correlation
//! series. Everything here is pure and synchronous.

pub mod aggregate;
pub mod category;
pub mod types;
pub mod utility;

pub use aggregate::{
    build_report, distribution_by_category, mappable, pollutant_averages, pollutant_correlation,
    pollutant_present_averages, top_by_index,
};
pub use category::{SeverityCategory, classify};
