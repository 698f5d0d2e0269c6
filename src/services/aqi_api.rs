//! Trait and types for talking to an air-quality data provider.

use anyhow::Result;

use crate::model::{Credential, GeoBox, PollutantLevels};

/// A station entry from the bounds listing.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSummary {
    pub uid: i64,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// The per-station detail feed.
///
/// `aqi` is `None` when the provider has no usable index for the station
/// (missing, `"-"`, or negative); such stations are dropped by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationDetail {
    pub aqi: Option<u32>,
    pub observed_at: Option<String>,
    pub pollutants: PollutantLevels,
}

/// Abstraction over an AQI provider (e.g., WAQI).
///
/// Both calls fail on transport errors, non-2xx statuses, unparseable bodies
/// and envelopes whose `status` is not `"ok"`.
#[async_trait::async_trait]
pub trait AqiApi: Send + Sync {
    /// Lists every station whose coordinates fall inside `bounds`.
    async fn list_stations(&self, token: &Credential, bounds: &GeoBox) -> Result<Vec<StationSummary>>;

    /// Fetches the current reading for one station.
    async fn station_detail(&self, token: &Credential, uid: i64) -> Result<StationDetail>;
}
