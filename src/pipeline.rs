//! Station acquisition: one listing call, then one detail call per station.
//!
//! Detail calls run strictly one at a time with a fixed pause between them,
//! which is what keeps the outbound request rate under the provider's limit.
//! A failed listing aborts the run; a failed detail call only drops that
//! station.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_REQUEST_INTERVAL_MS, PipelineConfig};
use crate::model::{Credential, GeoBox, StationReading, UNKNOWN_STATION};
use crate::services::aqi_api::{AqiApi, StationDetail, StationSummary};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    #[error("API token required")]
    MissingCredential,

    #[error("station listing failed: {0}")]
    ListingFailed(String),

    #[error("acquisition superseded by a newer run")]
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Pause between consecutive detail requests.
    pub request_interval: Duration,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            request_interval: Duration::from_millis(DEFAULT_REQUEST_INTERVAL_MS),
        }
    }
}

impl From<&PipelineConfig> for AcquireOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            request_interval: config.request_interval(),
        }
    }
}

/// Hands out generation tickets so that starting a new run supersedes any
/// run still in flight.
#[derive(Debug, Clone, Default)]
pub struct RunCoordinator {
    generation: Arc<AtomicU64>,
}

impl RunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation. Every ticket issued before this one stops
    /// being current.
    pub fn begin(&self) -> RunTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RunTicket {
            generation,
            current: Some(Arc::clone(&self.generation)),
        }
    }

    /// Supersedes every outstanding ticket without starting a run.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Held by one acquisition run to detect that it has been superseded.
#[derive(Debug, Clone)]
pub struct RunTicket {
    generation: u64,
    current: Option<Arc<AtomicU64>>,
}

impl RunTicket {
    /// A ticket that is never superseded.
    pub fn detached() -> Self {
        Self {
            generation: 0,
            current: None,
        }
    }

    pub fn is_current(&self) -> bool {
        match &self.current {
            Some(current) => current.load(Ordering::SeqCst) == self.generation,
            None => true,
        }
    }
}

/// Lists the stations inside `bounds` and fetches each one's detail feed.
///
/// # Errors
///
/// [`AcquisitionError::MissingCredential`] for an empty token (no request is
/// made) and [`AcquisitionError::ListingFailed`] when the listing call fails.
/// Per-station failures are logged and the station is left out.
pub async fn acquire<A: AqiApi + ?Sized>(
    api: &A,
    bounds: &GeoBox,
    token: &Credential,
    options: &AcquireOptions,
) -> Result<Vec<StationReading>, AcquisitionError> {
    acquire_with_ticket(api, bounds, token, options, &RunTicket::detached()).await
}

/// Like [`acquire`], but stops with [`AcquisitionError::Superseded`] before
/// the listing request or the next detail request once `ticket` is no longer
/// current.
#[tracing::instrument(skip(api, bounds, token, options, ticket), fields(bounds = %bounds))]
pub async fn acquire_with_ticket<A: AqiApi + ?Sized>(
    api: &A,
    bounds: &GeoBox,
    token: &Credential,
    options: &AcquireOptions,
    ticket: &RunTicket,
) -> Result<Vec<StationReading>, AcquisitionError> {
    if token.is_empty() {
        return Err(AcquisitionError::MissingCredential);
    }
    if !ticket.is_current() {
        warn!("Acquisition superseded before listing");
        return Err(AcquisitionError::Superseded);
    }

    let listing = api.list_stations(token, bounds).await.map_err(|e| {
        let reason = format!("{e:#}");
        error!(error = %reason, "Station listing failed");
        AcquisitionError::ListingFailed(reason)
    })?;
    info!(listed = listing.len(), "Station listing fetched");

    let mut readings = Vec::with_capacity(listing.len());

    for (i, station) in listing.iter().enumerate() {
        if i > 0 && !options.request_interval.is_zero() {
            tokio::time::sleep(options.request_interval).await;
        }

        if !ticket.is_current() {
            warn!(
                processed = i,
                listed = listing.len(),
                "Acquisition superseded, stopping"
            );
            return Err(AcquisitionError::Superseded);
        }

        match api.station_detail(token, station.uid).await {
            Ok(detail) => match build_reading(station, detail) {
                Some(reading) => {
                    debug!(
                        uid = station.uid,
                        aqi = reading.primary_index,
                        pollutants = reading.pollutants.reported(),
                        "Station accepted"
                    );
                    readings.push(reading);
                }
                None => warn!(uid = station.uid, "Station has no AQI value, skipping"),
            },
            Err(e) => {
                warn!(uid = station.uid, error = %format!("{e:#}"), "Station detail failed, skipping");
            }
        }
    }

    log_run_summary(listing.len(), readings.len());
    Ok(readings)
}

/// Merges a listing entry with its detail feed. `None` if the detail has no
/// usable AQI.
fn build_reading(station: &StationSummary, detail: StationDetail) -> Option<StationReading> {
    let primary_index = detail.aqi?;
    Some(StationReading {
        uid: station.uid,
        name: station
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATION.to_string()),
        latitude: station.lat,
        longitude: station.lon,
        primary_index,
        pollutants: detail.pollutants,
        observed_at: detail.observed_at,
    })
}

fn log_run_summary(listed: usize, accepted: usize) {
    let skipped = listed - accepted;
    if skipped == 0 {
        info!(listed, accepted, "Acquisition complete");
    } else if accepted == 0 {
        error!(listed, accepted, skipped, "Acquisition complete, every station failed");
    } else {
        warn!(listed, accepted, skipped, "Acquisition complete with skipped stations");
    }
}
