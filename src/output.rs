//! Output formatting and persistence for station readings and reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV append/load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyzers::category::{SeverityCategory, classify};
use crate::analyzers::types::AnalysisReport;
use crate::model::{PollutantLevels, StationReading};
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// One row of the station table. Absent values are empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRow {
    pub uid: i64,
    pub station: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub aqi: u32,
    pub category: String,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub o3: Option<f64>,
    pub timestamp: Option<String>,
}

impl From<&StationReading> for StationRow {
    fn from(r: &StationReading) -> Self {
        Self {
            uid: r.uid,
            station: r.name.clone(),
            lat: r.latitude,
            lon: r.longitude,
            aqi: r.primary_index,
            category: r.category().label().to_string(),
            pm25: r.pollutants.pm25,
            pm10: r.pollutants.pm10,
            co: r.pollutants.co,
            no2: r.pollutants.no2,
            so2: r.pollutants.so2,
            o3: r.pollutants.o3,
            timestamp: r.observed_at.clone(),
        }
    }
}

impl From<StationRow> for StationReading {
    // The category column is derived, so it is recomputed rather than read.
    fn from(row: StationRow) -> Self {
        Self {
            uid: row.uid,
            name: row.station,
            latitude: row.lat,
            longitude: row.lon,
            primary_index: row.aqi,
            pollutants: PollutantLevels {
                pm25: row.pm25,
                pm10: row.pm10,
                co: row.co,
                no2: row.no2,
                so2: row.so2,
                o3: row.o3,
            },
            observed_at: row.timestamp,
        }
    }
}

/// Logs readings using Rust's debug pretty-print format.
pub fn print_pretty(readings: &[StationReading]) {
    debug!("{:#?}", readings);
}

/// Writes the report to stdout as pretty-printed JSON.
pub fn print_json(report: &AnalysisReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Appends readings as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, readings: &[StationReading]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = readings.len(), "Appending CSV records");

    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for reading in readings {
        writer.serialize(StationRow::from(reading))?;
    }
    writer.flush()?;

    info!(path, rows = readings.len(), "Station table written");
    Ok(())
}

/// Loads every row of a station table written by [`append_records`].
pub fn load_records(path: &str) -> Result<Vec<StationReading>> {
    let file = File::open(path).with_context(|| format!("failed to open '{path}'"))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut readings = Vec::new();
    let mut stale = 0usize;
    for result in rdr.deserialize() {
        let row: StationRow = result.with_context(|| format!("bad row in '{path}'"))?;
        if !category_matches(&row) {
            stale += 1;
            warn!(
                uid = row.uid,
                aqi = row.aqi,
                category = %row.category,
                "Category column does not match AQI, using the recomputed band"
            );
        }
        readings.push(StationReading::from(row));
    }

    if stale > 0 {
        warn!(path, stale, "Station table has stale category labels");
    }
    Ok(readings)
}

/// Whether the row's `category` label names the band its `aqi` falls in.
fn category_matches(row: &StationRow) -> bool {
    SeverityCategory::from_label(&row.category) == Some(classify(i64::from(row.aqi)))
}
