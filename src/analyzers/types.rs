//! Data types produced by the aggregation functions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::category::SeverityCategory;
use crate::model::{PollutantKind, StationReading};

/// Zero-filled means for one severity band.
///
/// Every pollutant kind has an entry; stations that do not report a kind
/// count as zero for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverages {
    pub(crate) members: usize,
    pub(crate) avg_primary_index: f64,
    pub(crate) pollutants: BTreeMap<PollutantKind, f64>,
}

impl CategoryAverages {
    pub fn members(&self) -> usize {
        self.members
    }

    pub fn avg_primary_index(&self) -> f64 {
        self.avg_primary_index
    }

    /// Zero-filled mean for `kind`.
    pub fn pollutant(&self, kind: PollutantKind) -> f64 {
        self.pollutants.get(&kind).copied().unwrap_or(0.0)
    }
}

/// Means for one severity band computed only over reported values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentAverages {
    pub(crate) members: usize,
    pub(crate) avg_primary_index: f64,
    pub(crate) pollutants: BTreeMap<PollutantKind, Option<f64>>,
}

impl PresentAverages {
    pub fn members(&self) -> usize {
        self.members
    }

    pub fn avg_primary_index(&self) -> f64 {
        self.avg_primary_index
    }

    /// `None` when no station in the band reports `kind`.
    pub fn pollutant(&self, kind: PollutantKind) -> Option<f64> {
        self.pollutants.get(&kind).copied().flatten()
    }
}

/// One point of the PM2.5 against PM10 scatter series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub station: String,
    pub pm25: f64,
    pub pm10: f64,
    pub aqi: u32,
}

/// Station count for one band, with the band's chart color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: SeverityCategory,
    pub count: usize,
    pub color: &'static str,
}

/// Averages for one band, in both flavours. `color` comes from the band's
/// representative index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverageEntry {
    pub category: SeverityCategory,
    pub color: &'static str,
    pub zero_filled: CategoryAverages,
    pub present_only: PresentAverages,
}

/// An entry of the top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStation {
    pub station: String,
    pub aqi: u32,
    pub category: SeverityCategory,
    pub color: &'static str,
}

impl From<&StationReading> for RankedStation {
    fn from(reading: &StationReading) -> Self {
        let category = reading.category();
        Self {
            station: reading.name.clone(),
            aqi: reading.primary_index,
            category,
            color: category.color(),
        }
    }
}

/// Everything the chart views need, bundled for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub station_count: usize,
    pub mappable_count: usize,
    pub distribution: Vec<CategoryCount>,
    pub averages: Vec<CategoryAverageEntry>,
    pub top_stations: Vec<RankedStation>,
    pub correlation: Vec<CorrelationPoint>,
}
