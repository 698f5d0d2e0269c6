//! Station records and the value types the pipeline passes around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analyzers::category::{SeverityCategory, classify};

/// Station name used when the provider listing omits one.
pub const UNKNOWN_STATION: &str = "Unknown";

/// A pollutant the provider reports under `iaqi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutantKind {
    Pm25,
    Pm10,
    Co,
    No2,
    So2,
    O3,
}

impl PollutantKind {
    pub const ALL: [PollutantKind; 6] = [
        PollutantKind::Pm25,
        PollutantKind::Pm10,
        PollutantKind::Co,
        PollutantKind::No2,
        PollutantKind::So2,
        PollutantKind::O3,
    ];

    /// Key under `data.iaqi` in a detail response.
    pub fn iaqi_key(self) -> &'static str {
        match self {
            PollutantKind::Pm25 => "pm25",
            PollutantKind::Pm10 => "pm10",
            PollutantKind::Co => "co",
            PollutantKind::No2 => "no2",
            PollutantKind::So2 => "so2",
            PollutantKind::O3 => "o3",
        }
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollutantKind::Pm25 => write!(f, "PM2.5"),
            PollutantKind::Pm10 => write!(f, "PM10"),
            PollutantKind::Co => write!(f, "CO"),
            PollutantKind::No2 => write!(f, "NO2"),
            PollutantKind::So2 => write!(f, "SO2"),
            PollutantKind::O3 => write!(f, "O3"),
        }
    }
}

/// Individual pollutant readings for one station. Each kind is independently
/// present or absent; an absent kind is never stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantLevels {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub o3: Option<f64>,
}

impl PollutantLevels {
    pub fn get(&self, kind: PollutantKind) -> Option<f64> {
        match kind {
            PollutantKind::Pm25 => self.pm25,
            PollutantKind::Pm10 => self.pm10,
            PollutantKind::Co => self.co,
            PollutantKind::No2 => self.no2,
            PollutantKind::So2 => self.so2,
            PollutantKind::O3 => self.o3,
        }
    }

    pub fn set(&mut self, kind: PollutantKind, value: Option<f64>) {
        let slot = match kind {
            PollutantKind::Pm25 => &mut self.pm25,
            PollutantKind::Pm10 => &mut self.pm10,
            PollutantKind::Co => &mut self.co,
            PollutantKind::No2 => &mut self.no2,
            PollutantKind::So2 => &mut self.so2,
            PollutantKind::O3 => &mut self.o3,
        };
        *slot = value;
    }

    /// Number of kinds with a reading.
    pub fn reported(&self) -> usize {
        PollutantKind::ALL
            .iter()
            .filter(|k| self.get(**k).is_some())
            .count()
    }
}

/// One monitoring station's reading from a single acquisition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    pub uid: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub primary_index: u32,
    pub pollutants: PollutantLevels,
    pub observed_at: Option<String>,
}

impl StationReading {
    pub fn category(&self) -> SeverityCategory {
        classify(i64::from(self.primary_index))
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoBoxError {
    #[error("expected 4 comma-separated values (south,west,north,east), got {0}")]
    WrongArity(usize),

    #[error("invalid coordinate '{0}'")]
    InvalidNumber(String),

    #[error("coordinates must be finite")]
    NotFinite,

    #[error("south ({south}) is greater than north ({north})")]
    Inverted { south: f64, north: f64 },

    #[error("west ({west}) is greater than east ({east})")]
    Reversed { west: f64, east: f64 },
}

/// Axis-aligned latitude/longitude rectangle used for the station listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoBox")]
pub struct GeoBox {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

#[derive(Deserialize)]
struct RawGeoBox {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl TryFrom<RawGeoBox> for GeoBox {
    type Error = GeoBoxError;

    fn try_from(raw: RawGeoBox) -> Result<Self, Self::Error> {
        GeoBox::new(raw.south, raw.west, raw.north, raw.east)
    }
}

impl GeoBox {
    /// Bounds covering India.
    pub const INDIA: GeoBox = GeoBox {
        south: 6.554,
        west: 68.176,
        north: 35.674,
        east: 97.395,
    };

    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, GeoBoxError> {
        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(GeoBoxError::NotFinite);
        }
        if south > north {
            return Err(GeoBoxError::Inverted { south, north });
        }
        if west > east {
            return Err(GeoBoxError::Reversed { west, east });
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Value for the provider's `latlng` query parameter.
    pub fn to_latlng_param(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl Default for GeoBox {
    fn default() -> Self {
        GeoBox::INDIA
    }
}

impl fmt::Display for GeoBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_latlng_param())
    }
}

impl FromStr for GeoBox {
    type Err = GeoBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeoBoxError::WrongArity(parts.len()));
        }
        let mut values = [0.0; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| GeoBoxError::InvalidNumber(part.to_string()))?;
        }
        GeoBox::new(values[0], values[1], values[2], values[3])
    }
}

/// Provider API token. Passed through untouched; never printed.
#[derive(Clone, Default)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Credential::new(s)
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Credential::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geobox_parses_provider_format() {
        let bounds: GeoBox = "6.554,68.176,35.674,97.395".parse().unwrap();
        assert_eq!(bounds, GeoBox::INDIA);
        assert_eq!(bounds.to_latlng_param(), "6.554,68.176,35.674,97.395");
    }

    #[test]
    fn test_geobox_rejects_bad_input() {
        assert_eq!("1,2,3".parse::<GeoBox>(), Err(GeoBoxError::WrongArity(3)));
        assert!(matches!(
            "1,x,3,4".parse::<GeoBox>(),
            Err(GeoBoxError::InvalidNumber(_))
        ));
        assert!(matches!(
            GeoBox::new(10.0, 0.0, 5.0, 1.0),
            Err(GeoBoxError::Inverted { .. })
        ));
        assert!(matches!(
            GeoBox::new(0.0, 10.0, 5.0, 1.0),
            Err(GeoBoxError::Reversed { .. })
        ));
        assert_eq!(
            GeoBox::new(f64::NAN, 0.0, 1.0, 1.0),
            Err(GeoBoxError::NotFinite)
        );
    }

    #[test]
    fn test_geobox_deserialize_validates() {
        let ok: GeoBox =
            serde_json::from_str(r#"{"south":1.0,"west":2.0,"north":3.0,"east":4.0}"#).unwrap();
        assert_eq!(ok.to_latlng_param(), "1,2,3,4");

        let bad = serde_json::from_str::<GeoBox>(r#"{"south":5.0,"west":2.0,"north":3.0,"east":4.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let token = Credential::new("secret-token");
        assert!(!format!("{:?}", token).contains("secret"));
        assert!(Credential::new("   ").is_empty());
        assert!(!token.is_empty());
    }

    #[test]
    fn test_pollutant_levels_get_set() {
        let mut levels = PollutantLevels::default();
        assert_eq!(levels.reported(), 0);

        levels.set(PollutantKind::No2, Some(12.5));
        levels.set(PollutantKind::O3, Some(0.0));

        assert_eq!(levels.get(PollutantKind::No2), Some(12.5));
        assert_eq!(levels.get(PollutantKind::O3), Some(0.0));
        assert_eq!(levels.get(PollutantKind::Pm25), None);
        assert_eq!(levels.reported(), 2);
    }
}
