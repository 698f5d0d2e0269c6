use serde::{Serialize, Serializer};
use std::fmt;

/// Six ordinal AQI bands, lowest severity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl SeverityCategory {
    pub const ALL: [SeverityCategory; 6] = [
        SeverityCategory::Good,
        SeverityCategory::Moderate,
        SeverityCategory::UnhealthyForSensitive,
        SeverityCategory::Unhealthy,
        SeverityCategory::VeryUnhealthy,
        SeverityCategory::Hazardous,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SeverityCategory::Good => "Good",
            SeverityCategory::Moderate => "Moderate",
            SeverityCategory::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            SeverityCategory::Unhealthy => "Unhealthy",
            SeverityCategory::VeryUnhealthy => "Very Unhealthy",
            SeverityCategory::Hazardous => "Hazardous",
        }
    }

    /// Display color shared by every visualization of this band.
    pub fn color(self) -> &'static str {
        match self {
            SeverityCategory::Good => "#00e400",
            SeverityCategory::Moderate => "#ffff00",
            SeverityCategory::UnhealthyForSensitive => "#ff7e00",
            SeverityCategory::Unhealthy => "#ff0000",
            SeverityCategory::VeryUnhealthy => "#8f3f97",
            SeverityCategory::Hazardous => "#7e0023",
        }
    }

    /// An index value inside the band, used to color category-level entries.
    pub fn representative_index(self) -> u32 {
        match self {
            SeverityCategory::Good => 25,
            SeverityCategory::Moderate => 75,
            SeverityCategory::UnhealthyForSensitive => 125,
            SeverityCategory::Unhealthy => 175,
            SeverityCategory::VeryUnhealthy => 250,
            SeverityCategory::Hazardous => 350,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SeverityCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Maps an AQI value to its band. Upper bounds are inclusive, so a boundary
/// value belongs to the lower band. Negative values fall into `Good`.
pub fn classify(index: i64) -> SeverityCategory {
    match index {
        i if i <= 50 => SeverityCategory::Good,
        i if i <= 100 => SeverityCategory::Moderate,
        i if i <= 150 => SeverityCategory::UnhealthyForSensitive,
        i if i <= 200 => SeverityCategory::Unhealthy,
        i if i <= 300 => SeverityCategory::VeryUnhealthy,
        _ => SeverityCategory::Hazardous,
    }
}
