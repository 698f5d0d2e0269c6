use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infra::waqi::DEFAULT_BASE_URL;
use crate::model::GeoBox;

/// Minimum spacing between station detail requests.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 100;

/// Tunables for an acquisition run.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "base_url": "https://api.waqi.info",
///   "bounds": { "south": 6.554, "west": 68.176, "north": 35.674, "east": 97.395 },
///   "request_interval_ms": 100,
///   "timeout_secs": 30,
///   "connect_timeout_secs": 10
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub base_url: String,
    pub bounds: GeoBox,
    pub request_interval_ms: u64,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bounds: GeoBox::INDIA,
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config '{path}'"))
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
