use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::model::{Credential, GeoBox, PollutantKind, PollutantLevels};
use crate::services::aqi_api::{AqiApi, StationDetail, StationSummary};

pub const DEFAULT_BASE_URL: &str = "https://api.waqi.info";

/// The `{status, data}` wrapper on every WAQI response.
#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    /// Returns `data` if the provider reported success.
    fn into_data(self) -> Result<Value> {
        if self.status == "ok" {
            return Ok(self.data);
        }
        // Error envelopes usually carry a message string in `data`.
        let message = self.data.as_str().unwrap_or("no message");
        bail!("provider returned status '{}': {}", self.status, message)
    }
}

/// Client for the WAQI (aqicn.org) JSON API.
pub struct WaqiClient<C = BasicClient> {
    base_url: String,
    http: C,
}

impl WaqiClient<BasicClient> {
    /// Creates a client from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let http = BasicClient::with_timeouts(config.timeout(), config.connect_timeout())
            .context("failed to build HTTP client")?;
        Ok(Self::with_http(&config.base_url, http))
    }
}

impl<C: HttpClient> WaqiClient<C> {
    pub fn with_http(base_url: &str, http: C) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn authorized<'a>(&'a self, token: &Credential) -> UrlParam<&'a C> {
        UrlParam::new(&self.http, "token", token.expose())
    }
}

#[async_trait]
impl<C: HttpClient> AqiApi for WaqiClient<C> {
    async fn list_stations(&self, token: &Credential, bounds: &GeoBox) -> Result<Vec<StationSummary>> {
        let url = format!(
            "{}/map/bounds?latlng={}",
            self.base_url,
            bounds.to_latlng_param()
        );

        let envelope: Envelope = fetch_json(&self.authorized(token), &url)
            .await
            .context("station listing request failed")?;

        parse_listing(envelope.into_data()?)
    }

    async fn station_detail(&self, token: &Credential, uid: i64) -> Result<StationDetail> {
        let url = format!("{}/feed/@{}/", self.base_url, uid);

        let envelope: Envelope = fetch_json(&self.authorized(token), &url)
            .await
            .with_context(|| format!("detail request for station {uid} failed"))?;

        parse_detail(envelope.into_data()?)
    }
}

/// Extracts station summaries from the `data` array of a bounds listing.
/// Entries without a usable `uid` are skipped.
pub(crate) fn parse_listing(data: Value) -> Result<Vec<StationSummary>> {
    let Value::Array(items) = data else {
        bail!("Parse error: listing data is not an array");
    };

    let stations = items
        .into_iter()
        .filter_map(|item| {
            let Some(uid) = parse_uid(&item["uid"]) else {
                warn!(entry = %item, "Listing entry has no usable uid, skipping");
                return None;
            };
            let name = item["station"]["name"]
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string);

            Some(StationSummary {
                uid,
                name,
                lat: item["lat"].as_f64(),
                lon: item["lon"].as_f64(),
            })
        })
        .collect::<Vec<_>>();

    debug!(stations = stations.len(), "Parsed station listing");
    Ok(stations)
}

/// Extracts index, timestamp and pollutant readings from a detail feed.
pub(crate) fn parse_detail(data: Value) -> Result<StationDetail> {
    if !data.is_object() {
        return Err(anyhow!("Parse error: detail data is not an object"));
    }

    let mut pollutants = PollutantLevels::default();
    for kind in PollutantKind::ALL {
        pollutants.set(kind, data["iaqi"][kind.iaqi_key()]["v"].as_f64());
    }

    Ok(StationDetail {
        aqi: parse_index(&data["aqi"]),
        observed_at: data["time"]["s"].as_str().map(str::to_string),
        pollutants,
    })
}

fn parse_uid(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The provider sends the AQI as a number, a numeric string, or `"-"` when
/// the station has no current index.
fn parse_index(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() || raw < 0.0 || raw > f64::from(u32::MAX) {
        return None;
    }
    Some(raw.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned `(status, body)` responses and records request URLs.
    struct CannedClient {
        responses: Mutex<VecDeque<(u16, String)>>,
        urls: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn new(responses: Vec<(u16, Value)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(status, body)| (status, body.to_string()))
                        .collect(),
                ),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.urls.lock().unwrap().push(req.url().to_string());
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no canned response left");
            let resp = http::Response::builder().status(status).body(body).unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    #[test]
    fn test_parse_index_variants() {
        assert_eq!(parse_index(&json!(57)), Some(57));
        assert_eq!(parse_index(&json!("57")), Some(57));
        assert_eq!(parse_index(&json!(0)), Some(0));
        assert_eq!(parse_index(&json!(42.6)), Some(43));
        assert_eq!(parse_index(&json!("-")), None);
        assert_eq!(parse_index(&json!(-3)), None);
        assert_eq!(parse_index(&Value::Null), None);
    }

    #[test]
    fn test_parse_listing() {
        let data = json!([
            {"uid": 7021, "lat": 28.63, "lon": 77.22, "aqi": "154", "station": {"name": "Delhi"}},
            {"uid": "8190", "lat": 19.07, "lon": 72.87, "station": {}},
            {"lat": 1.0, "lon": 2.0, "station": {"name": "No uid"}}
        ]);
        let stations = parse_listing(data).unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].uid, 7021);
        assert_eq!(stations[0].name.as_deref(), Some("Delhi"));
        assert_eq!(stations[0].lat, Some(28.63));
        assert_eq!(stations[1].uid, 8190);
        assert_eq!(stations[1].name, None);
    }

    #[test]
    fn test_parse_listing_rejects_non_array() {
        assert!(parse_listing(json!({"oops": true})).is_err());
    }

    #[test]
    fn test_parse_detail_partial_iaqi() {
        let data = json!({
            "aqi": 112,
            "time": {"s": "2024-11-02 14:00:00"},
            "iaqi": {"pm25": {"v": 112}, "no2": {"v": 18.4}}
        });
        let detail = parse_detail(data).unwrap();

        assert_eq!(detail.aqi, Some(112));
        assert_eq!(detail.observed_at.as_deref(), Some("2024-11-02 14:00:00"));
        assert_eq!(detail.pollutants.pm25, Some(112.0));
        assert_eq!(detail.pollutants.no2, Some(18.4));
        assert_eq!(detail.pollutants.pm10, None);
        assert_eq!(detail.pollutants.o3, None);
    }

    #[test]
    fn test_parse_detail_without_iaqi() {
        let detail = parse_detail(json!({"aqi": "-"})).unwrap();
        assert_eq!(detail.aqi, None);
        assert_eq!(detail.pollutants.reported(), 0);
    }

    #[tokio::test]
    async fn test_list_stations_sends_token_and_bounds() {
        let http = CannedClient::new(vec![(
            200,
            json!({"status": "ok", "data": [{"uid": 1, "lat": 10.0, "lon": 70.0, "station": {"name": "A"}}]}),
        )]);
        let client = WaqiClient::with_http("https://waqi.test/", &http);

        let stations = client
            .list_stations(&Credential::new("abc"), &GeoBox::INDIA)
            .await
            .unwrap();

        assert_eq!(stations.len(), 1);
        let urls = http.urls.lock().unwrap();
        assert!(urls[0].starts_with("https://waqi.test/map/bounds?"));
        assert!(urls[0].contains("latlng=6.554,68.176,35.674,97.395"));
        assert!(urls[0].ends_with("token=abc"));
    }

    #[tokio::test]
    async fn test_station_detail_url() {
        let http = CannedClient::new(vec![(200, json!({"status": "ok", "data": {"aqi": 33}}))]);
        let client = WaqiClient::with_http("https://waqi.test", &http);

        let detail = client
            .station_detail(&Credential::new("abc"), 4242)
            .await
            .unwrap();

        assert_eq!(detail.aqi, Some(33));
        assert_eq!(
            http.urls.lock().unwrap()[0],
            "https://waqi.test/feed/@4242/?token=abc"
        );
    }

    #[tokio::test]
    async fn test_http_500_is_an_error() {
        let http = CannedClient::new(vec![(500, json!("boom"))]);
        let client = WaqiClient::with_http("https://waqi.test", &http);

        let result = client
            .list_stations(&Credential::new("abc"), &GeoBox::INDIA)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_error_envelope_is_an_error() {
        let http = CannedClient::new(vec![(200, json!({"status": "error", "data": "Invalid key"}))]);
        let client = WaqiClient::with_http("https://waqi.test", &http);

        let err = client
            .station_detail(&Credential::new("bad"), 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid key"));
    }
}
