mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;

async fn get<C: HttpClient>(client: &C, url: &str) -> Result<reqwest::Response> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid URL '{url}'"))?,
    );

    // The token rides in the query string; keep it out of error messages.
    let resp = client.execute(req).await.map_err(|e| e.without_url())?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("HTTP error: {} {}", status, body);
    }
    Ok(resp)
}

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let resp = get(client, url).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// GETs `url` and decodes the JSON body. Non-2xx responses are errors.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: &str) -> Result<T> {
    let bytes = fetch_bytes(client, url).await?;
    serde_json::from_slice(&bytes).context("Parse error: response is not the expected JSON")
}
