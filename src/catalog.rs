use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::Value;

use crate::models::Event;
use crate::normalize;

const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:5173/events.json";

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(20))
        .user_agent("CampusFeed/0.1")
        .build()
        .expect("http client")
});

pub fn catalog_url() -> String {
    std::env::var("FEED_CATALOG_URL").unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string())
}

/// One GET of the remote catalog. Non-200 is a hard failure for this load
/// only; callers wanting the feed's degradation use `fetch_catalog_or_empty`.
pub async fn fetch_catalog(url: &str) -> Result<Vec<Event>> {
    let response = CLIENT
        .get(url)
        .send()
        .await
        .with_context(|| format!("request failed for {url}"))?;
    let response = response
        .error_for_status()
        .with_context(|| format!("non-success status for {url}"))?;
    let payload: Value = response
        .json()
        .await
        .with_context(|| format!("unable to decode catalog body for {url}"))?;
    Ok(parse_catalog(&payload))
}

/// Normalize each element of a catalog payload with its source index.
/// Anything that is not an array yields an empty list.
pub fn parse_catalog(payload: &Value) -> Vec<Event> {
    match payload.as_array() {
        Some(items) => items
            .iter()
            .enumerate()
            .map(|(index, raw)| normalize::normalize(raw, index))
            .collect(),
        None => Vec::new(),
    }
}

pub async fn fetch_catalog_or_empty(url: &str) -> Vec<Event> {
    match fetch_catalog(url).await {
        Ok(events) => events,
        Err(err) => {
            eprintln!("catalog load failed: {err:#}");
            Vec::new()
        }
    }
}
