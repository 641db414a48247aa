//! Forward and reverse geocoding via the Open-Meteo geocoding API (no key).

use reqwest::Client;
use serde::Deserialize;

use crate::error::{WeatherError, truncate_body};
use crate::model::Place;

const SEARCH_ENDPOINT: &str = "https://geocoding-api.open-meteo.com/v1/search";
const REVERSE_ENDPOINT: &str = "https://geocoding-api.open-meteo.com/v1/reverse";
const SEARCH_COUNT: &str = "7";

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    search_url: String,
    reverse_url: String,
    http: Client,
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingClient {
    pub fn new() -> Self {
        Self {
            search_url: SEARCH_ENDPOINT.to_string(),
            reverse_url: REVERSE_ENDPOINT.to_string(),
            http: Client::new(),
        }
    }

    /// Point both endpoints at a different host (tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            search_url: format!("{base_url}/v1/search"),
            reverse_url: format!("{base_url}/v1/reverse"),
            http: Client::new(),
        }
    }

    /// Name search, up to seven candidates. An empty result list is a valid
    /// outcome; the caller decides whether that is a "not found" condition.
    pub async fn search(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
        let res = self
            .http
            .get(&self.search_url)
            .query(&[
                ("name", query),
                ("count", SEARCH_COUNT),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        parse_places(res).await
    }

    /// Nearest named place for a coordinate pair, if any.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<Place>, WeatherError> {
        let res = self
            .http
            .get(&self.reverse_url)
            .query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let mut places = parse_places(res).await?;
        if places.is_empty() {
            Ok(None)
        } else {
            Ok(Some(places.remove(0)))
        }
    }
}

async fn parse_places(res: reqwest::Response) -> Result<Vec<Place>, WeatherError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(WeatherError::Provider {
            provider: "open-meteo geocoding",
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    let parsed: GeoResponse = serde_json::from_str(&body).map_err(|e| WeatherError::Decode {
        context: "geocoding JSON",
        message: e.to_string(),
    })?;

    Ok(parsed
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|r| Place {
            name: r.name,
            region: r.admin1.filter(|s| !s.is_empty()),
            country: r.country.filter(|s| !s.is_empty()),
            latitude: r.latitude,
            longitude: r.longitude,
            timezone: r.timezone.unwrap_or_else(|| "auto".to_string()),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    admin1: Option<String>,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    results: Option<Vec<GeoResult>>,
}
