use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{WeatherError, truncate_body};
use crate::model::{DailySummary, ForecastPayload, RawObservation};

use super::ForecastProvider;

const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
const FORECAST_DAYS: &str = "7";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,is_day,\
precipitation,cloud_cover,pressure_msl,wind_speed_10m,wind_direction_10m,weather_code,\
visibility,uv_index";
const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,precipitation_probability,\
precipitation,weather_code,wind_speed_10m,relative_humidity_2m,uv_index,cloud_cover";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
precipitation_sum,precipitation_probability_max,wind_speed_10m_max,sunrise,sunset,uv_index_max";

/// Open-Meteo forecast adapter. No API key required; values arrive already in
/// canonical metric units and zone-local timestamps.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            base_url: FORECAST_ENDPOINT.to_string(),
            http: Client::new(),
        }
    }

    /// Point the adapter at a different endpoint (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<ForecastPayload, WeatherError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("timezone", if timezone.is_empty() { "auto" } else { timezone }),
                ("current", CURRENT_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("daily", DAILY_FIELDS),
                ("forecast_days", FORECAST_DAYS),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Provider {
                provider: "open-meteo",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OmResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Decode {
                context: "Open-Meteo forecast JSON",
                message: e.to_string(),
            })?;

        tracing::debug!(latitude, longitude, "fetched open-meteo forecast");
        normalize(parsed)
    }
}

fn normalize(raw: OmResponse) -> Result<ForecastPayload, WeatherError> {
    let current_time =
        parse_local_time(&raw.current.time).ok_or_else(|| WeatherError::Decode {
            context: "Open-Meteo current timestamp",
            message: raw.current.time.clone(),
        })?;

    let current = RawObservation {
        time: current_time,
        temperature: raw.current.temperature_2m,
        apparent_temperature: raw.current.apparent_temperature,
        relative_humidity: raw.current.relative_humidity_2m,
        wind_speed: raw.current.wind_speed_10m,
        wind_direction: raw.current.wind_direction_10m,
        precipitation: raw.current.precipitation,
        precipitation_probability: None,
        cloud_cover: raw.current.cloud_cover,
        pressure: raw.current.pressure_msl,
        visibility: raw.current.visibility,
        uv_index: raw.current.uv_index,
        weather_code: raw.current.weather_code,
        is_day: raw.current.is_day.map(|v| v != 0),
    };

    let h = &raw.hourly;
    let hourly = h
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, time)| {
            let time = parse_local_time(time)?;
            Some(RawObservation {
                time,
                temperature: col(&h.temperature_2m, i),
                apparent_temperature: col(&h.apparent_temperature, i),
                relative_humidity: col(&h.relative_humidity_2m, i),
                wind_speed: col(&h.wind_speed_10m, i),
                wind_direction: None,
                precipitation: col(&h.precipitation, i),
                precipitation_probability: col(&h.precipitation_probability, i),
                cloud_cover: col(&h.cloud_cover, i),
                pressure: None,
                visibility: None,
                uv_index: col(&h.uv_index, i),
                weather_code: icol(&h.weather_code, i),
                is_day: None,
            })
        })
        .collect();

    let d = &raw.daily;
    let daily = d
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, date)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            Some(DailySummary {
                date,
                temperature_min: col(&d.temperature_2m_min, i),
                temperature_max: col(&d.temperature_2m_max, i),
                precipitation_sum: col(&d.precipitation_sum, i),
                precipitation_probability_max: col(&d.precipitation_probability_max, i),
                wind_speed_max: col(&d.wind_speed_10m_max, i),
                sunrise: scol(&d.sunrise, i).and_then(|s| parse_local_time(&s)),
                sunset: scol(&d.sunset, i).and_then(|s| parse_local_time(&s)),
                uv_index_max: col(&d.uv_index_max, i),
                weather_code: icol(&d.weather_code, i),
            })
        })
        .collect();

    let payload = ForecastPayload {
        timezone: raw.timezone.unwrap_or_else(|| "auto".to_string()),
        current,
        hourly,
        daily,
    };
    payload.validate()?;
    Ok(payload)
}

/// Open-Meteo local timestamps carry no offset and no seconds.
fn parse_local_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

// Parallel-array columns may be absent or shorter than `time`; a missing cell
// is simply an unknown measurement.
fn col(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn icol(values: &[Option<i32>], i: usize) -> Option<i32> {
    values.get(i).copied().flatten()
}

fn scol(values: &[Option<String>], i: usize) -> Option<String> {
    values.get(i).cloned().flatten()
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: String,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    is_day: Option<u8>,
    precipitation: Option<f64>,
    cloud_cover: Option<f64>,
    pressure_msl: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    weather_code: Option<i32>,
    visibility: Option<f64>,
    uv_index: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    uv_index: Vec<Option<f64>>,
    #[serde(default)]
    cloud_cover: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    sunrise: Vec<Option<String>>,
    #[serde(default)]
    sunset: Vec<Option<String>>,
    #[serde(default)]
    uv_index_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    timezone: Option<String>,
    current: OmCurrent,
    #[serde(default)]
    hourly: OmHourly,
    #[serde(default)]
    daily: OmDaily,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FIXTURE: &str = r#"{
        "timezone": "Africa/Casablanca",
        "current": {
            "time": "2024-05-01T13:00",
            "temperature_2m": 21.4,
            "apparent_temperature": 20.1,
            "relative_humidity_2m": 58,
            "is_day": 1,
            "precipitation": 0.0,
            "cloud_cover": 25,
            "pressure_msl": 1016.2,
            "wind_speed_10m": 14.8,
            "wind_direction_10m": 310,
            "weather_code": 2,
            "visibility": 24140.0,
            "uv_index": 6.1
        },
        "hourly": {
            "time": ["2024-05-01T13:00", "2024-05-01T14:00", "2024-05-01T15:00"],
            "temperature_2m": [21.4, 21.9, null],
            "apparent_temperature": [20.1, 20.5, 20.2],
            "precipitation_probability": [5, 10, 15],
            "precipitation": [0.0, 0.0, 0.1],
            "weather_code": [2, 3, null],
            "wind_speed_10m": [14.8, 13.2, 12.0],
            "relative_humidity_2m": [58, 57, 60],
            "uv_index": [6.1, 5.4, 4.0],
            "cloud_cover": [25, 40, 60]
        },
        "daily": {
            "time": ["2024-05-01", "2024-05-02"],
            "weather_code": [2, 61],
            "temperature_2m_max": [23.5, 19.0],
            "temperature_2m_min": [14.2, 12.8],
            "precipitation_sum": [0.0, 4.6],
            "precipitation_probability_max": [15, 80],
            "wind_speed_10m_max": [22.0, 30.5],
            "sunrise": ["2024-05-01T06:21", "2024-05-02T06:20"],
            "sunset": ["2024-05-01T20:02", "2024-05-02T20:03"],
            "uv_index_max": [7.0, 4.5]
        }
    }"#;

    async fn mock_provider(server: &MockServer) -> OpenMeteoProvider {
        OpenMeteoProvider::with_base_url(format!("{}/v1/forecast", server.uri()))
    }

    #[tokio::test]
    async fn parses_forecast_into_normalized_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("timezone", "auto"))
            .and(query_param("forecast_days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
            .mount(&server)
            .await;

        let provider = mock_provider(&server).await;
        let payload = provider.fetch_forecast(33.59, -7.62, "auto").await.unwrap();

        assert_eq!(payload.timezone, "Africa/Casablanca");
        assert_eq!(payload.current.temperature, Some(21.4));
        assert_eq!(payload.current.is_day, Some(true));
        assert_eq!(payload.current.weather_code, Some(2));

        assert_eq!(payload.hourly.len(), 3);
        assert_eq!(payload.hourly[1].precipitation_probability, Some(10.0));
        // JSON nulls in a column become unknown measurements.
        assert_eq!(payload.hourly[2].temperature, None);
        assert_eq!(payload.hourly[2].weather_code, None);

        assert_eq!(payload.daily.len(), 2);
        assert_eq!(payload.daily[1].weather_code, Some(61));
        assert_eq!(
            payload.daily[0].sunrise.unwrap().format("%H:%M").to_string(),
            "06:21"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = mock_provider(&server).await;
        let err = provider.fetch_forecast(0.0, 0.0, "auto").await.unwrap_err();
        match err {
            WeatherError::Provider { provider, status, body } => {
                assert_eq!(provider, "open-meteo");
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_sections_fail_the_payload_invariant() {
        let server = MockServer::start().await;
        let body = r#"{
            "timezone": "auto",
            "current": { "time": "2024-05-01T13:00" },
            "hourly": { "time": [] },
            "daily": { "time": [] }
        }"#;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let provider = mock_provider(&server).await;
        let err = provider.fetch_forecast(0.0, 0.0, "auto").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidPayload));
    }

    #[test]
    fn local_time_parses_with_and_without_seconds() {
        assert!(parse_local_time("2024-05-01T13:00").is_some());
        assert!(parse_local_time("2024-05-01T13:00:00").is_some());
        assert!(parse_local_time("yesterday").is_none());
    }
}
