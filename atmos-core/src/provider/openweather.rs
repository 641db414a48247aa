use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{WeatherError, truncate_body};
use crate::model::{DailySummary, ForecastPayload, RawObservation};

use super::ForecastProvider;

const CURRENT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// OpenWeather adapter: a current-conditions call plus the free 5-day/3-hour
/// forecast, pre-aggregated into daily summaries per calendar day.
///
/// OpenWeather's own condition ids are translated to WMO-style codes here so
/// the classifier never sees provider-specific numbering.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    current_url: String,
    forecast_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            current_url: CURRENT_ENDPOINT.to_string(),
            forecast_url: FORECAST_ENDPOINT.to_string(),
            http: Client::new(),
        }
    }

    /// Point both endpoints at a different host (tests).
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            current_url: format!("{base_url}/data/2.5/weather"),
            forecast_url: format!("{base_url}/data/2.5/forecast"),
            http: Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        latitude: f64,
        longitude: f64,
        context: &'static str,
    ) -> Result<T, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", latitude.to_string().as_str()),
                ("lon", longitude.to_string().as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Provider {
                provider: "openweather",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Decode {
            context,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        _timezone: &str,
    ) -> Result<ForecastPayload, WeatherError> {
        let current: OwCurrentResponse = self
            .get_json(&self.current_url, latitude, longitude, "OpenWeather current JSON")
            .await?;
        let forecast: OwForecastResponse = self
            .get_json(&self.forecast_url, latitude, longitude, "OpenWeather forecast JSON")
            .await?;

        normalize(current, forecast)
    }
}

fn normalize(
    current: OwCurrentResponse,
    forecast: OwForecastResponse,
) -> Result<ForecastPayload, WeatherError> {
    let offset = forecast.city.timezone.unwrap_or(current.timezone.unwrap_or(0));

    let sunrise = current.sys.as_ref().and_then(|s| s.sunrise);
    let sunset = current.sys.as_ref().and_then(|s| s.sunset);
    let is_day = match (sunrise, sunset) {
        (Some(rise), Some(set)) => Some(current.dt >= rise && current.dt < set),
        _ => None,
    };

    let current_obs = RawObservation {
        time: local_time(current.dt, offset).ok_or(WeatherError::Decode {
            context: "OpenWeather current timestamp",
            message: current.dt.to_string(),
        })?,
        temperature: current.main.temp,
        apparent_temperature: current.main.feels_like,
        relative_humidity: current.main.humidity,
        wind_speed: current.wind.as_ref().and_then(|w| w.speed).map(ms_to_kmh),
        wind_direction: current.wind.as_ref().and_then(|w| w.deg),
        precipitation: current.rain.as_ref().and_then(|r| r.one_hour),
        precipitation_probability: None,
        cloud_cover: current.clouds.as_ref().and_then(|c| c.all),
        pressure: current.main.pressure,
        visibility: current.visibility,
        uv_index: None,
        weather_code: current.weather.first().map(|w| wmo_from_openweather(w.id)),
        is_day,
    };

    let hourly: Vec<RawObservation> = forecast
        .list
        .iter()
        .filter_map(|entry| {
            Some(RawObservation {
                time: local_time(entry.dt, offset)?,
                temperature: entry.main.temp,
                apparent_temperature: entry.main.feels_like,
                relative_humidity: entry.main.humidity,
                wind_speed: entry.wind.as_ref().and_then(|w| w.speed).map(ms_to_kmh),
                wind_direction: entry.wind.as_ref().and_then(|w| w.deg),
                precipitation: entry.rain.as_ref().and_then(|r| r.three_hours),
                precipitation_probability: entry.pop.map(|p| p * 100.0),
                cloud_cover: entry.clouds.as_ref().and_then(|c| c.all),
                pressure: entry.main.pressure,
                visibility: entry.visibility,
                uv_index: None,
                weather_code: entry.weather.first().map(|w| wmo_from_openweather(w.id)),
                is_day: None,
            })
        })
        .collect();

    let mut daily = summarize_days(&hourly);
    if let Some(first) = daily.first_mut() {
        first.sunrise = forecast
            .city
            .sunrise
            .or(sunrise)
            .and_then(|ts| local_time(ts, offset));
        first.sunset = forecast
            .city
            .sunset
            .or(sunset)
            .and_then(|ts| local_time(ts, offset));
    }

    let payload = ForecastPayload {
        timezone: offset_label(offset),
        current: current_obs,
        hourly,
        daily,
    };
    payload.validate()?;
    Ok(payload)
}

/// Collapse an interval series into one summary per calendar day: min/max
/// temperature, precipitation sum, peak probability, peak wind, and the most
/// frequent condition code as the representative code.
fn summarize_days(hourly: &[RawObservation]) -> Vec<DailySummary> {
    let mut days: Vec<DailySummary> = Vec::new();
    let mut codes_per_day: HashMap<chrono::NaiveDate, Vec<i32>> = HashMap::new();

    for obs in hourly {
        let date = obs.time.date();
        if days.last().map(|d| d.date) != Some(date) {
            days.push(DailySummary {
                date,
                ..DailySummary::default()
            });
        }
        let day = days.last_mut().expect("just pushed");

        day.temperature_min = merge(day.temperature_min, obs.temperature, f64::min);
        day.temperature_max = merge(day.temperature_max, obs.temperature, f64::max);
        day.precipitation_sum = merge(day.precipitation_sum, obs.precipitation.or(Some(0.0)), |a, b| a + b);
        day.precipitation_probability_max = merge(
            day.precipitation_probability_max,
            obs.precipitation_probability,
            f64::max,
        );
        day.wind_speed_max = merge(day.wind_speed_max, obs.wind_speed, f64::max);

        if let Some(code) = obs.weather_code {
            codes_per_day.entry(date).or_default().push(code);
        }
    }

    for day in &mut days {
        day.weather_code = codes_per_day
            .get(&day.date)
            .and_then(|codes| most_frequent(codes));
    }

    days
}

fn merge(acc: Option<f64>, value: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(f(a, v)),
        (None, v) => v,
        (a, None) => a,
    }
}

/// Most frequent code; ties resolve to the earliest-seen code.
fn most_frequent(codes: &[i32]) -> Option<i32> {
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for &code in codes {
        match counts.iter_mut().find(|(c, _)| *c == code) {
            Some((_, n)) => *n += 1,
            None => counts.push((code, 1)),
        }
    }
    let mut best: Option<(i32, usize)> = None;
    for (code, n) in counts {
        if best.is_none_or(|(_, bn)| n > bn) {
            best = Some((code, n));
        }
    }
    best.map(|(code, _)| code)
}

/// OpenWeather condition ids onto the WMO-style table the classifier expects.
fn wmo_from_openweather(id: i32) -> i32 {
    match id {
        200..=299 => 95,
        300..=399 => 53,
        500 | 520 => 61,
        501 | 521 => 63,
        502..=504 | 522 | 531 => 65,
        511 => 67,
        600 => 71,
        601 => 73,
        602 => 75,
        611..=616 => 66,
        620..=622 => 85,
        700..=799 => 45,
        800 => 0,
        801 => 1,
        802 => 2,
        _ => 3, // 803, 804 and anything unexpected read as overcast
    }
}

fn ms_to_kmh(ms: f64) -> f64 {
    ms * 3.6
}

fn local_time(unix: i64, offset_secs: i32) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(unix + i64::from(offset_secs), 0).map(|dt| dt.naive_utc())
}

fn offset_label(offset_secs: i32) -> String {
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.unsigned_abs();
    format!("UTC{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    timezone: Option<i32>,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    rain: Option<OwRain>,
    visibility: Option<f64>,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    rain: Option<OwRain>,
    visibility: Option<f64>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    timezone: Option<i32>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}
