use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Display unit system. Raw values are always stored in canonical metric
/// units; imperial is a formatting-time conversion only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric (c), imperial (f)."
            )),
        }
    }
}

/// One instant's measurements in canonical metric units.
///
/// Every measurement is optional: providers routinely omit fields, and an
/// absent value must flow through the formatting layer as "unknown" rather
/// than aborting the build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Zone-local timestamp, as reported by the provider.
    pub time: NaiveDateTime,
    /// Air temperature, °C.
    pub temperature: Option<f64>,
    /// Apparent ("feels like") temperature, °C.
    pub apparent_temperature: Option<f64>,
    /// Relative humidity, percent.
    pub relative_humidity: Option<f64>,
    /// Wind speed, km/h.
    pub wind_speed: Option<f64>,
    /// Wind direction, degrees.
    pub wind_direction: Option<f64>,
    /// Precipitation amount, mm.
    pub precipitation: Option<f64>,
    /// Precipitation probability, percent.
    pub precipitation_probability: Option<f64>,
    /// Cloud cover, percent.
    pub cloud_cover: Option<f64>,
    /// Surface pressure, hPa.
    pub pressure: Option<f64>,
    /// Visibility, meters.
    pub visibility: Option<f64>,
    /// UV index.
    pub uv_index: Option<f64>,
    /// WMO-style condition code.
    pub weather_code: Option<i32>,
    pub is_day: Option<bool>,
}

impl RawObservation {
    pub fn at(time: NaiveDateTime) -> Self {
        Self { time, ..Self::default() }
    }
}

/// One calendar day's aggregate forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    /// Total precipitation, mm.
    pub precipitation_sum: Option<f64>,
    /// Highest hourly precipitation probability, percent.
    pub precipitation_probability_max: Option<f64>,
    /// Highest wind speed, km/h.
    pub wind_speed_max: Option<f64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    pub uv_index_max: Option<f64>,
    /// Representative condition code for the day.
    pub weather_code: Option<i32>,
}

/// Normalized forecast bundle: exactly one current observation, chronological
/// hourly observations, and chronological daily summaries (first entry is
/// today). Produced by a provider adapter, consumed by the view builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub timezone: String,
    pub current: RawObservation,
    pub hourly: Vec<RawObservation>,
    pub daily: Vec<DailySummary>,
}

impl ForecastPayload {
    /// Structural invariant: a payload without hourly or daily data is unfit
    /// for building a view and must be treated as a failed fetch.
    pub fn is_structurally_valid(&self) -> bool {
        !self.hourly.is_empty() && !self.daily.is_empty()
    }

    pub fn validate(&self) -> Result<(), WeatherError> {
        if self.is_structurally_valid() {
            Ok(())
        } else {
            Err(WeatherError::InvalidPayload)
        }
    }
}

/// A resolved location.
///
/// Equality deliberately ignores the timezone: the same place can come back
/// with different timezone strings across geocoding calls, and saved/recent
/// deduplication must not treat those as distinct places.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "auto".to_string()
}

impl Place {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            region: None,
            country: None,
            latitude,
            longitude,
            timezone: default_timezone(),
        }
    }

    /// Display label: "Name, Region, Country" with empty parts dropped.
    pub fn label(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(region) = self.region.as_deref().filter(|s| !s.is_empty()) {
            parts.push(region);
        }
        if let Some(country) = self.country.as_deref().filter(|s| !s.is_empty()) {
            parts.push(country);
        }
        parts.join(", ")
    }
}

impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.region == other.region
            && self.country == other.country
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

/// Single persisted cache slot: the last successfully rendered forecast,
/// stored in canonical metric units so a later unit toggle needs no refetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    pub place: Place,
    pub units: UnitSystem,
    pub payload: ForecastPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    #[test]
    fn payload_without_hourly_is_invalid() {
        let payload = ForecastPayload {
            timezone: "auto".into(),
            current: RawObservation::at(sample_time()),
            hourly: vec![],
            daily: vec![DailySummary::default()],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_without_daily_is_invalid() {
        let payload = ForecastPayload {
            timezone: "auto".into(),
            current: RawObservation::at(sample_time()),
            hourly: vec![RawObservation::at(sample_time())],
            daily: vec![],
        };
        assert!(!payload.is_structurally_valid());
    }

    #[test]
    fn place_equality_ignores_timezone() {
        let mut a = Place::new("Rabat", 34.02, -6.84);
        let mut b = a.clone();
        a.timezone = "Africa/Casablanca".into();
        b.timezone = "auto".into();
        assert_eq!(a, b);
    }

    #[test]
    fn place_equality_is_coordinate_sensitive() {
        let a = Place::new("Springfield", 39.8, -89.6);
        let b = Place::new("Springfield", 37.2, -93.3);
        assert_ne!(a, b);
    }

    #[test]
    fn place_label_drops_empty_parts() {
        let mut p = Place::new("Paris", 48.85, 2.35);
        assert_eq!(p.label(), "Paris");
        p.region = Some("Île-de-France".into());
        p.country = Some("France".into());
        assert_eq!(p.label(), "Paris, Île-de-France, France");
    }

    #[test]
    fn unit_system_parses_short_forms() {
        assert_eq!(UnitSystem::try_from("C").unwrap(), UnitSystem::Metric);
        assert_eq!(UnitSystem::try_from("f").unwrap(), UnitSystem::Imperial);
        assert!(UnitSystem::try_from("kelvin").is_err());
    }
}
