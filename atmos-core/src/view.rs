//! View model construction.
//!
//! [`build`] is a pure function of (payload, place, unit system): it resolves
//! every number into its final display string, computes the derived comfort
//! metrics and gauge percentages, and assembles hourly tiles, daily rows and
//! insight tips. It never mutates the payload, so the same payload can be
//! rendered under both unit systems. Persisting the result is the caller's
//! job, not this module's.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::condition::{self, Category};
use crate::error::WeatherError;
use crate::metrics::{self, Comfort};
use crate::model::{DailySummary, ForecastPayload, Place, UnitSystem};
use crate::units::{self, UNKNOWN};

/// Number of hourly tiles shown from the resolved current index onward.
const HOURLY_TILE_COUNT: usize = 24;
/// Maximum number of insight tips.
const MAX_INSIGHTS: usize = 5;
/// Daily/hourly precipitation probability at or above which the rain-gear
/// tip is emitted.
const RAIN_RISK_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: String,
    /// Condition phrase, e.g. "Partly cloudy".
    pub summary: String,
    /// "Feels like 31°C • Day"
    pub feels_like: String,
    /// "14 km/h NNE"
    pub wind: String,
    pub humidity: String,
    pub precipitation: String,
    pub uv_index: String,
    pub visibility: String,
    pub pressure: String,
    pub category: Category,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayRange {
    /// "Min 12°C"
    pub min: String,
    /// "Max 24°C"
    pub max: String,
    /// Where the current temperature sits on today's min..max span, 0–100.
    pub position_pct: f64,
}

/// Fixed-scale progress percentages for the signal meters, all 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gauges {
    pub heat_index_pct: f64,
    pub dew_point_pct: f64,
    pub cloud_cover_pct: f64,
    pub precipitation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub heat_index: String,
    pub dew_point: String,
    /// Comfort phrase derived from the dew point.
    pub comfort: String,
    pub cloud_cover: String,
    /// Precipitation probability for the next hour.
    pub next_hour_precipitation: String,
    pub gauges: Gauges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTile {
    /// "13:00"
    pub time: String,
    pub temperature: String,
    pub category: Category,
    pub icon: String,
    /// "45% rain"
    pub precipitation: String,
    pub wind: String,
    /// "Feels 19°C"
    pub feels_like: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    /// "Today" for the first row, then an abbreviated weekday.
    pub label: String,
    pub summary: String,
    pub high: String,
    pub low: String,
    /// "70% • 3.2 mm"
    pub precipitation: String,
    pub wind: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub icon: String,
    pub title: String,
    pub text: String,
}

/// Fully resolved, unit-aware snapshot ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub place_label: String,
    /// "Wednesday, May 1 • Local time 13:00"
    pub meta_line: String,
    pub units: UnitSystem,
    pub current: CurrentConditions,
    pub today: TodayRange,
    /// "Sunrise 06:12 • Sunset 20:41", or the unknown placeholder.
    pub sun_line: String,
    pub signals: Signals,
    pub hourly: Vec<HourlyTile>,
    pub daily: Vec<DailyRow>,
    pub insights: Vec<Insight>,
}

/// Build a display snapshot from a structurally valid payload.
///
/// Fails only with [`WeatherError::InvalidPayload`] when the hourly or daily
/// section is empty; every other irregularity degrades to unknown markers.
pub fn build(
    payload: &ForecastPayload,
    place: &Place,
    units: UnitSystem,
) -> Result<ViewModel, WeatherError> {
    payload.validate()?;

    let current = &payload.current;
    let today = &payload.daily[0];

    let current_idx = payload
        .hourly
        .iter()
        .position(|h| h.time == current.time)
        .unwrap_or(0);

    let is_day = current.is_day.unwrap_or(false);
    let category = Category::from_code(current.weather_code);

    let meta_line = format!(
        "{} • Local time {}",
        current.time.format("%A, %b %-d"),
        current.time.format("%H:%M")
    );

    let current_view = CurrentConditions {
        temperature: units::temperature(current.temperature, units),
        summary: condition::describe(current.weather_code).to_string(),
        feels_like: format!(
            "Feels like {} • {}",
            units::temperature(current.apparent_temperature, units),
            if is_day { "Day" } else { "Night" }
        ),
        wind: format!(
            "{} {}",
            units::wind_speed(current.wind_speed, units),
            units::compass(current.wind_direction)
        ),
        humidity: units::percent(current.relative_humidity),
        precipitation: units::precipitation(Some(current.precipitation.unwrap_or(0.0)), units),
        uv_index: units::one_decimal(current.uv_index),
        visibility: units::visibility(current.visibility, units),
        pressure: units::pressure(current.pressure, units),
        category,
        icon: category.icon_key(is_day).to_string(),
    };

    let today_range = TodayRange {
        min: format!("Min {}", units::temperature(today.temperature_min, units)),
        max: format!("Max {}", units::temperature(today.temperature_max, units)),
        position_pct: range_position(
            today.temperature_min,
            today.temperature_max,
            current.temperature,
        ),
    };

    let sun_line = match (today.sunrise, today.sunset) {
        (Some(sunrise), Some(sunset)) => format!(
            "Sunrise {} • Sunset {}",
            sunrise.format("%H:%M"),
            sunset.format("%H:%M")
        ),
        _ => UNKNOWN.to_string(),
    };

    let next_hour_idx = (current_idx + 1).min(payload.hourly.len() - 1);
    let next_pop = payload.hourly[next_hour_idx]
        .precipitation_probability
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    let dew = metrics::dew_point(current.temperature, current.relative_humidity);
    let heat = metrics::heat_index(current.temperature, current.relative_humidity);

    let signals = Signals {
        heat_index: units::temperature(heat, units),
        dew_point: units::temperature(dew, units),
        comfort: Comfort::from_dew_point(dew)
            .map(|c| c.label().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        cloud_cover: units::percent(current.cloud_cover),
        next_hour_precipitation: units::percent(Some(next_pop)),
        gauges: Gauges {
            heat_index_pct: gauge(heat.map(|v| (v - 20.0) / 25.0 * 100.0)),
            dew_point_pct: gauge(dew.map(|v| v / 26.0 * 100.0)),
            cloud_cover_pct: gauge(current.cloud_cover),
            precipitation_pct: gauge(Some(next_pop)),
        },
    };

    let hourly = payload
        .hourly
        .iter()
        .skip(current_idx)
        .take(HOURLY_TILE_COUNT)
        .map(|obs| {
            let tile_is_day = infer_is_day(&payload.daily, obs.time);
            let tile_category = Category::from_code(obs.weather_code);
            HourlyTile {
                time: obs.time.format("%H:%M").to_string(),
                temperature: units::temperature(obs.temperature, units),
                category: tile_category,
                icon: tile_category.icon_key(tile_is_day).to_string(),
                precipitation: format!(
                    "{} rain",
                    units::percent(Some(obs.precipitation_probability.unwrap_or(0.0)))
                ),
                wind: units::wind_speed(obs.wind_speed, units),
                feels_like: format!("Feels {}", units::temperature(obs.apparent_temperature, units)),
            }
        })
        .collect();

    let daily = payload
        .daily
        .iter()
        .enumerate()
        .map(|(i, day)| DailyRow {
            label: if i == 0 {
                "Today".to_string()
            } else {
                day.date.format("%a").to_string()
            },
            summary: condition::describe(day.weather_code).to_string(),
            high: units::temperature(day.temperature_max, units),
            low: units::temperature(day.temperature_min, units),
            precipitation: format!(
                "{} • {}",
                units::percent(Some(day.precipitation_probability_max.unwrap_or(0.0))),
                units::precipitation(day.precipitation_sum, units)
            ),
            wind: units::wind_speed(day.wind_speed_max, units),
            category: Category::from_code(day.weather_code),
        })
        .collect();

    let insights = build_insights(payload, units);

    Ok(ViewModel {
        place_label: place.label(),
        meta_line,
        units,
        current: current_view,
        today: today_range,
        sun_line,
        signals,
        hourly,
        daily,
        insights,
    })
}

/// Position of `now` on the `min..max` span, clamped to 0–100. The span is
/// floored at one degree so a flat day cannot divide by zero.
fn range_position(min: Option<f64>, max: Option<f64>, now: Option<f64>) -> f64 {
    let (Some(min), Some(max), Some(now)) = (min, max, now) else {
        return 0.0;
    };
    if !min.is_finite() || !max.is_finite() || !now.is_finite() {
        return 0.0;
    }
    let span = (max - min).max(1.0);
    ((now - min) / span * 100.0).clamp(0.0, 100.0)
}

fn gauge(value: Option<f64>) -> f64 {
    match value.filter(|v| v.is_finite()) {
        Some(v) => v.clamp(0.0, 100.0),
        None => 0.0,
    }
}

/// Daylight for an hourly tile, from the matching day's sunrise/sunset.
/// Unknown sun times default to day.
fn infer_is_day(daily: &[DailySummary], time: NaiveDateTime) -> bool {
    let idx = daily
        .iter()
        .position(|d| d.date == time.date())
        .unwrap_or(0);
    match daily.get(idx).map(|d| (d.sunrise, d.sunset)) {
        Some((Some(sunrise), Some(sunset))) => time >= sunrise && time < sunset,
        _ => true,
    }
}

/// Ordered tip list: precipitation risk first, then UV, then wind. A fixed
/// rule list capped at [`MAX_INSIGHTS`]; missing inputs drop a tip silently.
fn build_insights(payload: &ForecastPayload, units: UnitSystem) -> Vec<Insight> {
    let today = &payload.daily[0];
    let current = &payload.current;

    let peak_24h = payload
        .hourly
        .iter()
        .take(HOURLY_TILE_COUNT)
        .map(|h| h.precipitation_probability.filter(|v| v.is_finite()).unwrap_or(0.0))
        .fold(0.0_f64, f64::max);
    let today_pop = today
        .precipitation_probability_max
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    let mut tips = Vec::new();

    let combined = today_pop.max(peak_24h);
    if combined >= RAIN_RISK_THRESHOLD {
        tips.push(Insight {
            icon: "umbrella".to_string(),
            title: "Carry rain protection".to_string(),
            text: format!(
                "High precipitation risk today (up to {}%).",
                combined.round() as i64
            ),
        });
    } else {
        tips.push(Insight {
            icon: "spark".to_string(),
            title: "Low precipitation risk".to_string(),
            text: format!(
                "Peak probability in the next 24h is about {}%.",
                peak_24h.round() as i64
            ),
        });
    }

    if let Some(uv_max) = today.uv_index_max.filter(|v| v.is_finite()) {
        tips.push(Insight {
            icon: "sun-small".to_string(),
            title: "UV".to_string(),
            text: format!("UV peaks around {uv_max:.1} today."),
        });
    }

    if current.wind_speed.filter(|v| v.is_finite()).is_some() {
        tips.push(Insight {
            icon: "wind".to_string(),
            title: "Wind".to_string(),
            text: format!(
                "Sustained wind around {}.",
                units::wind_speed(current.wind_speed, units)
            ),
        });
    }

    tips.truncate(MAX_INSIGHTS);
    tips
}
