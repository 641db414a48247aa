//! Unit conversion and unknown-safe display formatting.
//!
//! All raw values are canonical metric (°C, km/h, mm, hPa, meters). Every
//! formatter here is total: absent or non-finite input renders as the single
//! [`UNKNOWN`] placeholder, never as `NaN` and never as an error.

use crate::model::UnitSystem;

/// Placeholder rendered for any absent or non-finite value.
pub const UNKNOWN: &str = "—";

const MPH_PER_KMH: f64 = 0.621371;
const MM_PER_INCH: f64 = 25.4;
const INHG_PER_HPA: f64 = 0.029_529_983_071_4;
const MI_PER_KM: f64 = 0.621371;

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Integer-rounded temperature, "18°C" / "64°F".
pub fn temperature(celsius: Option<f64>, units: UnitSystem) -> String {
    match finite(celsius) {
        Some(c) => match units {
            UnitSystem::Metric => format!("{}°C", c.round() as i64),
            UnitSystem::Imperial => format!("{}°F", celsius_to_fahrenheit(c).round() as i64),
        },
        None => UNKNOWN.to_string(),
    }
}

/// Integer-rounded wind speed, "14 km/h" / "9 mph".
pub fn wind_speed(kmh: Option<f64>, units: UnitSystem) -> String {
    match finite(kmh) {
        Some(v) => match units {
            UnitSystem::Metric => format!("{} km/h", v.round() as i64),
            UnitSystem::Imperial => format!("{} mph", (v * MPH_PER_KMH).round() as i64),
        },
        None => UNKNOWN.to_string(),
    }
}

/// One-decimal precipitation, "0.4 mm" / "0.0 in".
pub fn precipitation(mm: Option<f64>, units: UnitSystem) -> String {
    match finite(mm) {
        Some(v) => match units {
            UnitSystem::Metric => format!("{v:.1} mm"),
            UnitSystem::Imperial => format!("{:.1} in", v / MM_PER_INCH),
        },
        None => UNKNOWN.to_string(),
    }
}

/// Integer hPa or one-decimal inHg.
pub fn pressure(hpa: Option<f64>, units: UnitSystem) -> String {
    match finite(hpa) {
        Some(v) => match units {
            UnitSystem::Metric => format!("{} hPa", v.round() as i64),
            UnitSystem::Imperial => format!("{:.1} inHg", v * INHG_PER_HPA),
        },
        None => UNKNOWN.to_string(),
    }
}

/// Visibility from meters, one decimal: "9.6 km" / "6.0 mi".
pub fn visibility(meters: Option<f64>, units: UnitSystem) -> String {
    match finite(meters) {
        Some(v) => {
            let km = v / 1000.0;
            match units {
                UnitSystem::Metric => format!("{km:.1} km"),
                UnitSystem::Imperial => format!("{:.1} mi", km * MI_PER_KM),
            }
        }
        None => UNKNOWN.to_string(),
    }
}

/// Integer-rounded percentage, "62%".
pub fn percent(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{}%", v.round() as i64),
        None => UNKNOWN.to_string(),
    }
}

/// One-decimal unitless value (UV index, coordinates in suggestion lists).
pub fn one_decimal(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{v:.1}"),
        None => UNKNOWN.to_string(),
    }
}

/// Degrees to one of 16 compass labels; 359° wraps back to "N".
pub fn compass(degrees: Option<f64>) -> String {
    match finite(degrees) {
        Some(deg) => {
            let i = ((deg / 22.5).round() as i64).rem_euclid(16) as usize;
            COMPASS[i].to_string()
        }
        None => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_rounds_in_both_systems() {
        assert_eq!(temperature(Some(17.6), UnitSystem::Metric), "18°C");
        // 17.6°C = 63.68°F
        assert_eq!(temperature(Some(17.6), UnitSystem::Imperial), "64°F");
        assert_eq!(temperature(Some(-0.4), UnitSystem::Metric), "0°C");
    }

    #[test]
    fn absent_and_non_finite_render_as_unknown() {
        assert_eq!(temperature(None, UnitSystem::Metric), UNKNOWN);
        assert_eq!(temperature(Some(f64::NAN), UnitSystem::Imperial), UNKNOWN);
        assert_eq!(wind_speed(Some(f64::INFINITY), UnitSystem::Metric), UNKNOWN);
        assert_eq!(precipitation(None, UnitSystem::Metric), UNKNOWN);
        assert_eq!(pressure(Some(f64::NAN), UnitSystem::Metric), UNKNOWN);
        assert_eq!(visibility(None, UnitSystem::Imperial), UNKNOWN);
        assert_eq!(percent(None), UNKNOWN);
        assert_eq!(compass(None), UNKNOWN);
    }

    #[test]
    fn wind_speed_converts_to_mph() {
        // 20 km/h * 0.621371 = 12.43 -> 12 mph
        assert_eq!(wind_speed(Some(20.0), UnitSystem::Imperial), "12 mph");
        assert_eq!(wind_speed(Some(20.0), UnitSystem::Metric), "20 km/h");
    }

    #[test]
    fn precipitation_keeps_one_decimal() {
        assert_eq!(precipitation(Some(3.25), UnitSystem::Metric), "3.2 mm");
        // 25.4 mm = 1.0 in
        assert_eq!(precipitation(Some(25.4), UnitSystem::Imperial), "1.0 in");
    }

    #[test]
    fn pressure_formats_per_system() {
        assert_eq!(pressure(Some(1013.6), UnitSystem::Metric), "1014 hPa");
        // 1013.25 hPa ≈ 29.9 inHg
        assert_eq!(pressure(Some(1013.25), UnitSystem::Imperial), "29.9 inHg");
    }

    #[test]
    fn visibility_converts_meters_first() {
        assert_eq!(visibility(Some(9630.0), UnitSystem::Metric), "9.6 km");
        // 9.63 km * 0.621371 ≈ 5.98 mi
        assert_eq!(visibility(Some(9630.0), UnitSystem::Imperial), "6.0 mi");
    }

    #[test]
    fn compass_boundaries() {
        assert_eq!(compass(Some(0.0)), "N");
        assert_eq!(compass(Some(90.0)), "E");
        assert_eq!(compass(Some(180.0)), "S");
        assert_eq!(compass(Some(270.0)), "W");
        // Wraparound at the 360/0 boundary.
        assert_eq!(compass(Some(359.0)), "N");
        assert_eq!(compass(Some(348.75)), "NNW");
    }

    #[test]
    fn metric_imperial_round_trip_within_tolerance() {
        // Integer-rounded quantities: ±1 unit after a full round trip.
        for kmh in [0.0, 7.0, 33.0, 120.0] {
            let mph = kmh * MPH_PER_KMH;
            let back = mph / MPH_PER_KMH;
            assert!((back - kmh).abs() < 1.0, "wind round trip drifted: {kmh}");
        }
        // One-decimal quantities: ±0.05.
        for mm in [0.0, 0.3, 12.7, 88.9] {
            let inches = mm / MM_PER_INCH;
            let back = inches * MM_PER_INCH;
            assert!((back - mm).abs() < 0.05, "precip round trip drifted: {mm}");
        }
        for hpa in [950.0, 1013.25, 1040.0] {
            let inhg = hpa * INHG_PER_HPA;
            let back = inhg / INHG_PER_HPA;
            assert!((back - hpa).abs() < 0.05, "pressure round trip drifted: {hpa}");
        }
    }
}
