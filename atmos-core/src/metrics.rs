//! Derived comfort metrics: dew point, heat index, humidity comfort class.
//!
//! All functions are total: out-of-domain input yields `None` (propagated by
//! the formatting layer as "unknown"), never a panic.

use serde::{Deserialize, Serialize};

use crate::units::{celsius_to_fahrenheit, fahrenheit_to_celsius};

// Magnus approximation constants.
const MAGNUS_A: f64 = 17.625;
const MAGNUS_B: f64 = 243.04;

/// Dew point in °C from temperature (°C) and relative humidity (%).
///
/// Undefined when either input is non-finite or humidity is zero or below
/// (the log term has no meaning there).
pub fn dew_point(temperature_c: Option<f64>, humidity_pct: Option<f64>) -> Option<f64> {
    let t = temperature_c.filter(|v| v.is_finite())?;
    let rh = humidity_pct.filter(|v| v.is_finite() && *v > 0.0)?;

    let gamma = (rh / 100.0).ln() + (MAGNUS_A * t) / (MAGNUS_B + t);
    Some((MAGNUS_B * gamma) / (MAGNUS_A - gamma))
}

/// Heat index in °C (Rothfusz regression, computed in Fahrenheit).
///
/// Below 80°F or 40% humidity no correction applies and the input
/// temperature is returned unchanged; that threshold is part of the
/// regression's stated domain, not a shortcut.
pub fn heat_index(temperature_c: Option<f64>, humidity_pct: Option<f64>) -> Option<f64> {
    let t = temperature_c.filter(|v| v.is_finite())?;
    let rh = humidity_pct.filter(|v| v.is_finite())?;

    let tf = celsius_to_fahrenheit(t);
    if tf < 80.0 || rh < 40.0 {
        return Some(t);
    }

    let hi_f = -42.379 + 2.049_015_23 * tf + 10.143_331_27 * rh
        - 0.224_755_41 * tf * rh
        - 0.006_837_83 * tf * tf
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * tf * tf * rh
        + 0.000_852_82 * tf * rh * rh
        - 0.000_001_99 * tf * tf * rh * rh;

    Some(fahrenheit_to_celsius(hi_f))
}

/// Ordinal humidity comfort classes over dew point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comfort {
    DryCrisp,
    Comfortable,
    SlightlyHumid,
    Humid,
    Oppressive,
}

impl Comfort {
    /// Classify a dew point (°C). `None` for non-finite input.
    pub fn from_dew_point(dew_point_c: Option<f64>) -> Option<Self> {
        let dp = dew_point_c.filter(|v| v.is_finite())?;
        Some(if dp < 10.0 {
            Comfort::DryCrisp
        } else if dp < 16.0 {
            Comfort::Comfortable
        } else if dp < 20.0 {
            Comfort::SlightlyHumid
        } else if dp < 24.0 {
            Comfort::Humid
        } else {
            Comfort::Oppressive
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Comfort::DryCrisp => "Dry / crisp air",
            Comfort::Comfortable => "Comfortable",
            Comfort::SlightlyHumid => "Slightly humid",
            Comfort::Humid => "Humid",
            Comfort::Oppressive => "Oppressive humidity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dew_point_never_exceeds_temperature() {
        // Physical invariant of the Magnus approximation for RH in (0, 100].
        for t in [-20.0, -5.0, 0.0, 10.0, 25.0, 35.0, 45.0] {
            for rh in [1.0, 10.0, 40.0, 70.0, 100.0] {
                let dp = dew_point(Some(t), Some(rh)).unwrap();
                assert!(
                    dp <= t + 1e-9,
                    "dew point {dp} exceeds temperature {t} at RH {rh}"
                );
            }
        }
    }

    #[test]
    fn dew_point_at_saturation_equals_temperature() {
        let dp = dew_point(Some(20.0), Some(100.0)).unwrap();
        assert!((dp - 20.0).abs() < 1e-9);
    }

    #[test]
    fn dew_point_undefined_outside_domain() {
        assert!(dew_point(None, Some(50.0)).is_none());
        assert!(dew_point(Some(20.0), None).is_none());
        assert!(dew_point(Some(f64::NAN), Some(50.0)).is_none());
        assert!(dew_point(Some(20.0), Some(0.0)).is_none());
        assert!(dew_point(Some(20.0), Some(-5.0)).is_none());
    }

    #[test]
    fn heat_index_passthrough_below_80f() {
        // 26.6°C = 79.88°F, just under the threshold.
        let t = 26.6;
        assert_eq!(heat_index(Some(t), Some(90.0)), Some(t));
        // 26.7°C = 80.06°F, just over: the regression applies.
        let hi = heat_index(Some(26.7), Some(90.0)).unwrap();
        assert!(hi != 26.7);
    }

    #[test]
    fn heat_index_passthrough_below_40_percent() {
        let t = 35.0; // 95°F
        assert_eq!(heat_index(Some(t), Some(39.9)), Some(t));
        let hi = heat_index(Some(t), Some(40.0)).unwrap();
        assert!(hi > t);
    }

    #[test]
    fn heat_index_hot_humid_feels_hotter() {
        // 35°C at 50% humidity must land noticeably above the air temperature.
        let hi = heat_index(Some(35.0), Some(50.0)).unwrap();
        assert!(hi > 37.0, "expected an amplified heat index, got {hi}");
        assert!(hi < 50.0, "heat index out of physiological range: {hi}");
    }

    #[test]
    fn heat_index_undefined_without_inputs() {
        assert!(heat_index(None, Some(50.0)).is_none());
        assert!(heat_index(Some(30.0), Some(f64::INFINITY)).is_none());
    }

    #[test]
    fn comfort_bucket_edges() {
        assert_eq!(Comfort::from_dew_point(Some(9.9)), Some(Comfort::DryCrisp));
        assert_eq!(Comfort::from_dew_point(Some(10.0)), Some(Comfort::Comfortable));
        assert_eq!(Comfort::from_dew_point(Some(15.9)), Some(Comfort::Comfortable));
        assert_eq!(Comfort::from_dew_point(Some(16.0)), Some(Comfort::SlightlyHumid));
        assert_eq!(Comfort::from_dew_point(Some(20.0)), Some(Comfort::Humid));
        assert_eq!(Comfort::from_dew_point(Some(24.0)), Some(Comfort::Oppressive));
        assert_eq!(Comfort::from_dew_point(None), None);
        assert_eq!(Comfort::from_dew_point(Some(f64::NAN)), None);
    }

    #[test]
    fn comfort_is_ordinal() {
        assert!(Comfort::DryCrisp < Comfort::Comfortable);
        assert!(Comfort::Humid < Comfort::Oppressive);
    }
}
