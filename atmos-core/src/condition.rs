//! WMO weather-code classification.
//!
//! Maps provider condition codes (normalized to the WMO table by the adapter
//! layer) onto seven display categories plus a human-readable phrase. The
//! mapping is total: unrecognized codes fall back to [`Category::Cloudy`] so
//! a bad code degrades to a generic icon instead of a blank one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clear,
    Partly,
    Cloudy,
    Fog,
    Rain,
    Snow,
    Storm,
}

impl Category {
    /// Classify a WMO-style code. Missing codes take the cloudy fallback too.
    pub fn from_code(code: Option<i32>) -> Self {
        let Some(code) = code else {
            return Category::Cloudy;
        };
        match code {
            0 => Category::Clear,
            1..=2 => Category::Partly,
            3 => Category::Cloudy,
            45 | 48 => Category::Fog,
            51..=67 | 80..=82 => Category::Rain,
            71..=77 | 85..=86 => Category::Snow,
            c if c >= 95 => Category::Storm,
            _ => Category::Cloudy,
        }
    }

    /// Icon selector. Only clear and partly have day/night variants; every
    /// other category is icon-invariant across day and night.
    pub fn icon_key(&self, is_day: bool) -> &'static str {
        match self {
            Category::Clear => {
                if is_day {
                    "sun"
                } else {
                    "moon"
                }
            }
            Category::Partly => {
                if is_day {
                    "partly-day"
                } else {
                    "partly-night"
                }
            }
            Category::Cloudy => "cloud",
            Category::Fog => "fog",
            Category::Rain => "rain",
            Category::Snow => "snow",
            Category::Storm => "storm",
        }
    }
}

/// Human-readable phrase for a WMO code; "Unknown" for anything off-table.
pub fn describe(code: Option<i32>) -> &'static str {
    match code {
        Some(0) => "Clear sky",
        Some(1) => "Mainly clear",
        Some(2) => "Partly cloudy",
        Some(3) => "Overcast",
        Some(45) => "Fog",
        Some(48) => "Rime fog",
        Some(51) => "Light drizzle",
        Some(53) => "Moderate drizzle",
        Some(55) => "Dense drizzle",
        Some(56) => "Freezing drizzle",
        Some(57) => "Dense freezing drizzle",
        Some(61) => "Slight rain",
        Some(63) => "Moderate rain",
        Some(65) => "Heavy rain",
        Some(66) => "Freezing rain",
        Some(67) => "Heavy freezing rain",
        Some(71) => "Slight snow",
        Some(73) => "Moderate snow",
        Some(75) => "Heavy snow",
        Some(77) => "Snow grains",
        Some(80) => "Rain showers",
        Some(81) => "Moderate showers",
        Some(82) => "Violent showers",
        Some(85) => "Snow showers",
        Some(86) => "Heavy snow showers",
        Some(95) => "Thunderstorm",
        Some(96) => "Storm w/ hail",
        Some(99) => "Severe storm w/ hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ranges_classify_as_expected() {
        assert_eq!(Category::from_code(Some(0)), Category::Clear);
        assert_eq!(Category::from_code(Some(1)), Category::Partly);
        assert_eq!(Category::from_code(Some(2)), Category::Partly);
        assert_eq!(Category::from_code(Some(3)), Category::Cloudy);
        assert_eq!(Category::from_code(Some(45)), Category::Fog);
        assert_eq!(Category::from_code(Some(48)), Category::Fog);
        assert_eq!(Category::from_code(Some(51)), Category::Rain);
        assert_eq!(Category::from_code(Some(67)), Category::Rain);
        assert_eq!(Category::from_code(Some(80)), Category::Rain);
        assert_eq!(Category::from_code(Some(82)), Category::Rain);
        assert_eq!(Category::from_code(Some(71)), Category::Snow);
        assert_eq!(Category::from_code(Some(77)), Category::Snow);
        assert_eq!(Category::from_code(Some(85)), Category::Snow);
        assert_eq!(Category::from_code(Some(86)), Category::Snow);
        assert_eq!(Category::from_code(Some(95)), Category::Storm);
        assert_eq!(Category::from_code(Some(99)), Category::Storm);
    }

    #[test]
    fn classification_is_total_over_the_code_space() {
        // Every code in [0, 99] plus an off-table value maps to exactly one
        // category without panicking.
        for code in 0..=99 {
            let _ = Category::from_code(Some(code));
        }
        assert_eq!(Category::from_code(Some(101)), Category::Storm);
        assert_eq!(Category::from_code(Some(42)), Category::Cloudy);
        assert_eq!(Category::from_code(Some(-7)), Category::Cloudy);
        assert_eq!(Category::from_code(None), Category::Cloudy);
    }

    #[test]
    fn only_clear_and_partly_vary_by_daylight() {
        assert_eq!(Category::Clear.icon_key(true), "sun");
        assert_eq!(Category::Clear.icon_key(false), "moon");
        assert_eq!(Category::Partly.icon_key(true), "partly-day");
        assert_eq!(Category::Partly.icon_key(false), "partly-night");
        for cat in [Category::Cloudy, Category::Fog, Category::Rain, Category::Snow, Category::Storm]
        {
            assert_eq!(cat.icon_key(true), cat.icon_key(false));
        }
    }

    #[test]
    fn describe_covers_table_and_falls_back() {
        assert_eq!(describe(Some(0)), "Clear sky");
        assert_eq!(describe(Some(95)), "Thunderstorm");
        assert_eq!(describe(Some(4)), "Unknown");
        assert_eq!(describe(None), "Unknown");
    }
}
