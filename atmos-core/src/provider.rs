use crate::{Config, ForecastPayload, error::WeatherError};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod open_meteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::OpenWeather]
    }

    /// Open-Meteo serves forecasts without credentials.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: open-meteo, openweather."
            )),
        }
    }
}

/// A source of normalized forecast data. Adapters translate their wire shape
/// into [`ForecastPayload`] so nothing downstream branches on provider
/// identity.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<ForecastPayload, WeatherError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let boxed: Box<dyn ForecastProvider> = match id {
        ProviderId::OpenMeteo => Box::new(open_meteo::OpenMeteoProvider::new()),
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: run `atmos configure {id}` and enter your API key."
                )
            })?;
            Box::new(openweather::OpenWeatherProvider::new(api_key.to_owned()))
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let id = config.default_provider_id();
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn open_meteo_needs_no_key() {
        let cfg = Config::default();
        assert!(provider_from_config(ProviderId::OpenMeteo, &cfg).is_ok());
    }

    #[test]
    fn openweather_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_is_open_meteo_out_of_the_box() {
        let cfg = Config::default();
        let provider = default_provider_from_config(&cfg);
        assert!(provider.is_ok());
    }

    #[test]
    fn default_provider_honors_configured_openweather() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".to_string());
        cfg.set_default_provider(ProviderId::OpenWeather);
        let provider = default_provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
