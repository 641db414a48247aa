//! Core library for the `atmos` weather dashboard.
//!
//! This crate defines:
//! - Normalized domain models (observations, daily summaries, places)
//! - Unit conversion and unknown-safe display formatting
//! - Derived comfort metrics (dew point, heat index, comfort class)
//! - WMO condition-code classification
//! - The pure view-model builder consumed by the rendering layer
//! - A single-slot forecast cache with boot/explicit read policies
//! - Provider adapters (Open-Meteo, OpenWeather) and geocoding
//! - Configuration & credentials handling
//!
//! It is used by `atmos-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod condition;
pub mod config;
pub mod error;
pub mod geocode;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod units;
pub mod view;

pub use cache::ForecastCache;
pub use condition::Category;
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use geocode::GeocodingClient;
pub use metrics::Comfort;
pub use model::{CacheEntry, DailySummary, ForecastPayload, Place, RawObservation, UnitSystem};
pub use provider::{ForecastProvider, ProviderId};
pub use view::ViewModel;
