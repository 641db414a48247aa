use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use atmos_core::provider::{default_provider_from_config, provider_from_config};
use atmos_core::{
    Config, ForecastCache, GeocodingClient, Place, ProviderId, UnitSystem, WeatherError, view,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "atmos", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the forecast for a place (or the most recent one).
    Show {
        /// Place name to search for; omit to reuse the most recent place.
        query: Option<String>,

        /// Explicit coordinates "LAT,LON" instead of a name search.
        #[arg(long)]
        coords: Option<String>,

        /// Unit system for this invocation: c/metric or f/imperial.
        #[arg(long)]
        units: Option<String>,

        /// Provider override, e.g. "open-meteo" or "openweather".
        #[arg(long)]
        provider: Option<String>,
    },

    /// Render the last cached forecast without touching the network.
    Cached,

    /// List candidate places for a query.
    Search { query: String },

    /// Configure a provider (API key, default selection).
    Configure {
        /// Provider short name, e.g. "open-meteo" or "openweather".
        provider: String,
    },

    /// Bookmark a place.
    Save { query: String },

    /// List saved and recent places.
    Places,

    /// Remove a saved place by its list position.
    Forget { index: usize },

    /// Set the preferred unit system: c/metric or f/imperial.
    Units { system: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Show {
                query,
                coords,
                units,
                provider,
            } => show(query, coords, units, provider).await,
            Command::Cached => cached(),
            Command::Search { query } => search(&query).await,
            Command::Configure { provider } => configure(&provider),
            Command::Save { query } => save(&query).await,
            Command::Places => places(),
            Command::Forget { index } => forget(index),
            Command::Units { system } => units(&system),
        }
    }
}

async fn show(
    query: Option<String>,
    coords: Option<String>,
    units_arg: Option<String>,
    provider_arg: Option<String>,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let units = match units_arg.as_deref() {
        Some(s) => UnitSystem::try_from(s)?,
        None => config.units,
    };

    let provider = match provider_arg.as_deref() {
        Some(s) => provider_from_config(ProviderId::try_from(s)?, &config)?,
        None => default_provider_from_config(&config)?,
    };

    let cache = ForecastCache::open()?;
    let geocoder = GeocodingClient::new();

    // Resolve the target place; with no explicit target, show any valid
    // cached snapshot immediately and treat the live fetch as a refresh.
    let (mut place, showed_cache) = match (query, coords) {
        (Some(q), _) => (resolve_query(&geocoder, &q).await?, false),
        (None, Some(c)) => (resolve_coords(&geocoder, &c).await?, false),
        (None, None) => {
            let cached_entry = cache.load_or_discard();
            let showed = match &cached_entry {
                Some(entry) => {
                    let vm = view::build(&entry.payload, &entry.place, units)?;
                    render::view(&vm);
                    println!(
                        "\n(cached forecast from {}; refreshing…)",
                        entry.stored_at.format("%Y-%m-%d %H:%M UTC")
                    );
                    true
                }
                None => false,
            };
            let place = config
                .last_place()
                .cloned()
                .or(cached_entry.map(|e| e.place));
            match place {
                Some(p) => (p, showed),
                None => bail!(
                    "No place to show yet. Run `atmos show <city>` or `atmos show --coords LAT,LON` first."
                ),
            }
        }
    };

    let fetched = provider
        .fetch_forecast(place.latitude, place.longitude, &place.timezone)
        .await;

    let payload = match fetched {
        Ok(payload) => payload,
        Err(e) if showed_cache => {
            // A failed background refresh must not blank the cached view.
            eprintln!("Refresh failed ({e}); showing cached data.");
            return Ok(());
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context("Failed to load weather"));
        }
    };

    // Keep the provider-resolved timezone with the place, as with any
    // later cache entry.
    if payload.timezone != "auto" {
        place.timezone = payload.timezone.clone();
    }

    let vm = view::build(&payload, &place, units)?;
    render::view(&vm);

    cache.store(&place, &payload, units)?;
    config.push_recent(&place);
    config.save()?;

    Ok(())
}

fn cached() -> anyhow::Result<()> {
    let cache = ForecastCache::open()?;
    match cache.load() {
        Ok(Some(entry)) => {
            // Restore the unit system and place recorded with the snapshot.
            let vm = view::build(&entry.payload, &entry.place, entry.units)?;
            render::view(&vm);
            println!(
                "\n(cached forecast from {})",
                entry.stored_at.format("%Y-%m-%d %H:%M UTC")
            );
            Ok(())
        }
        Ok(None) => {
            println!("No cached data available yet.");
            Ok(())
        }
        Err(WeatherError::MalformedCache) => {
            println!("Cached data is unusable; run `atmos show` to fetch fresh weather.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn search(query: &str) -> anyhow::Result<()> {
    let geocoder = GeocodingClient::new();
    let results = geocoder.search(query).await?;
    if results.is_empty() {
        println!("No results for \"{query}\". Try \"Rabat\", \"Casablanca\", \"Paris\".");
        return Ok(());
    }
    for place in &results {
        println!(
            "{}  ({:.2}, {:.2})",
            place.label(),
            place.latitude,
            place.longitude
        );
    }
    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = inquire::Text::new(&format!("API key for {id}:"))
            .prompt()
            .context("Configuration aborted")?;
        if api_key.trim().is_empty() {
            bail!("API key cannot be empty.");
        }
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    } else {
        println!("{id} needs no API key.");
    }

    let make_default = inquire::Confirm::new(&format!("Use {id} as the default provider?"))
        .with_default(true)
        .prompt()
        .context("Configuration aborted")?;
    if make_default {
        config.set_default_provider(id);
    }

    config.save()?;
    println!("Saved configuration for {id}.");
    Ok(())
}

async fn save(query: &str) -> anyhow::Result<()> {
    let geocoder = GeocodingClient::new();
    let place = resolve_query(&geocoder, query).await?;
    let mut config = Config::load()?;
    if config.save_place(&place) {
        config.save()?;
        println!("Saved {}.", place.label());
    } else {
        println!("{} is already saved.", place.label());
    }
    Ok(())
}

fn places() -> anyhow::Result<()> {
    let config = Config::load()?;
    if config.saved_places.is_empty() {
        println!("No saved locations yet.");
    } else {
        println!("Saved:");
        for (i, place) in config.saved_places.iter().enumerate() {
            println!("  {i}: {}", place.label());
        }
    }
    if !config.recent_places.is_empty() {
        println!("Recent:");
        for place in &config.recent_places {
            println!("  {}", place.label());
        }
    }
    Ok(())
}

fn forget(index: usize) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    match config.forget_place(index) {
        Some(place) => {
            config.save()?;
            println!("Removed {}.", place.label());
            Ok(())
        }
        None => bail!("No saved place at index {index}. Run `atmos places` to list them."),
    }
}

fn units(system: &str) -> anyhow::Result<()> {
    let units = UnitSystem::try_from(system)?;
    let mut config = Config::load()?;
    config.units = units;
    config.save()?;
    println!("Preferred units set to {units}.");
    Ok(())
}

async fn resolve_query(geocoder: &GeocodingClient, query: &str) -> anyhow::Result<Place> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Place name cannot be empty.");
    }
    let mut results = geocoder.search(query).await?;
    if results.is_empty() {
        return Err(WeatherError::NoResults(query.to_string()).into());
    }
    Ok(results.remove(0))
}

async fn resolve_coords(geocoder: &GeocodingClient, coords: &str) -> anyhow::Result<Place> {
    let (lat, lon) = parse_coords(coords)?;
    // A coordinate pair with no named place nearby is still usable.
    Ok(geocoder
        .reverse(lat, lon)
        .await?
        .unwrap_or_else(|| Place::new("My location", lat, lon)))
}

fn parse_coords(s: &str) -> anyhow::Result<(f64, f64)> {
    let (lat, lon) = s
        .split_once(',')
        .with_context(|| format!("Expected \"LAT,LON\", got '{s}'"))?;
    let lat: f64 = lat.trim().parse().context("Latitude is not a number")?;
    let lon: f64 = lon.trim().parse().context("Longitude is not a number")?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("Coordinates out of range: {lat}, {lon}");
    }
    Ok((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coords_accepts_spaces() {
        assert_eq!(parse_coords("34.02, -6.84").unwrap(), (34.02, -6.84));
    }

    #[test]
    fn parse_coords_rejects_garbage() {
        assert!(parse_coords("nowhere").is_err());
        assert!(parse_coords("34.02;-6.84").is_err());
        assert!(parse_coords("91.0,0.0").is_err());
        assert!(parse_coords("0.0,190.0").is_err());
    }
}
