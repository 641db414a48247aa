use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::model::{Place, UnitSystem};
use crate::provider::ProviderId;

/// Saved-places bookmark cap.
const MAX_SAVED: usize = 12;
/// Recently loaded places cap.
const MAX_RECENT: usize = 10;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "open-meteo" or "openweather".
    pub default_provider: Option<String>,

    /// Preferred display unit system.
    #[serde(default)]
    pub units: UnitSystem,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Bookmarked places, newest first.
    #[serde(default)]
    pub saved_places: Vec<Place>,

    /// Recently loaded places, newest first. The head is the boot location.
    #[serde(default)]
    pub recent_places: Vec<Place>,
}

impl Config {
    /// Default provider as a strongly-typed ProviderId. Open-Meteo is the
    /// keyless out-of-the-box default.
    pub fn default_provider_id(&self) -> ProviderId {
        self.default_provider
            .as_deref()
            .and_then(|s| ProviderId::try_from(s).ok())
            .unwrap_or(ProviderId::OpenMeteo)
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "atmos", "atmos")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }

    /// Record a loaded place at the head of the recent list, deduplicated by
    /// place identity (which ignores timezone), capped at [`MAX_RECENT`].
    pub fn push_recent(&mut self, place: &Place) {
        self.recent_places.retain(|p| p != place);
        self.recent_places.insert(0, place.clone());
        self.recent_places.truncate(MAX_RECENT);
    }

    /// Most recently loaded place, if any.
    pub fn last_place(&self) -> Option<&Place> {
        self.recent_places.first()
    }

    /// Bookmark a place. Returns false if it was already saved.
    pub fn save_place(&mut self, place: &Place) -> bool {
        if self.saved_places.contains(place) {
            return false;
        }
        self.saved_places.insert(0, place.clone());
        self.saved_places.truncate(MAX_SAVED);
        true
    }

    /// Drop a bookmark by its position in the saved list.
    pub fn forget_place(&mut self, index: usize) -> Option<Place> {
        if index < self.saved_places.len() {
            Some(self.saved_places.remove(index))
        } else {
            None
        }
    }
}
