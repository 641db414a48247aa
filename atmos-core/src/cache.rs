//! Single-slot forecast cache.
//!
//! One JSON record per process: the last successfully built forecast together
//! with its place and unit system, always in canonical metric units. Writes
//! overwrite unconditionally. Reads come in two flavors with different
//! malformed-entry behavior:
//!
//! - boot ([`ForecastCache::load_or_discard`]): a malformed slot is deleted
//!   and treated as absent, so a poisoned cache can never wedge startup;
//! - explicit user request ([`ForecastCache::load`]): a malformed slot is
//!   reported as [`WeatherError::MalformedCache`] so the caller can warn.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

use crate::error::WeatherError;
use crate::model::{CacheEntry, ForecastPayload, Place, UnitSystem};

const CACHE_FILE: &str = "last_forecast.json";

#[derive(Debug, Clone)]
pub struct ForecastCache {
    path: PathBuf,
}

impl ForecastCache {
    /// Cache slot in the platform cache directory.
    pub fn open() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "atmos", "atmos")
            .ok_or_else(|| anyhow!("Could not determine platform cache directory"))?;
        Ok(Self {
            path: dirs.cache_dir().join(CACHE_FILE),
        })
    }

    /// Cache slot at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Persist a successfully built forecast, replacing any prior entry.
    pub fn store(
        &self,
        place: &Place,
        payload: &ForecastPayload,
        units: UnitSystem,
    ) -> Result<()> {
        let entry = CacheEntry {
            stored_at: Utc::now(),
            place: place.clone(),
            units,
            payload: payload.clone(),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;

        Ok(())
    }

    /// Boot-time read. Absent slot → `None`. A slot that fails to parse or
    /// fails the payload invariant is deleted and also reported as `None`.
    pub fn load_or_discard(&self) -> Option<CacheEntry> {
        match self.read_validated() {
            Ok(entry) => entry,
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "discarding malformed forecast cache");
                let _ = fs::remove_file(&self.path);
                None
            }
        }
    }

    /// Explicit "use cached data" read. Absent slot → `Ok(None)`; malformed
    /// slot → `Err(MalformedCache)` and the slot is left in place.
    pub fn load(&self) -> Result<Option<CacheEntry>, WeatherError> {
        self.read_validated().map_err(|_| WeatherError::MalformedCache)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove cache file: {}", self.path.display())
            })?;
        }
        Ok(())
    }

    fn read_validated(&self) -> Result<Option<CacheEntry>, WeatherError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|_| WeatherError::MalformedCache)?;
        let entry: CacheEntry =
            serde_json::from_str(&contents).map_err(|_| WeatherError::MalformedCache)?;
        entry.payload.validate()?;
        Ok(Some(entry))
    }
}
