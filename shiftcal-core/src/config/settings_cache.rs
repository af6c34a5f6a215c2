//! Cached configuration with a staleness window.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::ShiftcalConfig;
use crate::error::ShiftcalResult;

pub struct SettingsCache {
    path: PathBuf,
    ttl: Duration,
    entry: Option<(Instant, ShiftcalConfig)>,
}

impl SettingsCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        SettingsCache {
            path: path.into(),
            ttl,
            entry: None,
        }
    }

    /// Cache over the default config location.
    pub fn at_default_path(ttl: Duration) -> ShiftcalResult<Self> {
        Ok(Self::new(ShiftcalConfig::config_path()?, ttl))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached configuration, reloaded when older than the window.
    pub fn get(&mut self) -> ShiftcalResult<&ShiftcalConfig> {
        self.refresh(false)
    }

    /// Reload from disk when stale, or unconditionally with `force`.
    pub fn refresh(&mut self, force: bool) -> ShiftcalResult<&ShiftcalConfig> {
        let entry = match self.entry.take() {
            Some((loaded_at, config)) if !force && loaded_at.elapsed() < self.ttl => {
                (loaded_at, config)
            }
            _ => {
                let config = ShiftcalConfig::load_from(&self.path)?;
                log::debug!("Loaded configuration from {}", self.path.display());
                (Instant::now(), config)
            }
        };

        let (_, config) = self.entry.insert(entry);
        Ok(config)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
