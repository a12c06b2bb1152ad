//! Configuration service implementation.
//!
//! Loads `AppConfig` from `config.toml`, writing the defaults on first run.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use timemachine_core::config::AppConfig;
use timemachine_core::error::{Result, TimeMachineError};

use crate::storage::AtomicFile;

/// Loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    file: AtomicFile,
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicFile::new(path),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the configuration, reading the file on first access.
    ///
    /// A missing file is created with defaults.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Some(cached) = self
            .config
            .read()
            .map_err(|_| TimeMachineError::internal("config cache poisoned"))?
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let loaded = self.load_or_init()?;
        *self
            .config
            .write()
            .map_err(|_| TimeMachineError::internal("config cache poisoned"))? = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) -> Result<()> {
        *self
            .config
            .write()
            .map_err(|_| TimeMachineError::internal("config cache poisoned"))? = None;
        Ok(())
    }

    fn load_or_init(&self) -> Result<AppConfig> {
        match self.file.load()? {
            Some(content) => {
                let config: AppConfig = toml::from_str(&content).map_err(|e| {
                    TimeMachineError::config(format!(
                        "Invalid config at {}: {}",
                        self.file.path().display(),
                        e
                    ))
                })?;
                tracing::info!("Loaded config from {}", self.file.path().display());
                Ok(config)
            }
            None => {
                let config = AppConfig::default();
                self.file.save(&toml::to_string_pretty(&config)?)?;
                tracing::info!("Wrote default config to {}", self.file.path().display());
                Ok(config)
            }
        }
    }
}
