//! Path management for TimeMachine configuration and data.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/timemachine/       # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/timemachine/  # Data directory
//! └── store/                   # Key-value files (identity, diaries)
//! ```

use std::path::{Path, PathBuf};

use timemachine_core::error::{Result, TimeMachineError};

const APP_DIR: &str = "timemachine";

/// Resolved directories, with optional overrides for either root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMachinePaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl TimeMachinePaths {
    /// Platform directories (`dirs`), each replaced by its override when given.
    pub fn resolve(config_override: Option<&Path>, data_override: Option<&Path>) -> Result<Self> {
        let config_dir = match config_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or_else(|| TimeMachineError::config("Cannot find config directory"))?
                .join(APP_DIR),
        };
        let data_dir = match data_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir()
                .ok_or_else(|| TimeMachineError::config("Cannot find data directory"))?
                .join(APP_DIR),
        };
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Root of the file-backed key-value store.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Same config dir, data dir replaced.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let paths = TimeMachinePaths::resolve(
            Some(Path::new("/tmp/tm-config")),
            Some(Path::new("/tmp/tm-data")),
        )
        .unwrap();
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/tm-config/config.toml"));
        assert_eq!(paths.store_dir(), PathBuf::from("/tmp/tm-data/store"));
    }

    #[test]
    fn test_with_data_dir() {
        let paths = TimeMachinePaths::resolve(Some(Path::new("/c")), Some(Path::new("/d")))
            .unwrap()
            .with_data_dir("/elsewhere");
        assert_eq!(paths.data_dir(), Path::new("/elsewhere"));
        assert_eq!(paths.config_dir(), Path::new("/c"));
    }
}
