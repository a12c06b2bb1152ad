use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::simulation::{DEFAULT_TURN_CAP, DEFAULT_TURN_EXTENSION, TurnPolicy};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Which side owns the diary collection.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DiaryMode {
    /// Fetched from the report history endpoint.
    #[default]
    Server,
    /// Kept in client storage, keyed per identity.
    Local,
}

/// Root configuration (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub diary_mode: DiaryMode,
    pub initial_turn_cap: u32,
    pub turn_extension: u32,
    pub log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            diary_mode: DiaryMode::default(),
            initial_turn_cap: DEFAULT_TURN_CAP,
            turn_extension: DEFAULT_TURN_EXTENSION,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Applies a backend URL override (env var or CLI flag); blank values
    /// are ignored.
    pub fn with_backend_url(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            self.backend_url = url.to_string();
        }
        self
    }

    /// Backend URL without trailing slashes, falling back to the default
    /// when blank.
    pub fn normalized_backend_url(&self) -> String {
        let trimmed = self.backend_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            DEFAULT_BACKEND_URL.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Turn policy; a zero cap or extension falls back to the default.
    pub fn turn_policy(&self) -> TurnPolicy {
        let defaults = TurnPolicy::default();
        TurnPolicy {
            initial_cap: if self.initial_turn_cap == 0 {
                defaults.initial_cap
            } else {
                self.initial_turn_cap
            },
            extension: if self.turn_extension == 0 {
                defaults.extension
            } else {
                self.turn_extension
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(r#"diary_mode = "local""#).unwrap();
        assert_eq!(config.diary_mode, DiaryMode::Local);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.turn_policy(), TurnPolicy::default());
    }

    #[test]
    fn test_backend_url_override_and_normalization() {
        let config = AppConfig::default().with_backend_url(Some("https://api.example.com//"));
        assert_eq!(config.normalized_backend_url(), "https://api.example.com");

        let config = AppConfig::default().with_backend_url(Some("   "));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_zero_turn_settings_fall_back() {
        let config = AppConfig {
            initial_turn_cap: 0,
            turn_extension: 3,
            ..AppConfig::default()
        };
        let policy = config.turn_policy();
        assert_eq!(policy.initial_cap, 10);
        assert_eq!(policy.extension, 3);
    }

    #[test]
    fn test_diary_mode_parses_case_insensitively() {
        assert_eq!("LOCAL".parse::<DiaryMode>().unwrap(), DiaryMode::Local);
        assert_eq!(DiaryMode::Server.to_string(), "server");
    }
}
