use serde::{Deserialize, Serialize};

pub const CURRENT_CONFIG_VERSION: &str = "v1";

fn default_category_cache_ttl_secs() -> u64 {
    30
}

fn default_tracker_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: String,
    /// TTL for the per-project category cache.
    pub category_cache_ttl_secs: u64,
    /// Request timeout for outbound issue-tracker calls.
    pub tracker_request_timeout_secs: u64,
    /// Used when a user saves a tracker config without a base URL.
    pub default_tracker_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            category_cache_ttl_secs: default_category_cache_ttl_secs(),
            tracker_request_timeout_secs: default_tracker_request_timeout_secs(),
            default_tracker_base_url: None,
        }
    }
}

impl Config {
    /// Parses raw JSON, falling back to defaults when the file is invalid or
    /// carries an unknown version.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str::<Config>(raw) {
            Ok(config) if config.config_version == CURRENT_CONFIG_VERSION => config,
            Ok(config) => {
                tracing::warn!(
                    "Unknown config version {}, resetting to defaults",
                    config.config_version
                );
                Config::default()
            }
            Err(err) => {
                tracing::warn!("Failed to parse config file: {}", err);
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_falls_back_to_defaults() {
        let config = Config::from_raw("{not json");
        assert_eq!(config.category_cache_ttl_secs, 30);
    }

    #[test]
    fn known_version_round_trips() {
        let mut config = Config::default();
        config.category_cache_ttl_secs = 5;
        let raw = serde_json::to_string(&config).unwrap();
        let parsed = Config::from_raw(&raw);
        assert_eq!(parsed.category_cache_ttl_secs, 5);
    }

    #[test]
    fn unknown_version_resets() {
        let raw = r#"{"config_version":"v999","category_cache_ttl_secs":5}"#;
        let parsed = Config::from_raw(raw);
        assert_eq!(parsed.category_cache_ttl_secs, 30);
    }
}
