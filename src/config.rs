use serde::Deserialize;
use std::path::Path;

use crate::services::format::Locale;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the proxy serving the live map endpoints
    pub base_url: String,
    /// Display language for formatted labels. Defaults to Portuguese.
    #[serde(default)]
    pub locale: Locale,
    /// Polling configuration
    #[serde(default)]
    pub poll: PollConfig,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

/// Polling intervals for the four feeds
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Interval in seconds between vehicle snapshot polls (default: 5)
    #[serde(default = "PollConfig::default_vehicles_interval_secs")]
    pub vehicles_interval_secs: u64,
    /// Interval in seconds between station index polls (default: 240)
    #[serde(default = "PollConfig::default_stations_interval_secs")]
    pub stations_interval_secs: u64,
    /// Interval in seconds between statistics polls (default: 60)
    #[serde(default = "PollConfig::default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    /// Interval in seconds between version checks (default: 30)
    #[serde(default = "PollConfig::default_version_interval_secs")]
    pub version_interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            vehicles_interval_secs: Self::default_vehicles_interval_secs(),
            stations_interval_secs: Self::default_stations_interval_secs(),
            stats_interval_secs: Self::default_stats_interval_secs(),
            version_interval_secs: Self::default_version_interval_secs(),
        }
    }
}

impl PollConfig {
    fn default_vehicles_interval_secs() -> u64 {
        5
    }
    fn default_stations_interval_secs() -> u64 {
        240
    }
    fn default_stats_interval_secs() -> u64 {
        60
    }
    fn default_version_interval_secs() -> u64 {
        30
    }
}

/// HTTP client timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Overall request timeout in seconds (default: 30)
    #[serde(default = "HttpConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds (default: 10)
    #[serde(default = "HttpConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
        }
    }
}

impl HttpConfig {
    fn default_timeout_secs() -> u64 {
        30
    }
    fn default_connect_timeout_secs() -> u64 {
        10
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("base_url: http://localhost:3000").unwrap();
        assert_eq!(config.locale, Locale::Pt);
        assert_eq!(config.poll.vehicles_interval_secs, 5);
        assert_eq!(config.poll.stations_interval_secs, 240);
        assert_eq!(config.poll.stats_interval_secs, 60);
        assert_eq!(config.poll.version_interval_secs, 30);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
base_url: https://livemap.example.net
locale: en
poll:
  vehicles_interval_secs: 10
http:
  connect_timeout_secs: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.poll.vehicles_interval_secs, 10);
        // Unset fields inside a present section still default
        assert_eq!(config.poll.stats_interval_secs, 60);
        assert_eq!(config.http.connect_timeout_secs, 5);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        assert!(serde_yaml::from_str::<Config>("locale: pt").is_err());
    }
}
