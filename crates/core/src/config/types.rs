use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub radarr: RadarrConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub command: CommandConfig,
}

/// Connection settings for the remote Radarr instance
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadarrConfig {
    /// Base URL (e.g., "http://localhost:7878"), without the `/api/v3` suffix
    pub url: String,
    /// Radarr API key
    pub api_key: String,
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Verify TLS certificates (default: true)
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

impl RadarrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }
}

fn default_timeout() -> u32 {
    120
}

fn default_true() -> bool {
    true
}

/// Discovery engine settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Only consider monitored items.
    #[serde(default = "default_true")]
    pub monitored_only: bool,

    /// Extra attempts per listing page before the scan is abandoned.
    #[serde(default = "default_retries_per_page")]
    pub retries_per_page: u32,

    /// Delay between page attempts (milliseconds). Doubled after a timeout.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Page size of the full cutoff-unmet scan.
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: u32,

    /// Page size used by the random sampler.
    #[serde(default = "default_sample_page_size")]
    pub sample_page_size: u32,

    /// How many items the random sampler should return.
    #[serde(default = "default_sample_count")]
    pub random_sample_count: usize,

    /// Sample a random page instead of scanning the whole listing.
    #[serde(default = "default_true")]
    pub random_selection: bool,

    /// Concurrent movie file lookups in the CF gap detector (1 = sequential).
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

impl DiscoveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_retries_per_page() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    3000
}

fn default_scan_page_size() -> u32 {
    1000
}

fn default_sample_page_size() -> u32 {
    100
}

fn default_sample_count() -> usize {
    1
}

fn default_detail_concurrency() -> usize {
    1
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            monitored_only: true,
            retries_per_page: default_retries_per_page(),
            retry_delay_ms: default_retry_delay(),
            scan_page_size: default_scan_page_size(),
            sample_page_size: default_sample_page_size(),
            random_sample_count: default_sample_count(),
            random_selection: true,
            detail_concurrency: default_detail_concurrency(),
        }
    }
}

/// Search command polling settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandConfig {
    /// Delay between status checks (milliseconds).
    #[serde(default = "default_poll_delay")]
    pub poll_delay_ms: u64,
    /// Maximum number of status checks before giving up.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
}

impl CommandConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }
}

fn default_poll_delay() -> u64 {
    1000
}

fn default_poll_max_attempts() -> u32 {
    600
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            poll_delay_ms: default_poll_delay(),
            poll_max_attempts: default_poll_max_attempts(),
        }
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub radarr: SanitizedRadarrConfig,
    pub discovery: DiscoveryConfig,
    pub command: CommandConfig,
}

/// Sanitized Radarr config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRadarrConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub verify_ssl: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            radarr: SanitizedRadarrConfig {
                url: config.radarr.url.clone(),
                api_key_configured: !config.radarr.api_key.is_empty(),
                timeout_secs: config.radarr.timeout_secs,
                verify_ssl: config.radarr.verify_ssl,
            },
            discovery: config.discovery.clone(),
            command: config.command.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let toml = r#"
[radarr]
url = "http://localhost:7878"
api_key = "key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.radarr.timeout_secs, 120);
        assert!(config.radarr.verify_ssl);
        assert!(config.discovery.monitored_only);
        assert_eq!(config.discovery.retries_per_page, 2);
        assert_eq!(config.discovery.retry_delay(), Duration::from_secs(3));
        assert_eq!(config.discovery.scan_page_size, 1000);
        assert_eq!(config.discovery.sample_page_size, 100);
        assert_eq!(config.discovery.detail_concurrency, 1);
        assert_eq!(config.command.poll_delay(), Duration::from_secs(1));
        assert_eq!(config.command.poll_max_attempts, 600);
    }

    #[test]
    fn test_deserialize_missing_radarr_fails() {
        let toml = r#"
[command]
poll_delay_ms = 10
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
[radarr]
url = "https://radarr.local"
api_key = "key"
verify_ssl = false

[discovery]
monitored_only = false
random_sample_count = 10
random_selection = false
detail_concurrency = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.radarr.verify_ssl);
        assert!(!config.discovery.monitored_only);
        assert_eq!(config.discovery.random_sample_count, 10);
        assert!(!config.discovery.random_selection);
        assert_eq!(config.discovery.detail_concurrency, 4);
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let config = Config {
            radarr: RadarrConfig {
                url: "http://localhost:7878".to_string(),
                api_key: "secret-key".to_string(),
                timeout_secs: 60,
                verify_ssl: true,
            },
            discovery: DiscoveryConfig::default(),
            command: CommandConfig::default(),
        };

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.radarr.api_key_configured);
        assert_eq!(sanitized.radarr.timeout_secs, 60);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }
}
