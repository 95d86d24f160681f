use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Radarr URL is set and uses http:// or https://
/// - Radarr API key is set
/// - Page sizes are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let url = config.radarr.url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "radarr.url cannot be empty".to_string(),
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "radarr.url must start with http:// or https:// (got {})",
            url
        )));
    }

    if config.radarr.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "radarr.api_key cannot be empty".to_string(),
        ));
    }

    if config.discovery.scan_page_size == 0 || config.discovery.sample_page_size == 0 {
        return Err(ConfigError::ValidationError(
            "discovery page sizes cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommandConfig, DiscoveryConfig, RadarrConfig};

    fn config_with(url: &str, api_key: &str) -> Config {
        Config {
            radarr: RadarrConfig {
                url: url.to_string(),
                api_key: api_key.to_string(),
                timeout_secs: 120,
                verify_ssl: true,
            },
            discovery: DiscoveryConfig::default(),
            command: CommandConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = config_with("http://localhost:7878", "key");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_missing_url_fails() {
        let err = validate_config(&config_with("", "key")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_url_without_scheme_fails() {
        let err = validate_config(&config_with("localhost:7878", "key")).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validate_missing_api_key_fails() {
        let err = validate_config(&config_with("http://localhost:7878", "  ")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_page_size_fails() {
        let mut config = config_with("http://localhost:7878", "key");
        config.discovery.scan_page_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
