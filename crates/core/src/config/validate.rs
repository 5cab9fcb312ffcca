use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration.
///
/// Missing provider credentials are accepted here: the text adapter reports
/// them per request and the image adapter degrades to its fallback tier.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.auth.method == AuthMethod::ApiKey {
        if config.auth.api_keys.is_empty() {
            return Err(invalid(
                "auth.api_keys must contain at least one key when method = \"api_key\"",
            ));
        }
        if let Some((user, _)) = config
            .auth
            .api_keys
            .iter()
            .find(|(_, key)| key.trim().is_empty())
        {
            return Err(invalid(format!("auth.api_keys.{} is empty", user)));
        }
    }

    let text = &config.providers.text;
    if !(0.0..=2.0).contains(&text.temperature) {
        return Err(invalid(format!(
            "providers.text.temperature must be between 0.0 and 2.0, got {}",
            text.temperature
        )));
    }
    if text.max_tokens == 0 {
        return Err(invalid("providers.text.max_tokens cannot be 0"));
    }
    if text.timeout_secs == 0 || text.connect_timeout_secs == 0 {
        return Err(invalid("providers.text timeouts cannot be 0"));
    }

    let image = &config.providers.image;
    if image.timeout_secs == 0 || image.connect_timeout_secs == 0 {
        return Err(invalid("providers.image timeouts cannot be 0"));
    }
    if !(image.fallback_url.starts_with("http://") || image.fallback_url.starts_with("https://"))
    {
        return Err(invalid(format!(
            "providers.image.fallback_url must be an http(s) URL, got {:?}",
            image.fallback_url
        )));
    }

    if config.routing.code_keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(invalid("routing.code_keywords cannot be empty"));
    }
    if config.routing.image_keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(invalid("routing.image_keywords cannot be empty"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_api_key_auth_requires_keys() {
        let mut config = Config::default();
        config.auth.method = AuthMethod::ApiKey;
        assert!(validate_config(&config).is_err());

        config
            .auth
            .api_keys
            .insert("alice".to_string(), "key".to_string());
        assert!(validate_config(&config).is_ok());

        config
            .auth
            .api_keys
            .insert("bob".to_string(), " ".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("auth.api_keys.bob"));
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = Config::default();
        config.providers.text.temperature = 3.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.providers.image.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_fallback_url_scheme() {
        let mut config = Config::default();
        config.providers.image.fallback_url = "ftp://images.example/prompt".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_keywords_fail() {
        let mut config = Config::default();
        config.routing.image_keywords = vec![];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_provider_keys_are_valid() {
        let config = Config::default();
        assert!(config.providers.text.api_key.is_none());
        assert!(config.providers.image.api_key.is_none());
        assert!(validate_config(&config).is_ok());
    }
}
