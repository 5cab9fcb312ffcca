use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, nested with `__` (e.g. `NEXUS_SERVER__PORT`).
pub const ENV_PREFIX: &str = "NEXUS_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(with_env(Figment::new().merge(Toml::file(path))))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(with_env(Figment::new()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn with_env(figment: Figment) -> Figment {
    figment
        // Plain provider variables, as used by existing deployments.
        .merge(
            Env::raw()
                .only(&["GROQ_API_KEY"])
                .map(|_| "providers.text.api_key".into()),
        )
        .merge(
            Env::raw()
                .only(&["GEMINI_API_KEY"])
                .map(|_| "providers.image.api_key".into()),
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
