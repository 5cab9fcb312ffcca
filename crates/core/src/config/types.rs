use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    /// User id -> API key. Required when `method = "api_key"`.
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Every request is the anonymous user.
    #[default]
    None,
    /// Requests carry a per-user API key.
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("nexus.db")
}

/// Upstream generation providers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub text: TextProviderConfig,
    #[serde(default)]
    pub image: ImageProviderConfig,
}

/// Fast text completion backend (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextProviderConfig {
    /// Bearer credential. When absent, text requests fail with a configuration error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_text_provider")]
    pub provider: String,
    #[serde(default = "default_text_model")]
    pub model: String,
    #[serde(default = "default_text_api_base")]
    pub api_base: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_text_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for TextProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_text_provider(),
            model: default_text_model(),
            api_base: default_text_api_base(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_text_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_text_provider() -> String {
    "groq".to_string()
}

fn default_text_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_text_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant.".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_text_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}

/// Image generation backend with a keyless fallback renderer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageProviderConfig {
    /// Credential for the primary tier. When absent, the primary tier is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_image_provider")]
    pub provider: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_api_base")]
    pub api_base: String,
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Base URL of the keyless renderer; the escaped prompt is appended as a path segment.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_image_provider(),
            model: default_image_model(),
            api_base: default_image_api_base(),
            timeout_secs: default_image_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            fallback_url: default_fallback_url(),
        }
    }
}

fn default_image_provider() -> String {
    "google-gemini".to_string()
}

fn default_image_model() -> String {
    "imagen-3.0-generate-001".to_string()
}

fn default_image_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_image_timeout() -> u64 {
    30
}

fn default_fallback_url() -> String {
    "https://image.pollinations.ai/prompt".to_string()
}

/// Keyword sets driving prompt classification.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default = "default_code_keywords")]
    pub code_keywords: Vec<String>,
    #[serde(default = "default_image_keywords")]
    pub image_keywords: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            code_keywords: default_code_keywords(),
            image_keywords: default_image_keywords(),
        }
    }
}

// Single-letter and two-letter language names ("c", "go") are left out:
// matching is substring containment, so they would hit almost every prompt.
pub fn default_code_keywords() -> Vec<String> {
    [
        "code",
        "python",
        "function",
        "script",
        "bug",
        "algorithm",
        "c++",
        "java",
        "javascript",
        "html",
        "css",
        "ruby",
        "golang",
        "rust",
        "typescript",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn default_image_keywords() -> Vec<String> {
    [
        "image",
        "generate",
        "draw",
        "create",
        "illustrate",
        "picture",
        "logo",
        "avatar",
        "portrait",
        "scene",
        "render",
        "paint",
        "sketch",
        "photo",
        "photograph",
        "visual",
        "graphic",
        "design",
        "cinematic",
        "4k",
        "8k",
        "ultra hd",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub providers: SanitizedProvidersConfig,
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    /// User ids only; keys are never echoed.
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    pub text: SanitizedTextProviderConfig,
    pub image: SanitizedImageProviderConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTextProviderConfig {
    pub api_key_configured: bool,
    pub provider: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedImageProviderConfig {
    pub api_key_configured: bool,
    pub provider: String,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub fallback_url: String,
}

pub(crate) fn is_configured(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let text = &config.providers.text;
        let image = &config.providers.image;
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                users: config.auth.api_keys.keys().cloned().collect(),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            providers: SanitizedProvidersConfig {
                text: SanitizedTextProviderConfig {
                    api_key_configured: is_configured(&text.api_key),
                    provider: text.provider.clone(),
                    model: text.model.clone(),
                    api_base: text.api_base.clone(),
                    temperature: text.temperature,
                    max_tokens: text.max_tokens,
                    timeout_secs: text.timeout_secs,
                },
                image: SanitizedImageProviderConfig {
                    api_key_configured: is_configured(&image.api_key),
                    provider: image.provider.clone(),
                    model: image.model.clone(),
                    api_base: image.api_base.clone(),
                    timeout_secs: image.timeout_secs,
                    fallback_url: image.fallback_url.clone(),
                },
            },
            routing: config.routing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "nexus.db");
        assert_eq!(config.providers.text.model, "llama-3.3-70b-versatile");
        assert_eq!(config.providers.text.temperature, 0.7);
        assert_eq!(config.providers.text.max_tokens, 1024);
        assert_eq!(config.providers.image.timeout_secs, 30);
        assert!(config.providers.text.api_key.is_none());
        assert!(config.routing.code_keywords.contains(&"python".to_string()));
        assert!(config.routing.image_keywords.contains(&"ultra hd".to_string()));
    }

    #[test]
    fn test_deserialize_api_key_auth() {
        let toml = r#"
[auth]
method = "api_key"

[auth.api_keys]
alice = "key-a"
bob = "key-b"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::ApiKey);
        assert_eq!(config.auth.api_keys.get("alice").unwrap(), "key-a");
        assert_eq!(config.auth.api_keys.len(), 2);
    }

    #[test]
    fn test_deserialize_providers() {
        let toml = r#"
[providers.text]
api_key = "gsk-123"
model = "llama-3.1-8b-instant"
timeout_secs = 20

[providers.image]
fallback_url = "http://localhost:9999/prompt"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.text.api_key.as_deref(), Some("gsk-123"));
        assert_eq!(config.providers.text.model, "llama-3.1-8b-instant");
        assert_eq!(config.providers.text.timeout_secs, 20);
        assert_eq!(config.providers.text.connect_timeout_secs, 5);
        assert_eq!(
            config.providers.image.fallback_url,
            "http://localhost:9999/prompt"
        );
        assert_eq!(config.providers.image.model, "imagen-3.0-generate-001");
    }

    #[test]
    fn test_custom_keywords_replace_defaults() {
        let toml = r#"
[routing]
code_keywords = ["sql"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.routing.code_keywords, vec!["sql".to_string()]);
        assert_eq!(config.routing.image_keywords, default_image_keywords());
    }

    #[test]
    fn test_default_code_keywords_skip_short_tokens() {
        let keywords = default_code_keywords();
        assert!(!keywords.contains(&"c".to_string()));
        assert!(!keywords.contains(&"go".to_string()));
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.auth.method = AuthMethod::ApiKey;
        config
            .auth
            .api_keys
            .insert("alice".to_string(), "super-secret".to_string());
        config.providers.text.api_key = Some("gsk-secret".to_string());
        config.providers.image.api_key = Some("   ".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "api_key");
        assert_eq!(sanitized.auth.users, vec!["alice".to_string()]);
        assert!(sanitized.providers.text.api_key_configured);
        assert!(!sanitized.providers.image.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("gsk-secret"));
    }
}
