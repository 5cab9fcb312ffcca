//! Image adapter with a two-tier fallback chain.
//!
//! Tier 1 calls the configured image-generation API and returns the image as a
//! data URI. Any failure there (missing credential, transport error, timeout,
//! non-success status, unusable payload) moves on to tier 2, which builds a URL
//! against a keyless renderer. Tier 2 cannot fail, so `generate` always
//! returns `Ok`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{is_configured, ImageProviderConfig};
use crate::metrics::IMAGE_FALLBACKS;

use super::traits::{Adapter, AdapterError};
use super::types::{AdapterDescriptor, AdapterKind, GenerationResult};

/// Note attached to results produced by the fallback renderer.
pub const FALLBACK_NOTE: &str = "fallback used";

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Why the primary tier did not produce an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryFailure {
    /// No credential configured; the tier was not attempted.
    NoCredential,
    /// Request exceeded the configured timeout.
    Timeout,
    /// Connection or transport error.
    Transport(String),
    /// Upstream answered with a non-success status.
    Status(u16),
    /// Success status but no usable image payload.
    Malformed(String),
}

impl PrimaryFailure {
    /// Short label used in metrics.
    pub fn cause(&self) -> &'static str {
        match self {
            PrimaryFailure::NoCredential => "no_credential",
            PrimaryFailure::Timeout => "timeout",
            PrimaryFailure::Transport(_) => "transport",
            PrimaryFailure::Status(_) => "status",
            PrimaryFailure::Malformed(_) => "malformed",
        }
    }
}

impl std::fmt::Display for PrimaryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryFailure::NoCredential => write!(f, "no credential configured"),
            PrimaryFailure::Timeout => write!(f, "timed out"),
            PrimaryFailure::Transport(e) => write!(f, "transport error: {}", e),
            PrimaryFailure::Status(status) => write!(f, "HTTP {}", status),
            PrimaryFailure::Malformed(e) => write!(f, "malformed response: {}", e),
        }
    }
}

/// Image adapter: primary generation API, then keyless fallback renderer.
pub struct ImageAdapter {
    descriptor: AdapterDescriptor,
    client: Client,
    api_key: Option<String>,
    api_base: String,
    fallback_url: String,
}

impl ImageAdapter {
    pub fn from_config(config: &ImageProviderConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AdapterError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            descriptor: AdapterDescriptor::new(&config.model, &config.provider, AdapterKind::Image),
            client,
            api_key: config.api_key.clone().filter(|_| is_configured(&config.api_key)),
            api_base: config.api_base.clone(),
            fallback_url: config.fallback_url.clone(),
        })
    }

    /// Whether the primary tier will be attempted.
    pub fn has_primary(&self) -> bool {
        self.api_key.is_some()
    }

    fn predict_url(&self) -> String {
        format!(
            "{}/models/{}:predict",
            self.api_base.trim_end_matches('/'),
            self.descriptor.name
        )
    }

    /// Tier 1. Returns the data URI or the reason it could not produce one.
    pub async fn generate_primary(&self, prompt: &str) -> Result<String, PrimaryFailure> {
        let api_key = self.api_key.as_ref().ok_or(PrimaryFailure::NoCredential)?;

        let body = PredictRequest {
            instances: vec![PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1",
            },
        };

        let response = self
            .client
            .post(self.predict_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrimaryFailure::Status(status.as_u16()));
        }

        let predict: PredictResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                PrimaryFailure::Timeout
            } else {
                PrimaryFailure::Malformed(e.to_string())
            }
        })?;

        let prediction = predict
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| PrimaryFailure::Malformed("no predictions".to_string()))?;
        let encoded = prediction
            .bytes_base64_encoded
            .ok_or_else(|| PrimaryFailure::Malformed("prediction has no image bytes".to_string()))?;

        to_data_uri(&encoded, image_mime(prediction.mime_type.as_deref()))
    }

    /// Tier 2. Pure URL construction against the keyless renderer.
    pub fn fallback_image_url(&self, prompt: &str) -> String {
        format!(
            "{}/{}",
            self.fallback_url.trim_end_matches('/'),
            urlencoding::encode(prompt)
        )
    }
}

#[async_trait]
impl Adapter for ImageAdapter {
    fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult, AdapterError> {
        let failure = match self.generate_primary(prompt).await {
            Ok(data_uri) => return Ok(GenerationResult::image(data_uri)),
            Err(failure) => failure,
        };

        if failure == PrimaryFailure::NoCredential {
            info!("Image credential not configured, using fallback renderer");
        } else {
            warn!(
                provider = %self.descriptor.provider,
                cause = failure.cause(),
                "Primary image generation failed ({}), switching to fallback",
                failure
            );
        }
        IMAGE_FALLBACKS.with_label_values(&[failure.cause()]).inc();

        Ok(GenerationResult::image_with_note(
            self.fallback_image_url(prompt),
            FALLBACK_NOTE,
        ))
    }
}

fn classify_transport_error(err: reqwest::Error) -> PrimaryFailure {
    if err.is_timeout() {
        PrimaryFailure::Timeout
    } else {
        PrimaryFailure::Transport(err.to_string())
    }
}

/// The declared type when it is a plain `image/<subtype>`, else PNG.
fn image_mime(declared: Option<&str>) -> &str {
    declared
        .map(str::trim)
        .filter(|mime| {
            mime.strip_prefix("image/").is_some_and(|subtype| {
                !subtype.is_empty()
                    && subtype
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            })
        })
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Decode the provider payload and re-encode it as a self-contained data URI.
fn to_data_uri(encoded: &str, mime_type: &str) -> Result<String, PrimaryFailure> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| PrimaryFailure::Malformed(format!("invalid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(PrimaryFailure::Malformed("empty image payload".to_string()));
    }
    Ok(format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)))
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter_with(config: ImageProviderConfig) -> ImageAdapter {
        ImageAdapter::from_config(&config).unwrap()
    }

    #[test]
    fn test_fallback_url_escapes_whole_prompt() {
        let adapter = adapter_with(ImageProviderConfig::default());
        assert_eq!(
            adapter.fallback_image_url("a cat & a dog?"),
            "https://image.pollinations.ai/prompt/a%20cat%20%26%20a%20dog%3F"
        );
        assert_eq!(
            adapter.fallback_image_url("50%/off #1"),
            "https://image.pollinations.ai/prompt/50%25%2Foff%20%231"
        );
    }

    #[test]
    fn test_fallback_url_keeps_prompt_casing() {
        let adapter = adapter_with(ImageProviderConfig {
            fallback_url: "http://localhost:1234/prompt/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            adapter.fallback_image_url("Neon City"),
            "http://localhost:1234/prompt/Neon%20City"
        );
    }

    #[test]
    fn test_predict_request_shape() {
        let body = PredictRequest {
            instances: vec![PredictInstance { prompt: "a fox" }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "instances": [{ "prompt": "a fox" }],
                "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
            })
        );
    }

    #[test]
    fn test_predict_url() {
        let adapter = adapter_with(ImageProviderConfig::default());
        assert_eq!(
            adapter.predict_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/imagen-3.0-generate-001:predict"
        );
    }

    #[test]
    fn test_to_data_uri_round_trips_payload() {
        let encoded = STANDARD.encode(b"\x89PNG fake");
        let uri = to_data_uri(&encoded, "image/png").unwrap();
        assert_eq!(uri, format!("data:image/png;base64,{}", encoded));
    }

    #[test]
    fn test_only_image_mime_types_reach_the_data_uri() {
        assert_eq!(image_mime(Some("image/jpeg")), "image/jpeg");
        assert_eq!(image_mime(Some(" image/svg+xml ")), "image/svg+xml");
        assert_eq!(image_mime(None), "image/png");
        assert_eq!(image_mime(Some("text/html")), "image/png");
        assert_eq!(image_mime(Some("image/")), "image/png");
        assert_eq!(image_mime(Some("image/png;charset=x,<b>")), "image/png");

        let encoded = STANDARD.encode(b"\x89PNG fake");
        let uri = to_data_uri(&encoded, image_mime(Some("text/html"))).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_to_data_uri_rejects_bad_payloads() {
        assert!(matches!(
            to_data_uri("not base64!!", "image/png"),
            Err(PrimaryFailure::Malformed(_))
        ));
        assert!(matches!(
            to_data_uri("", "image/png"),
            Err(PrimaryFailure::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_skips_primary() {
        let adapter = adapter_with(ImageProviderConfig::default());
        assert!(!adapter.has_primary());
        assert_eq!(
            adapter.generate_primary("anything").await,
            Err(PrimaryFailure::NoCredential)
        );

        let result = adapter.generate("a red fox").await.unwrap();
        assert_eq!(
            result,
            GenerationResult::image_with_note(
                "https://image.pollinations.ai/prompt/a%20red%20fox",
                FALLBACK_NOTE
            )
        );
    }

    #[tokio::test]
    async fn test_unreachable_primary_falls_back() {
        let adapter = adapter_with(ImageProviderConfig {
            api_key: Some("key".to_string()),
            // Port 9 (discard) on loopback is not expected to accept connections.
            api_base: "http://127.0.0.1:9/v1beta".to_string(),
            connect_timeout_secs: 1,
            timeout_secs: 2,
            ..Default::default()
        });
        assert!(adapter.has_primary());

        let result = adapter.generate("sunset").await.unwrap();
        assert!(result.used_fallback());
        assert_eq!(result.kind(), AdapterKind::Image);
    }

    #[test]
    fn test_failure_causes() {
        assert_eq!(PrimaryFailure::Status(403).cause(), "status");
        assert_eq!(PrimaryFailure::Timeout.cause(), "timeout");
        assert_eq!(PrimaryFailure::Status(403).to_string(), "HTTP 403");
    }
}
