//! OpenAI-compatible structured generation backend.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use venue_core::{defaults, Error, GenerationBackend, Result, StructuredRequest};

use super::error::{to_venue_error, OpenAIErrorCode};
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for extraction.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            model: defaults::GEN_MODEL.to_string(),
            timeout_seconds: defaults::MODEL_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    /// | `OPENAI_API_KEY` | (none) |
    /// | `OPENAI_MODEL` | `gpt-4o-mini` |
    /// | `OPENAI_TIMEOUT` | `60` |
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| defaults::GEN_MODEL.to_string()),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::MODEL_TIMEOUT_SECS),
        }
    }
}

/// OpenAI-compatible backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.model,
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Attach authentication if configured.
    fn authorize(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req
    }

    /// Map a non-success response onto a classified error.
    async fn error_from_response(response: reqwest::Response) -> Error {
        let status = response.status();
        let body: OpenAIErrorResponse = response
            .json()
            .await
            .unwrap_or_else(|_| OpenAIErrorResponse::unknown());
        let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
        to_venue_error(code, &format!("{} {}", status, body.error.message))
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String> {
        debug!(
            subsystem = "inference",
            component = "openai",
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            "Structured generation"
        );

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(request.system.clone()),
                ChatMessage::user(request.prompt.clone()),
            ],
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            response_format: Some(ResponseFormat::json_schema(
                request.schema_name.clone(),
                request.schema.clone(),
            )),
        };

        let response = self
            .authorize(self.client.post(self.url("/chat/completions")))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(response_len = content.len(), "Generation complete");
        Ok(content)
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .authorize(self.client.get(self.url("/models")))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(status = %resp.status(), "OpenAI health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "OpenAI health check error");
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
