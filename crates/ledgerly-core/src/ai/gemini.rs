//! Gemini backend implementation
//!
//! HTTP client for the Google Generative Language `generateContent`
//! endpoint. Provider failures are classified by HTTP status into the
//! closed `CompletionError` set rather than by matching error text.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionBackend, CompletionError, CompletionOptions};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";

/// Gemini completion backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    host: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            host: DEFAULT_HOST.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create with a custom host (for tests against a stub server)
    pub fn with_host(api_key: &str, model: &str, host: &str) -> Self {
        Self {
            http_client: Client::new(),
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Returns None when `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Option<Self> {
        Self::from_settings(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("GEMINI_MODEL").ok(),
        )
    }

    /// Build from explicit settings; a missing or blank key yields None
    fn from_settings(api_key: Option<String>, model: Option<String>) -> Option<Self> {
        let api_key = api_key?;
        if api_key.trim().is_empty() {
            return None;
        }
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self::new(&api_key, &model))
    }
}

/// Request to the generateContent API
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Response from the generateContent API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.host, self.model
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::Transport(
                "empty completion from provider".to_string(),
            ));
        }

        debug!(model = %self.model, chars = text.len(), "Gemini completion received");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.host
    }
}

/// Map a provider HTTP status to an error kind
fn classify_status(status: StatusCode) -> CompletionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
            // Gemini reports a bad API key as 400 as well as 401/403
            CompletionError::Credential
        }
        StatusCode::TOO_MANY_REQUESTS => CompletionError::Quota,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CompletionError::Timeout,
        other => CompletionError::Transport(format!("HTTP {}", other)),
    }
}
