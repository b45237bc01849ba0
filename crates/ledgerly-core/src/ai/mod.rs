//! Pluggable completion-service abstraction
//!
//! The advisor only needs one operation from the language model: prompt in,
//! free-text completion out. Backends report failures as a small closed set
//! of error kinds so callers never have to sniff provider error strings.
//!
//! - `CompletionBackend` trait: the interface all backends implement
//! - `CompletionClient` enum: concrete wrapper providing Clone + compile-time
//!   dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! Environment variables:
//! - `ADVISOR_BACKEND`: backend to use (gemini, mock). Default: gemini
//! - `GEMINI_API_KEY`: Gemini API key (required for the gemini backend)
//! - `GEMINI_MODEL`: model name (default: gemini-2.5-flash)

mod gemini;
mod mock;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use thiserror::Error;

/// Failure kinds a completion backend may report
///
/// Deliberately closed: the orchestrator maps each variant to a distinct
/// user-facing error category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("invalid or missing provider credential")]
    Credential,

    #[error("provider quota or rate limit exceeded")]
    Quota,

    #[error("provider did not respond in time")]
    Timeout,

    #[error("provider transport error: {0}")]
    Transport(String),
}

/// Sampling options for a completion call
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 512,
        }
    }
}

/// Trait defining the interface for completion backends
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for the prompt
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete completion client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum CompletionClient {
    /// Google Gemini over the generateContent REST API
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl CompletionClient {
    /// Create a completion client from environment variables
    ///
    /// Returns None when no provider credential is configured; the advisor
    /// treats that as a configuration error at request time.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("ADVISOR_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(CompletionClient::Gemini),
            "mock" => Some(CompletionClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown ADVISOR_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(CompletionClient::Gemini)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        CompletionClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        match self {
            CompletionClient::Gemini(b) => b.complete(prompt, options).await,
            CompletionClient::Mock(b) => b.complete(prompt, options).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            CompletionClient::Gemini(b) => b.model(),
            CompletionClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            CompletionClient::Gemini(b) => b.host(),
            CompletionClient::Mock(b) => b.host(),
        }
    }
}
