//! Mock backend for testing
//!
//! Returns a configurable reply, failure, or artificial delay. The delay is
//! how the orchestrator's timeout race is exercised without a live provider.

use std::time::Duration;

use async_trait::async_trait;

use super::{CompletionBackend, CompletionError, CompletionOptions};

/// Mock completion backend
#[derive(Clone)]
pub struct MockBackend {
    reply: String,
    failure: Option<CompletionError>,
    delay: Option<Duration>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock that echoes a canned reply
    pub fn new() -> Self {
        Self {
            reply: "Here are 3 tips based on your data.".to_string(),
            failure: None,
            delay: None,
        }
    }

    /// Mock replying with the given text
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::new()
        }
    }

    /// Mock failing every call with the given error
    pub fn with_failure(failure: CompletionError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new()
        }
    }

    /// Mock sleeping before replying (for timeout tests)
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
