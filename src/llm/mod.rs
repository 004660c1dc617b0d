//! Reviewer service integration.
//!
//! The reviewer is an external LLM that receives one reconcile prompt and
//! answers with a JSON object. Providers implement [`Reviewer`]; the
//! reconciliation engine only sees the trait.

mod config;
mod gemini;
mod ollama;
mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use config::{parse_model_list, ReviewerConfig, ReviewerProvider};
pub use gemini::GeminiReviewer;
pub use ollama::OllamaReviewer;
pub use prompts::{DEFAULT_RECONCILE_PROMPT, DEFAULT_SYSTEM_INSTRUCTION};

/// Errors that can occur while asking the reviewer.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Failed to reach the reviewer service
    #[error("Connection error: {0}")]
    Connection(String),

    /// Reviewer answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Reviewer answered without any content
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Response body was not the expected JSON object
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required field was absent from the response
    #[error("Missing field '{0}' in reviewer response")]
    MissingField(&'static str),

    /// A field had an unusable type
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Reviewer cannot be used as configured
    #[error("Reviewer not configured: {0}")]
    NotConfigured(String),
}

/// An external reviewer that turns a prompt into a raw response body.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;

    /// Send one prompt to `model` and return the response text.
    async fn review(&self, model: &str, prompt: &str) -> Result<String, ReviewError>;
}

/// Build the reviewer selected by the configuration.
pub fn create_reviewer(config: &ReviewerConfig) -> Result<Arc<dyn Reviewer>, ReviewError> {
    match config.provider {
        ReviewerProvider::Gemini => Ok(Arc::new(GeminiReviewer::new(config.clone())?)),
        ReviewerProvider::Ollama => Ok(Arc::new(OllamaReviewer::new(config.clone())?)),
    }
}

/// Shared HTTP client construction for reviewer back ends.
fn build_http_client(config: &ReviewerConfig) -> Result<reqwest::Client, ReviewError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ReviewError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into [`ReviewError::Api`].
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ReviewError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ReviewError::Api { status, body })
}
