//! Ollama reviewer (local models).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, check_status, ReviewError, Reviewer, ReviewerConfig};

/// Reviewer backed by a local Ollama server.
pub struct OllamaReviewer {
    config: ReviewerConfig,
    client: reqwest::Client,
}

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    /// Forces JSON mode
    format: &'static str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama chat response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaReviewer {
    pub fn new(config: ReviewerConfig) -> Result<Self, ReviewError> {
        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    /// List models installed on the Ollama server.
    pub async fn list_models(&self) -> Result<Vec<String>, ReviewError> {
        let url = format!("{}/api/tags", self.config.endpoint());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReviewError::Connection(e.to_string()))?;
        let resp = check_status(resp).await?;

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelInfo>,
        }

        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| ReviewError::Parse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl Reviewer for OllamaReviewer {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    async fn review(&self, model: &str, prompt: &str) -> Result<String, ReviewError> {
        let request = OllamaChatRequest {
            model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: self.config.get_system_instruction(),
                },
                OllamaMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            format: "json",
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_output_tokens,
            },
        };

        let url = format!("{}/api/chat", self.config.endpoint());
        debug!("Ollama: calling {}", model);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReviewError::Connection(e.to_string()))?;
        let resp = check_status(resp).await?;

        let chat: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| ReviewError::Parse(e.to_string()))?;

        if chat.message.content.trim().is_empty() {
            return Err(ReviewError::EmptyResponse("empty message".to_string()));
        }
        Ok(chat.message.content)
    }
}
