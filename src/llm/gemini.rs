//! Google Gemini reviewer.
//!
//! Uses the `generateContent` endpoint with `responseMimeType` set to JSON
//! so the model is constrained to answer with a JSON object.
//! Requires GEMINI_API_KEY.
//!
//! Free tier limits are low (a few requests per minute, a daily cap), which
//! is why the pipeline throttles and trips a breaker on failure streaks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, check_status, ReviewError, Reviewer, ReviewerConfig};

/// Gemini reviewer backed by the Generative Language API.
pub struct GeminiReviewer {
    config: ReviewerConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

impl GeminiReviewer {
    pub fn new(config: ReviewerConfig) -> Result<Self, ReviewError> {
        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: self.config.get_system_instruction().to_string(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type: "application/json",
            },
        }
    }
}

/// Pull the answer text out of a Gemini response body.
fn extract_text(response: GeminiResponse) -> Result<String, ReviewError> {
    if let Some(error) = response.error {
        return Err(ReviewError::Api {
            status: 200,
            body: error.message,
        });
    }

    let block_reason = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
        .unwrap_or_default();

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| {
            if block_reason.is_empty() {
                ReviewError::EmptyResponse("no candidates".to_string())
            } else {
                ReviewError::EmptyResponse(format!("prompt blocked: {}", block_reason))
            }
        })?;

    let finish_reason = candidate.finish_reason.unwrap_or_default();
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ReviewError::EmptyResponse(format!(
            "candidate without text (finish reason: {})",
            if finish_reason.is_empty() { "unknown" } else { finish_reason.as_str() }
        )));
    }
    Ok(text)
}

#[async_trait]
impl Reviewer for GeminiReviewer {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    async fn review(&self, model: &str, prompt: &str) -> Result<String, ReviewError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ReviewError::NotConfigured(
                "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string(),
            )
        })?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            model
        );
        debug!("Gemini: calling {}", model);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| ReviewError::Connection(e.to_string()))?;
        let resp = check_status(resp).await?;

        let body: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| ReviewError::Parse(format!("Failed to parse Gemini response: {}", e)))?;

        extract_text(body)
    }
}
