//! Reviewer service configuration.

use serde::{Deserialize, Serialize};

use super::prompts::{DEFAULT_RECONCILE_PROMPT, DEFAULT_SYSTEM_INSTRUCTION};

/// Reviewer provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerProvider {
    /// Google Gemini `generateContent` API (default)
    #[default]
    Gemini,
    /// Ollama chat API (local)
    Ollama,
}

impl ReviewerProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Ollama => "http://localhost:11434",
        }
    }

    fn default_models(&self) -> Vec<String> {
        match self {
            Self::Gemini => vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-flash-preview-09-2025".to_string(),
            ],
            Self::Ollama => vec!["qwen3:8b".to_string()],
        }
    }
}

/// Configuration for the reviewer client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerConfig {
    /// Reviewer provider (gemini or ollama)
    #[serde(default)]
    pub provider: ReviewerProvider,
    /// API endpoint (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key (Gemini). Usually supplied through GEMINI_API_KEY.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Models to rotate through, one per call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Custom system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Custom reconcile prompt (uses {count} and {versions} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            provider: ReviewerProvider::default(),
            endpoint: None,
            api_key: None,
            models: Vec::new(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            system_instruction: None,
            prompt: None,
        }
    }
}

impl ReviewerConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `REVIEWER_PROVIDER`: "gemini" (default) or "ollama"
    /// - `REVIEWER_ENDPOINT`: API endpoint
    /// - `REVIEWER_MODELS`: comma-separated model list (round-robin)
    /// - `REVIEWER_TEMPERATURE`: generation temperature
    /// - `GEMINI_API_KEY`: API key for Gemini
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("REVIEWER_PROVIDER") {
            if let Some(provider) = ReviewerProvider::from_str(&val) {
                self.provider = provider;
            }
        }
        if let Ok(val) = std::env::var("REVIEWER_ENDPOINT") {
            if !val.is_empty() {
                self.endpoint = Some(val);
            }
        }
        if let Ok(val) = std::env::var("REVIEWER_MODELS") {
            let models = parse_model_list(&val);
            if !models.is_empty() {
                self.models = models;
            }
        }
        if let Ok(val) = std::env::var("REVIEWER_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                self.temperature = t;
            }
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        self
    }

    pub fn with_provider(mut self, provider: ReviewerProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Endpoint, falling back to the provider default.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Models to rotate through, falling back to the provider defaults.
    pub fn models(&self) -> Vec<String> {
        if self.models.is_empty() {
            self.provider.default_models()
        } else {
            self.models.clone()
        }
    }

    /// Get the system instruction, using custom or default.
    pub fn get_system_instruction(&self) -> &str {
        self.system_instruction
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Get the reconcile prompt template, using custom or default.
    pub fn get_prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_RECONCILE_PROMPT)
    }

    /// Human-readable hint about what is missing to use this reviewer.
    pub fn availability_hint(&self) -> Option<String> {
        match self.provider {
            ReviewerProvider::Gemini if self.api_key.is_none() => Some(
                "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string(),
            ),
            _ => None,
        }
    }
}

/// Split a comma-separated model list.
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}
