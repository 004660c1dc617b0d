//! Query word segmentation.
//!
//! Thai is written without spaces between words, so a query like
//! "ระเบียบเทคโนโลยี" needs a segmenter to become search terms. Two are
//! provided: a built-in dictionary segmenter and a client for an external
//! segmentation service.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors from query segmentation.
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("Failed to read dictionary {path}: {source}")]
    Dictionary {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tokenizer service unreachable: {0}")]
    Connection(String),

    #[error("Tokenizer service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected tokenizer response: {0}")]
    Parse(String),
}

/// Splits free text into search terms.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Segment `text`. Whitespace-only tokens are never returned.
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError>;
}

fn is_thai(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}

/// Word list compiled into the binary, used when no dictionary is configured.
const BUNDLED_WORDS: &str = include_str!("thai_words.txt");

/// Greedy longest-match segmenter.
///
/// Text is split on whitespace and on Thai/non-Thai script boundaries.
/// Thai runs are further split by longest dictionary match; characters not
/// covered by any dictionary word stay together as one token. With an empty
/// dictionary each Thai run is a single token.
///
/// `Default` loads the bundled Thai word list.
#[derive(Debug, Clone)]
pub struct DictionaryTokenizer {
    words: HashSet<String>,
    max_chars: usize,
}

impl DictionaryTokenizer {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: HashSet<String> = words
            .into_iter()
            .map(Into::into)
            .map(|w: String| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let max_chars = words.iter().map(|w| w.chars().count()).max().unwrap_or(0);
        Self { words, max_chars }
    }

    /// Load a word list, one word per line. Lines starting with `#` are ignored.
    pub fn from_file(path: &Path) -> Result<Self, TokenizeError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| TokenizeError::Dictionary {
                path: path.display().to_string(),
                source,
            })?;
        let tokenizer = Self::parse(&content);
        debug!("Loaded {} dictionary words from {}", tokenizer.len(), path.display());
        Ok(tokenizer)
    }

    /// Segmenter over the bundled Thai word list.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_WORDS)
    }

    fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .filter(|line| !line.trim_start().starts_with('#')),
        )
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Synchronous segmentation used by the trait impl.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for chunk in text.split_whitespace() {
            for (thai, run) in script_runs(chunk) {
                if thai && !self.words.is_empty() {
                    self.segment_thai(&run, &mut tokens);
                } else {
                    tokens.push(run);
                }
            }
        }
        tokens
    }

    fn segment_thai(&self, run: &str, tokens: &mut Vec<String>) {
        let chars: Vec<char> = run.chars().collect();
        let mut unknown = String::new();
        let mut i = 0;
        while i < chars.len() {
            let longest = (1..=self.max_chars.min(chars.len() - i))
                .rev()
                .find(|&len| {
                    let candidate: String = chars[i..i + len].iter().collect();
                    self.words.contains(&candidate)
                });
            match longest {
                Some(len) => {
                    if !unknown.is_empty() {
                        tokens.push(std::mem::take(&mut unknown));
                    }
                    tokens.push(chars[i..i + len].iter().collect());
                    i += len;
                }
                None => {
                    unknown.push(chars[i]);
                    i += 1;
                }
            }
        }
        if !unknown.is_empty() {
            tokens.push(unknown);
        }
    }
}

/// Split a whitespace-free chunk into maximal same-script runs.
fn script_runs(chunk: &str) -> Vec<(bool, String)> {
    let mut runs: Vec<(bool, String)> = Vec::new();
    for c in chunk.chars() {
        let thai = is_thai(c);
        match runs.last_mut() {
            Some((last, run)) if *last == thai => run.push(c),
            _ => runs.push((thai, c.to_string())),
        }
    }
    runs
}

impl Default for DictionaryTokenizer {
    fn default() -> Self {
        Self::bundled()
    }
}

#[async_trait]
impl Tokenizer for DictionaryTokenizer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        Ok(self.segment(text))
    }
}

/// Client for an external word segmentation service.
///
/// Sends `POST {endpoint}` with `{"text": ...}` and accepts either a JSON
/// array of tokens or an object with a `tokens` array.
pub struct HttpTokenizer {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenizeResponse {
    List(Vec<String>),
    Object { tokens: Vec<String> },
}

impl HttpTokenizer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TokenizeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TokenizeError::Connection(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl Tokenizer for HttpTokenizer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| TokenizeError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TokenizeError::Api { status, body });
        }

        let parsed: TokenizeResponse = resp
            .json()
            .await
            .map_err(|e| TokenizeError::Parse(e.to_string()))?;
        let tokens = match parsed {
            TokenizeResponse::List(tokens) => tokens,
            TokenizeResponse::Object { tokens } => tokens,
        };

        Ok(tokens
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect())
    }
}
