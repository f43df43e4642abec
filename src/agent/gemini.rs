//! Gemini REST client for structured generation.
//!
//! Single endpoint (`models/{model}:generateContent`), JSON in and out.
//! Every call in this pipeline requests `application/json` output with a
//! response schema, so the model's text part is itself a JSON document.
//!
//! Key properties:
//! - One shared `reqwest::Client` with a 240s timeout sized for the slowest
//!   format calls, not the median.
//! - Connection and timeout failures map to dedicated error variants so the
//!   stream consumer can word them differently from API rejections.
//! - `GenerateClient` is a trait so orchestration tests can run against
//!   `MockGenerateClient` without a network.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AgentError;

/// Base URL of the Generative Language API.
pub const GEMINI_API_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model every pipeline call uses.
pub const GEMINI_MODEL: &str = "gemini-3-flash-preview";

const REQUEST_TIMEOUT_SECS: u64 = 240;

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
}

/// A content part. Responses may carry non-text parts (thought signatures);
/// those deserialize with an empty `text` and are skipped on extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_level: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// Moderate blocking across the standard harm categories.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_CIVIC_INTEGRITY",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category: category.to_string(),
        threshold: "BLOCK_ONLY_HIGH".to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl GenerateResponse {
    /// Builds a single-candidate text response. Handy for mocks.
    pub fn with_text(text: &str, finish_reason: &str) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    parts: vec![Part {
                        text: text.to_string(),
                    }],
                    role: "model".to_string(),
                }),
                finish_reason: finish_reason.to_string(),
            }],
            usage_metadata: None,
        }
    }

    /// Concatenates all text parts across candidates.
    pub fn extract_text(&self) -> String {
        let mut out = String::new();
        for candidate in &self.candidates {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    out.push_str(&part.text);
                }
            }
        }
        out
    }

    /// Finish reason of the first candidate, or empty.
    pub fn finish_reason(&self) -> &str {
        self.candidates
            .first()
            .map(|c| c.finish_reason.as_str())
            .unwrap_or("")
    }
}

// ═══════════════════════════════════════════════════════════
// Client
// ═══════════════════════════════════════════════════════════

/// Interface the orchestrator generates through.
#[async_trait]
pub trait GenerateClient: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AgentError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self, AgentError> {
        if api_key.is_empty() {
            return Err(AgentError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AgentError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            base_url: GEMINI_API_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            model: GEMINI_MODEL.to_string(),
        })
    }

    /// Overrides the API base URL. Used by tests against a local server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerateClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AgentError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AgentError::GeminiConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    AgentError::HttpClient(format!(
                        "request timed out after {REQUEST_TIMEOUT_SECS}s"
                    ))
                } else {
                    AgentError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::GeminiApi {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParsing(e.to_string()))?;

        if let Some(usage) = &parsed.usage_metadata {
            tracing::debug!(
                prompt_tokens = usage.prompt_token_count,
                candidate_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "generation call finished"
            );
        }

        Ok(parsed)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock
// ═══════════════════════════════════════════════════════════

/// Scriptable stand-in for orchestration tests. The handler inspects each
/// request (system instruction, schema) and picks its canned answer.
pub struct MockGenerateClient {
    #[allow(clippy::type_complexity)]
    handler: Box<dyn Fn(&GenerateRequest) -> Result<GenerateResponse, AgentError> + Send + Sync>,
}

impl MockGenerateClient {
    pub fn new(
        handler: impl Fn(&GenerateRequest) -> Result<GenerateResponse, AgentError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Mock that answers every request with the same text.
    pub fn with_text(text: &str) -> Self {
        let canned = text.to_string();
        Self::new(move |_| Ok(GenerateResponse::with_text(&canned, "STOP")))
    }
}

#[async_trait]
impl GenerateClient for MockGenerateClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AgentError> {
        (self.handler)(request)
    }
}
