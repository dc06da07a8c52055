//! Gemini client for narration script generation.
//!
//! Calls `generateContent` with the rendered system prompt as the system
//! instruction and constrains the response to a JSON array of strings.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::ScriptGenerator;
use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(api_key: impl Into<String>) -> WorkerResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WorkerError::config_error("GEMINI_API_KEY not set"));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            client: Client::new(),
        })
    }

    /// Point the client at another API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ScriptGenerator for GeminiClient {
    async fn generate_script(
        &self,
        model: &str,
        content: &str,
        system_prompt: &str,
    ) -> WorkerResult<Vec<String>> {
        if model.trim().is_empty() {
            return Err(WorkerError::invalid_payload("model is empty"));
        }
        if content.trim().is_empty() {
            return Err(WorkerError::invalid_payload("content is empty"));
        }

        info!(model = %model, content_len = content.len(), "Requesting narration script");

        let request = GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: content.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: json!({
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }),
            },
        };

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::provider_failed(format!(
                "gemini returned {}: {}",
                status, body
            )));
        }

        let response: GeminiResponse = response.json().await?;
        let raw: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(response_len = raw.len(), "Gemini response received");
        parse_segments(&raw)
    }
}

/// Parse a JSON array of strings, tolerating a surrounding Markdown fence.
fn parse_segments(raw: &str) -> WorkerResult<Vec<String>> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(WorkerError::provider_failed("gemini returned no content"));
    }
    serde_json::from_str(text).map_err(|e| {
        WorkerError::provider_failed(format!("invalid json: {}; raw={:?}", e, raw))
    })
}

fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
