use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::summarize::{FailureKind, GenerateFailure, TextGenerator};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Credentials and endpoint for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the API key from `GOOGLE_API_KEY`
    pub fn from_env(model: impl Into<String>) -> Self {
        Self::new(std::env::var(API_KEY_ENV).ok(), model)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        let model = self.config.model.trim_start_matches("models/");
        format!("{}/models/{model}:generateContent", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateFailure> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GenerateFailure::new(
                FailureKind::Credential,
                format!("{API_KEY_ENV} environment variable not set (required for summarization)"),
            ));
        };

        debug!("Summarizing via Gemini API with model {}", self.config.model);

        let body = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{"text": prompt}]
                }
            ]
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateFailure::new(FailureKind::Other, format!("Gemini request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GenerateFailure::new(FailureKind::Other, format!("Gemini response unreadable: {e}")))?;

        if !status.is_success() {
            return Err(classify(status.as_u16(), &text));
        }

        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| GenerateFailure::new(FailureKind::Other, format!("Gemini returned invalid JSON: {e}")))?;
        extract_gemini_text(&json)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Map a failed Gemini response onto a [`FailureKind`].
///
/// Uses the structured `error.status` and `error.details[].reason` fields,
/// falling back to the HTTP status when the body is not the usual envelope.
pub fn classify(http_status: u16, body: &str) -> GenerateFailure {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    let status = parsed.as_ref().and_then(|e| e.status.as_deref()).unwrap_or("");
    let reasons: Vec<&str> = parsed
        .as_ref()
        .map(|e| e.details.iter().filter_map(|d| d.reason.as_deref()).collect())
        .unwrap_or_default();
    let has_reason = |r: &str| reasons.contains(&r);

    let kind = if http_status == 429 || status == "RESOURCE_EXHAUSTED" || has_reason("RATE_LIMIT_EXCEEDED") {
        FailureKind::RateLimited
    } else if http_status == 404 || status == "NOT_FOUND" {
        FailureKind::ModelNotFound
    } else if http_status == 401
        || http_status == 403
        || status == "UNAUTHENTICATED"
        || status == "PERMISSION_DENIED"
        || has_reason("API_KEY_INVALID")
    {
        FailureKind::Credential
    } else {
        FailureKind::Other
    };

    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("Gemini API returned {http_status}: {body}"));

    GenerateFailure::new(kind, message)
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String, GenerateFailure> {
    if let Some(parts) = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }

    if let Some(reason) = json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(GenerateFailure::new(
            FailureKind::Other,
            format!("Gemini blocked the prompt: {reason}"),
        ));
    }

    Err(GenerateFailure::new(FailureKind::Other, "unexpected Gemini API response format"))
}
