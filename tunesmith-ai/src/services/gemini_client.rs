//! Gemini `generateContent` client
//!
//! One POST per call asking for a JSON object that matches the song metadata
//! schema. Transport and API failures are classified into [`GenerationError`]
//! variants from HTTP status and the Google error envelope, never from
//! free-text matching in callers.
//!
//! Endpoint: `{base_url}/models/{model}:generateContent`

use crate::models::{FailureCause, ModelId};
use crate::services::prompt_builder::response_schema;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;

const USER_AGENT: &str = concat!("tunesmith-ai/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Generation failure taxonomy
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("No response text from model")]
    NoResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl GenerationError {
    /// User-facing cause shown in the sentinel failure record
    pub fn failure_cause(&self) -> FailureCause {
        match self {
            GenerationError::Timeout => FailureCause::Timeout,
            GenerationError::Auth(_) => FailureCause::Credential,
            GenerationError::RateLimited(_) => FailureCause::RateLimited,
            GenerationError::NoResponse
            | GenerationError::Malformed(_)
            | GenerationError::Network(_)
            | GenerationError::Api { .. } => FailureCause::Other,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Network(e.to_string())
        }
    }
}

/// Something that turns a prompt into a JSON text payload
///
/// Implemented by [`GeminiClient`]; tests substitute in-process backends.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_json(&self, model: ModelId, prompt: &str) -> Result<String, GenerationError>;
}

/// Gemini REST client
///
/// Built once at start-up and shared; holds no mutable state.
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, model: ModelId) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model.api_id())
    }
}

/// Request body for a structured JSON generation
pub fn request_body(model: ModelId, prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
            "thinkingConfig": model.thinking().to_json(),
        }
    })
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate_json(&self, model: ModelId, prompt: &str) -> Result<String, GenerationError> {
        let start = Instant::now();
        tracing::debug!(
            model = %model,
            prompt_chars = prompt.len(),
            "Querying Gemini generateContent"
        );

        let response = self
            .http_client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(model, prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = classify_http_error(status.as_u16(), &body);
            tracing::warn!(
                model = %model,
                status = status.as_u16(),
                error = %error,
                "Gemini request rejected"
            );
            return Err(error);
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let text = extract_text(parsed)?;

        tracing::info!(
            model = %model,
            response_chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Gemini generation successful"
        );

        Ok(text)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
    /// Set on thought-summary parts, which are not part of the answer
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Concatenated answer text of the first candidate
pub fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        tracing::warn!(block_reason = reason, "Gemini blocked the prompt");
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::NoResponse);
    };
    if let Some(reason) = candidate.finish_reason.as_deref() {
        tracing::debug!(finish_reason = reason, "Gemini candidate finished");
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        Err(GenerationError::NoResponse)
    } else {
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<Value>,
}

/// Map a non-2xx response to a [`GenerationError`]
pub fn classify_http_error(status: u16, body: &str) -> GenerationError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let google_status = envelope
        .as_ref()
        .and_then(|e| e.error.status.as_deref())
        .unwrap_or_default();
    let key_rejected = envelope.as_ref().is_some_and(|e| {
        e.error
            .details
            .iter()
            .any(|d| d.get("reason").and_then(Value::as_str) == Some("API_KEY_INVALID"))
    });

    match (status, google_status) {
        (401 | 403, _) | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => {
            GenerationError::Auth(message)
        }
        _ if key_rejected => GenerationError::Auth(message),
        (429, _) | (_, "RESOURCE_EXHAUSTED") => GenerationError::RateLimited(message),
        (408 | 504, _) | (_, "DEADLINE_EXCEEDED") => GenerationError::Timeout,
        _ => GenerationError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new("test_key".to_string(), "http://localhost:1/v1beta/");
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().endpoint(ModelId::Gemini25Flash),
            "http://localhost:1/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body(ModelId::Gemini3Pro, "write a song");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "write a song");
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert_eq!(config["thinkingConfig"]["thinkingLevel"], "high");

        let body = request_body(ModelId::Gemini25Pro, "x");
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], -1);
    }

    #[test]
    fn test_extract_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "planning...", "thought": true },
                    { "text": "{\"title\":" },
                    { "text": "\"Tide\"}" }
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "{\"title\":\"Tide\"}");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert!(matches!(extract_text(response), Err(GenerationError::NoResponse)));
    }

    #[test]
    fn test_classify_invalid_key_400() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID"
                }]
            }
        })
        .to_string();
        let error = classify_http_error(400, &body);
        assert!(matches!(
            error,
            GenerationError::Auth(ref m) if m.starts_with("API key not valid")
        ));
        assert_eq!(error.failure_cause(), FailureCause::Credential);
    }

    #[test]
    fn test_classify_status_codes() {
        assert!(matches!(classify_http_error(403, "denied"), GenerationError::Auth(_)));
        let quota = r#"{"error":{"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            classify_http_error(429, quota),
            GenerationError::RateLimited(ref m) if m == "Quota exceeded"
        ));
        assert!(matches!(classify_http_error(504, ""), GenerationError::Timeout));
        assert!(matches!(
            classify_http_error(500, "boom"),
            GenerationError::Api { status: 500, ref message } if message == "boom"
        ));
    }

    #[test]
    fn test_failure_causes() {
        assert_eq!(GenerationError::Timeout.failure_cause(), FailureCause::Timeout);
        assert_eq!(
            GenerationError::RateLimited(String::new()).failure_cause(),
            FailureCause::RateLimited
        );
        assert_eq!(GenerationError::NoResponse.failure_cause(), FailureCause::Other);
        assert_eq!(
            GenerationError::Malformed("x".to_string()).failure_cause(),
            FailureCause::Other
        );
    }
}
