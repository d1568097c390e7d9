use crate::config::Settings;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeminiError::Timeout
        } else {
            GeminiError::Http(e.without_url().to_string())
        }
    }
}

/// Image sent as inline data alongside the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Bytes,
}

/// One `generateContent` call: a single user turn plus optional system
/// instruction, response MIME type and image.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub response_mime_type: Option<String>,
    pub image: Option<InlineImage>,
}

impl GenerationRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            prompt: prompt.into(),
            response_mime_type: None,
            image: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_response_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.response_mime_type = Some(mime_type.into());
        self
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Remote generative model boundary.
///
/// `Ok(None)` means the call succeeded but the model produced no text.
#[async_trait]
pub trait GenerativeTransport: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GeminiError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, timeout: std::time::Duration) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("artconnect_ai/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, api_key, base_url })
    }

    /// Returns `None` when no credential is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>, GeminiError> {
        match &settings.api_key {
            Some(key) => Self::new(key.clone(), settings.api_base.clone(), settings.request_timeout).map(Some),
            None => Ok(None),
        }
    }

    pub fn build_request_body(request: &GenerationRequest) -> Value {
        let mut parts = Vec::new();
        if let Some(image) = &request.image {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(&image.data),
                }
            }));
        }
        parts.push(json!({ "text": request.prompt }));

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }]
        });
        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        if let Some(mime_type) = &request.response_mime_type {
            body["generationConfig"] = json!({ "responseMimeType": mime_type });
        }
        body
    }
}

#[async_trait]
impl GenerativeTransport for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = Self::build_request_body(request);

        info!(model = %request.model, "🔗 Calling Gemini generateContent");
        if tracing::enabled!(tracing::Level::DEBUG) {
            let mut logged = body.clone();
            truncate_base64_in_json(&mut logged);
            debug!("📤 Request body: {}", serde_json::to_string(&logged).unwrap_or_default());
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(%status, "❌ Gemini API error response: {}", response_text);
            return Err(GeminiError::Status { status: status.as_u16(), body: response_text });
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Parse(e.to_string()))?;
        let text = extract_text(&parsed);
        debug!(chars = text.as_ref().map(|t| t.len()).unwrap_or(0), "📥 Gemini response text extracted");
        Ok(text)
    }
}

// Shortens long base64 `data` fields so request logs stay readable.
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=') {
                            *val = Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
    },
    #[allow(dead_code)]
    Other(Value),
}

/// Concatenates the non-thought text parts of the first candidate.
fn extract_text(resp: &GeminiResponse) -> Option<String> {
    let candidate = resp.candidates.first()?;
    let text: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|p| match p {
            Part::Text { text, thought: false } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
