use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Adapter values ---

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRequest {
    pub item_description: String,
    pub craft_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionResult {
    pub caption: String,
    /// Space-separated tokens, each starting with `#`.
    pub hashtags: String,
    pub story: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionRequest {
    pub title: String,
    pub basic_description: String,
    pub craft_type: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnalysisRequest {
    /// Base64 text of the image bytes, optionally as a `data:` URL.
    pub image_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub message: String,
    pub suggested_searches: Vec<String>,
}

// --- HTTP bodies ---

// Body fields are optional so that absent, null and blank values all reach
// the handler's own 400 check.

#[derive(Debug, Deserialize, Default)]
pub struct GenerateCaptionBody {
    #[serde(default, deserialize_with = "lenient_text")]
    pub image_description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProductDescriptionBody {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub basic_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AnalyzeImageBody {
    #[serde(default, deserialize_with = "lenient_text")]
    pub base64_image: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecommendBody {
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub craft_type: Option<String>,
}

/// Strings pass through, numbers and booleans are rendered as text,
/// anything else reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Accepts a number or a numeric string; anything unparseable is dropped.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite()))
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: CaptionResult,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub success: bool,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}
