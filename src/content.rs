//! Marketing copy for artisans generated by a remote model.
//!
//! Every public operation is total: offline mode, transport failures, empty
//! replies and unusable JSON all resolve to fixed fallback text, so callers
//! always receive a fully populated, non-empty result.

use crate::config::{Settings, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL};
use crate::gemini::{GeminiClient, GeminiError, GenerationRequest, GenerativeTransport, InlineImage};
use crate::models::{CaptionRequest, CaptionResult, DescriptionRequest, ImageAnalysisRequest, Recommendation};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use bytes::Bytes;
use image::ImageFormat;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

pub const FALLBACK_CAPTION: &str = "Beautiful handcrafted piece showcasing traditional artistry";
pub const FALLBACK_HASHTAGS: &str = "#handmade #artisan #craft #local #art";
pub const FALLBACK_STORY: &str = "This piece represents the rich tradition of handcrafted artistry.";
pub const FALLBACK_IMAGE_ANALYSIS: &str = "A beautiful handcrafted item showcasing traditional artistry and skill.";
pub const RECOMMENDATION_MESSAGE: &str = "AI recommendations coming soon!";
pub const DEFAULT_SUGGESTED_SEARCHES: [&str; 3] = ["pottery", "jewelry", "textiles"];

const JSON_MIME_TYPE: &str = "application/json";
const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

const CAPTION_SYSTEM_PROMPT: &str = "You are an expert social media content creator for artisans. \
Generate engaging, authentic captions and hashtags that tell stories about handcrafted items \
and connect with audiences emotionally. Respond with a JSON object containing exactly three string keys: \
{\"caption\": \"engaging caption\", \"hashtags\": \"#hashtag1 #hashtag2\", \"story\": \"longer background story\"}";

const DESCRIPTION_SYSTEM_PROMPT: &str = "You are an expert product copywriter for artisan marketplaces. \
Create compelling, authentic product descriptions that highlight craftsmanship, uniqueness, and emotional \
appeal while being practical for buyers. Keep descriptions concise but engaging.";

const IMAGE_ANALYSIS_PROMPT: &str = "Analyze this image of handcrafted artwork. Describe the item, \
materials used, crafting technique, colors, style, and any cultural or artistic elements. \
Keep it concise but detailed for social media.";

// Accepts padded and unpadded input.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a generation attempt fell back to static content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no API credential configured")]
    ConfigurationAbsent,
    #[error("remote call failed: {0}")]
    Remote(#[from] GeminiError),
    #[error("empty response from model")]
    EmptyResponse,
    #[error("malformed JSON response: {0}")]
    MalformedJson(String),
    #[error("invalid image encoding: {0}")]
    InvalidImageEncoding(String),
}

#[derive(Debug, Clone)]
pub struct ModelNames {
    pub text: String,
    pub vision: String,
}

impl Default for ModelNames {
    fn default() -> Self {
        Self { text: DEFAULT_TEXT_MODEL.to_string(), vision: DEFAULT_VISION_MODEL.to_string() }
    }
}

/// Content generation adapter. Cheap to clone; holds no request state.
#[derive(Clone)]
pub struct ContentGenerator {
    transport: Option<Arc<dyn GenerativeTransport>>,
    models: ModelNames,
}

impl ContentGenerator {
    pub fn new(transport: Arc<dyn GenerativeTransport>, models: ModelNames) -> Self {
        Self { transport: Some(transport), models }
    }

    /// Every operation answers with its fallback and never touches the network.
    pub fn offline() -> Self {
        Self { transport: None, models: ModelNames::default() }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, GeminiError> {
        let models = ModelNames { text: settings.text_model.clone(), vision: settings.vision_model.clone() };
        Ok(match GeminiClient::from_settings(settings)? {
            Some(client) => Self::new(Arc::new(client), models),
            None => Self { transport: None, models },
        })
    }

    pub fn is_online(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn generate_caption_and_hashtags(&self, request: &CaptionRequest) -> CaptionResult {
        match self.try_caption(request).await {
            Ok(result) => {
                info!("✅ Caption generated ({} chars)", result.caption.len());
                result
            }
            Err(e) => {
                log_fallback("caption", &e);
                CaptionResult::fallback()
            }
        }
    }

    pub async fn generate_product_description(&self, request: &DescriptionRequest) -> String {
        match self.try_description(request).await {
            Ok(text) => {
                info!("✅ Product description generated ({} chars)", text.len());
                text
            }
            Err(ContentError::ConfigurationAbsent) => {
                log_fallback("product_description", &ContentError::ConfigurationAbsent);
                offline_description(request)
            }
            Err(ContentError::EmptyResponse) => {
                log_fallback("product_description", &ContentError::EmptyResponse);
                empty_reply_description(request)
            }
            Err(e) => {
                log_fallback("product_description", &e);
                failed_description(request)
            }
        }
    }

    pub async fn analyze_image_for_content(&self, request: &ImageAnalysisRequest) -> String {
        match self.try_image_analysis(request).await {
            Ok(text) => {
                info!("✅ Image analysis generated ({} chars)", text.len());
                text
            }
            Err(e) => {
                log_fallback("image_analysis", &e);
                FALLBACK_IMAGE_ANALYSIS.to_string()
            }
        }
    }

    /// Placeholder until interest-based matching exists. Makes no remote call.
    pub fn recommend_similar_artisans(&self, user_interests: &[String], craft_type: Option<&str>) -> Recommendation {
        debug!(interests = user_interests.len(), ?craft_type, "Recommending artisans");
        let suggested_searches = match craft_type.map(str::trim).filter(|c| !c.is_empty()) {
            Some(craft) => vec![craft.to_string()],
            None => DEFAULT_SUGGESTED_SEARCHES.iter().map(|s| s.to_string()).collect(),
        };
        Recommendation { message: RECOMMENDATION_MESSAGE.to_string(), suggested_searches }
    }

    async fn try_caption(&self, request: &CaptionRequest) -> Result<CaptionResult, ContentError> {
        let transport = self.transport()?;
        let generation = GenerationRequest::text(&self.models.text, caption_prompt(request))
            .with_system_instruction(CAPTION_SYSTEM_PROMPT)
            .with_response_mime_type(JSON_MIME_TYPE);
        let raw = call(transport, &generation).await?;
        parse_caption(&raw)
    }

    async fn try_description(&self, request: &DescriptionRequest) -> Result<String, ContentError> {
        let transport = self.transport()?;
        let generation = GenerationRequest::text(&self.models.text, description_prompt(request))
            .with_system_instruction(DESCRIPTION_SYSTEM_PROMPT);
        call(transport, &generation).await
    }

    async fn try_image_analysis(&self, request: &ImageAnalysisRequest) -> Result<String, ContentError> {
        let transport = self.transport()?;
        let image = decode_image(&request.image_base64)?;
        debug!(mime_type = %image.mime_type, bytes = image.data.len(), "🖼️ Decoded image for analysis");
        let generation = GenerationRequest::text(&self.models.vision, IMAGE_ANALYSIS_PROMPT).with_image(image);
        call(transport, &generation).await
    }

    fn transport(&self) -> Result<&dyn GenerativeTransport, ContentError> {
        self.transport.as_deref().ok_or(ContentError::ConfigurationAbsent)
    }
}

/// Runs one generation and returns its trimmed, non-empty text.
async fn call(transport: &dyn GenerativeTransport, request: &GenerationRequest) -> Result<String, ContentError> {
    let text = transport.generate(request).await?.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(ContentError::EmptyResponse);
    }
    Ok(text.to_string())
}

fn log_fallback(operation: &str, e: &ContentError) {
    match e {
        ContentError::ConfigurationAbsent => debug!(operation, "Offline mode, using fallback content"),
        _ => error!(operation, error = %e, "❌ AI generation failed, using fallback content"),
    }
}

impl CaptionResult {
    pub fn fallback() -> Self {
        Self {
            caption: FALLBACK_CAPTION.to_string(),
            hashtags: FALLBACK_HASHTAGS.to_string(),
            story: FALLBACK_STORY.to_string(),
        }
    }
}

// --- Prompts ---

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn caption_prompt(request: &CaptionRequest) -> String {
    let craft_context = non_blank(&request.craft_type)
        .map(|craft| format!(" specializing in {craft}"))
        .unwrap_or_default();
    format!(
        "Create an engaging social media post for an artisan{craft_context} sharing this item: {}. \
         Make it authentic, storytelling-focused, and include relevant hashtags.",
        request.item_description
    )
}

fn description_prompt(request: &DescriptionRequest) -> String {
    let craft = non_blank(&request.craft_type).unwrap_or("handmade");
    let price_context = match request.price {
        Some(price) if price.is_finite() && price != 0.0 => format!(" priced at ${price:.2}"),
        _ => String::new(),
    };
    format!(
        "Write a compelling product description for: {}. Basic details: {}. Craft type: {craft}. \
         Price context: {price_context}. Focus on quality, uniqueness, and the story behind the craft.",
        request.title, request.basic_description
    )
}

fn offline_description(request: &DescriptionRequest) -> String {
    format!(
        "Beautifully crafted {}. {} Perfect for adding artisanal charm to any space.",
        request.title, request.basic_description
    )
}

fn empty_reply_description(request: &DescriptionRequest) -> String {
    format!("Beautifully crafted {}. {}", request.title, request.basic_description)
}

fn failed_description(request: &DescriptionRequest) -> String {
    format!(
        "Beautifully crafted {}. {} A unique piece that showcases skilled artisanship and attention to detail.",
        request.title, request.basic_description
    )
}

// --- Caption parsing ---

/// Model reply with every key optional; wrong types and blank strings read as absent.
#[derive(Debug, Deserialize)]
struct CaptionDraft {
    #[serde(default, deserialize_with = "lenient_text")]
    caption: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    hashtags: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    story: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

impl CaptionDraft {
    fn merge_with_defaults(self) -> CaptionResult {
        CaptionResult {
            caption: self.caption.unwrap_or_else(|| FALLBACK_CAPTION.to_string()),
            hashtags: self
                .hashtags
                .as_deref()
                .and_then(normalize_hashtags)
                .unwrap_or_else(|| FALLBACK_HASHTAGS.to_string()),
            story: self.story.unwrap_or_else(|| FALLBACK_STORY.to_string()),
        }
    }
}

fn parse_caption(raw: &str) -> Result<CaptionResult, ContentError> {
    let value: Value =
        serde_json::from_str(&strip_code_fence(raw)).map_err(|e| ContentError::MalformedJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ContentError::MalformedJson("expected a JSON object".to_string()));
    }
    let draft: CaptionDraft = serde_json::from_value(value).map_err(|e| ContentError::MalformedJson(e.to_string()))?;
    Ok(draft.merge_with_defaults())
}

/// Removes a surrounding markdown code fence, if any.
fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// Splits on whitespace and commas and prefixes each tag with `#`.
fn normalize_hashtags(raw: &str) -> Option<String> {
    let tags: Vec<String> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|tag| tag.trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(" "))
    }
}

// --- Image decoding ---

fn decode_image(input: &str) -> Result<InlineImage, ContentError> {
    let trimmed = input.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| ContentError::InvalidImageEncoding("data URL is not base64".to_string()))?,
        None => trimmed,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let data = LENIENT_BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| ContentError::InvalidImageEncoding(e.to_string()))?;
    if data.is_empty() {
        return Err(ContentError::InvalidImageEncoding("no image bytes".to_string()));
    }
    let mime_type = match image::guess_format(&data) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        _ => DEFAULT_IMAGE_MIME_TYPE,
    };
    Ok(InlineImage { mime_type: mime_type.to_string(), data: Bytes::from(data) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedReply, ScriptedTransport};
    use pretty_assertions::assert_eq;

    // Header bytes only; enough for format sniffing.
    const JPEG_B64: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/";
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn online(transport: &Arc<ScriptedTransport>) -> ContentGenerator {
        ContentGenerator::new(transport.clone(), ModelNames::default())
    }

    fn caption_request() -> CaptionRequest {
        CaptionRequest {
            item_description: "A hand-thrown stoneware mug with a speckled glaze".to_string(),
            craft_type: Some("pottery".to_string()),
        }
    }

    fn description_request() -> DescriptionRequest {
        DescriptionRequest {
            title: "Vase".to_string(),
            basic_description: "A blue ceramic vase".to_string(),
            craft_type: None,
            price: None,
        }
    }

    fn assert_populated(result: &CaptionResult) {
        assert!(!result.caption.trim().is_empty());
        assert!(!result.hashtags.trim().is_empty());
        assert!(!result.story.trim().is_empty());
    }

    #[tokio::test]
    async fn offline_mode_returns_documented_fallbacks() {
        let generator = ContentGenerator::offline();
        assert!(!generator.is_online());

        let caption = generator.generate_caption_and_hashtags(&caption_request()).await;
        assert_eq!(caption, CaptionResult::fallback());

        let description = generator.generate_product_description(&description_request()).await;
        assert_eq!(
            description,
            "Beautifully crafted Vase. A blue ceramic vase Perfect for adding artisanal charm to any space."
        );

        let analysis = generator
            .analyze_image_for_content(&ImageAnalysisRequest { image_base64: "%%%".to_string() })
            .await;
        assert_eq!(analysis, FALLBACK_IMAGE_ANALYSIS);
    }

    #[tokio::test]
    async fn settings_without_key_build_an_offline_generator() {
        let generator = ContentGenerator::from_settings(&Settings::default()).unwrap();
        assert!(!generator.is_online());
        let caption = generator.generate_caption_and_hashtags(&caption_request()).await;
        assert_eq!(caption, CaptionResult::fallback());
    }

    #[tokio::test]
    async fn caption_uses_model_json() {
        let transport = Arc::new(ScriptedTransport::replying(
            r##"{"caption":"Morning coffee, slow made","hashtags":"#pottery #stoneware","story":"Thrown on a kick wheel."}"##,
        ));
        let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;

        assert_eq!(result.caption, "Morning coffee, slow made");
        assert_eq!(result.hashtags, "#pottery #stoneware");
        assert_eq!(result.story, "Thrown on a kick wheel.");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn caption_request_asks_for_json_with_system_instruction() {
        let transport = Arc::new(ScriptedTransport::replying("{}"));
        online(&transport).generate_caption_and_hashtags(&caption_request()).await;

        let call = transport.last_call().unwrap();
        assert_eq!(call.model, DEFAULT_TEXT_MODEL);
        assert_eq!(call.response_mime_type.as_deref(), Some("application/json"));
        assert!(call.system_instruction.unwrap().contains("\"hashtags\""));
        assert!(call.prompt.contains("an artisan specializing in pottery"));
        assert!(call.prompt.contains("speckled glaze"));
        assert!(call.image.is_none());
    }

    #[tokio::test]
    async fn caption_prompt_omits_craft_context_when_absent() {
        let transport = Arc::new(ScriptedTransport::replying("{}"));
        let request = CaptionRequest { craft_type: Some("  ".to_string()), ..caption_request() };
        online(&transport).generate_caption_and_hashtags(&request).await;
        assert!(transport.last_call().unwrap().prompt.contains("for an artisan sharing this item"));
    }

    #[tokio::test]
    async fn missing_hashtags_key_gets_default_hashtags() {
        let transport = Arc::new(ScriptedTransport::replying(r#"{"caption":"Blue hour","story":"Dyed with indigo."}"#));
        let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;

        assert_eq!(result.caption, "Blue hour");
        assert_eq!(result.hashtags, FALLBACK_HASHTAGS);
        assert_eq!(result.story, "Dyed with indigo.");
    }

    #[tokio::test]
    async fn wrong_typed_or_blank_fields_get_defaults() {
        let transport = Arc::new(ScriptedTransport::replying(r##"{"caption":42,"hashtags":["#a"],"story":"   "}"##));
        let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;
        assert_eq!(result, CaptionResult::fallback());
    }

    #[tokio::test]
    async fn hashtags_are_normalized() {
        let transport = Arc::new(ScriptedTransport::replying(
            r#"{"caption":"c","hashtags":"handmade, #weaving  loom","story":"s"}"#,
        ));
        let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;
        assert_eq!(result.hashtags, "#handmade #weaving #loom");
    }

    #[tokio::test]
    async fn fenced_json_is_accepted() {
        let transport = Arc::new(ScriptedTransport::replying(
            "```json\n{\"caption\":\"Fenced\",\"hashtags\":\"#a\",\"story\":\"s\"}\n```",
        ));
        let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;
        assert_eq!(result.caption, "Fenced");
    }

    #[tokio::test]
    async fn malformed_json_falls_back_to_whole_triple() {
        for reply in ["not json at all", "[\"caption\",\"hashtags\",\"story\"]", "\"just a string\""] {
            let transport = Arc::new(ScriptedTransport::replying(reply));
            let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;
            assert_eq!(result, CaptionResult::fallback(), "reply: {reply}");
        }
    }

    #[tokio::test]
    async fn caption_is_always_populated() {
        let replies = [
            ScriptedReply::Text(r##"{"caption":"x","hashtags":"#x","story":"x"}"##.to_string()),
            ScriptedReply::Text("{".to_string()),
            ScriptedReply::Empty,
            ScriptedReply::Fail("connection reset".to_string()),
            ScriptedReply::Timeout,
        ];
        for reply in replies {
            let transport = Arc::new(ScriptedTransport::new(reply));
            let result = online(&transport).generate_caption_and_hashtags(&caption_request()).await;
            assert_populated(&result);
        }
    }

    #[tokio::test]
    async fn description_is_trimmed_model_text() {
        let transport = Arc::new(ScriptedTransport::replying("\n  A cobalt vase, thrown and glazed by hand.  \n"));
        let text = online(&transport).generate_product_description(&description_request()).await;
        assert_eq!(text, "A cobalt vase, thrown and glazed by hand.");
    }

    #[tokio::test]
    async fn description_prompt_embeds_context() {
        let transport = Arc::new(ScriptedTransport::replying("ok"));
        let request = DescriptionRequest {
            craft_type: Some("ceramics".to_string()),
            price: Some(45.5),
            ..description_request()
        };
        online(&transport).generate_product_description(&request).await;

        let call = transport.last_call().unwrap();
        assert!(call.response_mime_type.is_none());
        assert!(call.system_instruction.unwrap().contains("product copywriter"));
        assert!(call.prompt.contains("for: Vase."));
        assert!(call.prompt.contains("Basic details: A blue ceramic vase."));
        assert!(call.prompt.contains("Craft type: ceramics."));
        assert!(call.prompt.contains("priced at $45.50"));
    }

    #[tokio::test]
    async fn description_prompt_defaults_craft_and_skips_zero_price() {
        let transport = Arc::new(ScriptedTransport::replying("ok"));
        let request = DescriptionRequest { price: Some(0.0), ..description_request() };
        online(&transport).generate_product_description(&request).await;

        let prompt = transport.last_call().unwrap().prompt;
        assert!(prompt.contains("Craft type: handmade."));
        assert!(!prompt.contains("priced at"));
    }

    #[tokio::test]
    async fn failing_description_interpolates_inputs() {
        let transport = Arc::new(ScriptedTransport::failing("503 from upstream"));
        let text = online(&transport).generate_product_description(&description_request()).await;

        assert!(text.contains("Vase"));
        assert!(text.contains("A blue ceramic vase"));
        assert_eq!(
            text,
            "Beautifully crafted Vase. A blue ceramic vase A unique piece that showcases skilled artisanship and attention to detail."
        );
    }

    #[tokio::test]
    async fn empty_description_reply_uses_short_fallback() {
        for transport in [ScriptedTransport::replying("   "), ScriptedTransport::empty()] {
            let transport = Arc::new(transport);
            let text = online(&transport).generate_product_description(&description_request()).await;
            assert_eq!(text, "Beautifully crafted Vase. A blue ceramic vase");
        }
    }

    #[tokio::test]
    async fn image_analysis_sends_jpeg_to_vision_model() {
        let transport = Arc::new(ScriptedTransport::replying("  Hand-carved walnut bowl.  "));
        let text = online(&transport)
            .analyze_image_for_content(&ImageAnalysisRequest { image_base64: JPEG_B64.to_string() })
            .await;

        assert_eq!(text, "Hand-carved walnut bowl.");
        let call = transport.last_call().unwrap();
        assert_eq!(call.model, DEFAULT_VISION_MODEL);
        assert!(call.prompt.starts_with("Analyze this image of handcrafted artwork."));
        let image = call.image.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(&image.data[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn image_analysis_accepts_data_urls_and_sniffs_png() {
        let transport = Arc::new(ScriptedTransport::replying("A woven basket."));
        online(&transport)
            .analyze_image_for_content(&ImageAnalysisRequest { image_base64: format!("data:image/png;base64,{PNG_B64}") })
            .await;
        assert_eq!(transport.last_call().unwrap().image.unwrap().mime_type, "image/png");
    }

    #[tokio::test]
    async fn undecodable_image_falls_back_without_remote_call() {
        let transport = Arc::new(ScriptedTransport::replying("should not be used"));
        let generator = online(&transport);
        for input in ["not base64!!", "", "data:image/png,raw"] {
            let text = generator
                .analyze_image_for_content(&ImageAnalysisRequest { image_base64: input.to_string() })
                .await;
            assert_eq!(text, "A beautiful handcrafted item showcasing traditional artistry and skill.");
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn image_analysis_failures_fall_back() {
        for transport in [ScriptedTransport::empty(), ScriptedTransport::failing("boom")] {
            let transport = Arc::new(transport);
            let text = online(&transport)
                .analyze_image_for_content(&ImageAnalysisRequest { image_base64: JPEG_B64.to_string() })
                .await;
            assert_eq!(text, FALLBACK_IMAGE_ANALYSIS);
            assert_eq!(transport.call_count(), 1);
        }
    }

    #[test]
    fn recommendations_use_craft_type_or_default_list() {
        let generator = ContentGenerator::offline();
        let with_craft = generator.recommend_similar_artisans(&["textiles".to_string()], Some("weaving"));
        assert_eq!(with_craft.suggested_searches, vec!["weaving"]);
        assert_eq!(with_craft.message, RECOMMENDATION_MESSAGE);

        let without = generator.recommend_similar_artisans(&[], None);
        assert_eq!(without.suggested_searches, vec!["pottery", "jewelry", "textiles"]);
    }

    #[tokio::test]
    async fn repeated_calls_give_identical_results() {
        let transport = Arc::new(ScriptedTransport::replying(r#"{"caption":"Same","story":"Again"}"#));
        let generator = online(&transport);

        let first = generator.generate_caption_and_hashtags(&caption_request()).await;
        let second = generator.generate_caption_and_hashtags(&caption_request()).await;
        assert_eq!(first, second);

        let first = generator.generate_product_description(&description_request()).await;
        let second = generator.generate_product_description(&description_request()).await;
        assert_eq!(first, second);

        let calls = transport.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(calls[2], calls[3]);
    }
}
