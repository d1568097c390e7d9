use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    content::ContentGenerator,
    models::{
        AnalysisResponse, AnalyzeImageBody, CaptionRequest, CaptionResponse, DescriptionRequest,
        DescriptionResponse, GenerateCaptionBody, ImageAnalysisRequest, ProductDescriptionBody, RecommendBody,
        RecommendationResponse,
    },
};

pub const ROLE_HEADER: &str = "x-user-role";
pub const CRAFT_TYPE_HEADER: &str = "x-user-craft-type";

#[derive(Clone)]
pub struct AppState {
    pub content: ContentGenerator,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status_code(), "Rejected AI request: {}", self);
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Artisan,
    Buyer,
}

/// Identity forwarded by the session layer in front of this service.
#[derive(Debug, Clone)]
pub struct Caller {
    pub role: Role,
    pub craft_type: Option<String>,
}

impl Caller {
    fn require_artisan(&self, message: &'static str) -> Result<(), ApiError> {
        match self.role {
            Role::Artisan => Ok(()),
            Role::Buyer => Err(ApiError::Forbidden(message)),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let role = match header(ROLE_HEADER).map(|r| r.to_ascii_lowercase()).as_deref() {
            Some("artisan") => Role::Artisan,
            Some("buyer") => Role::Buyer,
            _ => return Err(ApiError::Unauthorized),
        };
        Ok(Caller { role, craft_type: header(CRAFT_TYPE_HEADER) })
    }
}

fn required(value: Option<String>, message: &'static str) -> Result<String, ApiError> {
    value.filter(|v| !v.trim().is_empty()).ok_or(ApiError::BadRequest(message))
}

const ARTISANS_ONLY_GENERATION: &str = "Only artisans can use AI content generation";
const ARTISANS_ONLY_ANALYSIS: &str = "Only artisans can use AI image analysis";

pub async fn generate_caption(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<GenerateCaptionBody>,
) -> Result<Json<CaptionResponse>, ApiError> {
    caller.require_artisan(ARTISANS_ONLY_GENERATION)?;
    let item_description = required(body.image_description, "Image description is required")?;

    let request = CaptionRequest { item_description, craft_type: caller.craft_type };
    let span = info_span!("ai_request", request_id = %Uuid::new_v4(), endpoint = "generate_caption");
    let result = async {
        info!("🎯 Generating caption");
        state.content.generate_caption_and_hashtags(&request).await
    }
    .instrument(span)
    .await;

    Ok(Json(CaptionResponse { success: true, result }))
}

pub async fn generate_product_description(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<ProductDescriptionBody>,
) -> Result<Json<DescriptionResponse>, ApiError> {
    caller.require_artisan(ARTISANS_ONLY_GENERATION)?;
    const MISSING: &str = "Title and basic description are required";
    let title = required(body.title, MISSING)?;
    let basic_description = required(body.basic_description, MISSING)?;

    let request = DescriptionRequest {
        title,
        basic_description,
        craft_type: caller.craft_type,
        price: body.price,
    };
    let span = info_span!("ai_request", request_id = %Uuid::new_v4(), endpoint = "generate_product_description");
    let description = async {
        info!(title = %request.title, "🎯 Generating product description");
        state.content.generate_product_description(&request).await
    }
    .instrument(span)
    .await;

    Ok(Json(DescriptionResponse { success: true, description }))
}

pub async fn analyze_image(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<AnalyzeImageBody>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    caller.require_artisan(ARTISANS_ONLY_ANALYSIS)?;
    let image_base64 = required(body.base64_image, "Base64 image data is required")?;

    let request = ImageAnalysisRequest { image_base64 };
    let span = info_span!("ai_request", request_id = %Uuid::new_v4(), endpoint = "analyze_image");
    let analysis = async {
        info!(payload_chars = request.image_base64.len(), "🎯 Analyzing image");
        state.content.analyze_image_for_content(&request).await
    }
    .instrument(span)
    .await;

    Ok(Json(AnalysisResponse { success: true, analysis }))
}

pub async fn recommend_artisans(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<RecommendBody>,
) -> Json<RecommendationResponse> {
    let craft_type = body.craft_type.or(caller.craft_type);
    let interests = body.interests.unwrap_or_default();
    let recommendation = state.content.recommend_similar_artisans(&interests, craft_type.as_deref());
    Json(RecommendationResponse { success: true, recommendation })
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "ai_mode": if state.content.is_online() { "online" } else { "offline" },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ai/generate-caption", post(generate_caption))
        .route("/api/ai/generate-product-description", post(generate_product_description))
        .route("/api/ai/analyze-image", post(analyze_image))
        .route("/api/ai/recommend-artisans", post(recommend_artisans))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
