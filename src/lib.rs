//! ArtConnect AI content service.
//!
//! Generates captions, hashtags, stories, product descriptions and image
//! analysis for artisans through Gemini, falling back to fixed copy whenever
//! the model is unavailable.

pub mod config;
pub mod content;
pub mod gemini;
pub mod models;
pub mod routes;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::Settings;
pub use content::{ContentError, ContentGenerator, ModelNames};
pub use gemini::{GeminiClient, GeminiError, GenerationRequest, GenerativeTransport};
pub use routes::{router, AppState};
