use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `None` puts the content generator in offline mode for the whole process.
    pub api_key: Option<String>,
    pub api_base: String,
    pub text_model: String,
    pub vision_model: String,
    pub request_timeout: Duration,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let request_timeout = match get("GEMINI_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Invalid { key: "GEMINI_TIMEOUT_SECS", value: v }),
            },
            None => defaults.request_timeout,
        };
        let port = match get("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?,
            None => defaults.port,
        };

        Ok(Self {
            api_key: get("GEMINI_API_KEY"),
            api_base: get("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            text_model: get("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            vision_model: get("GEMINI_VISION_MODEL").unwrap_or(defaults.vision_model),
            request_timeout,
            port,
        })
    }

    /// Key prefix safe for logs.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(6).collect::<String>()),
            None => "<none>".to_string(),
        }
    }
}
