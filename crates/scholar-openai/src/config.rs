//! OpenAI-compatible endpoint configuration

use scholar_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OCR_MODEL: &str = "gpt-4o-mini";

/// Configuration for the OpenAI client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub ocr_model: String,
    pub temperature: f32,
}

impl OpenAIConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Configuration("OPENAI_API_KEY environment variable not found".to_string())
        })?;

        let api_base = env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let chat_model =
            env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        let embedding_model = env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let ocr_model =
            env::var("OPENAI_OCR_MODEL").unwrap_or_else(|_| DEFAULT_OCR_MODEL.to_string());

        let temperature = match env::var("OPENAI_TEMPERATURE") {
            Ok(raw) => raw.trim().parse::<f32>().map_err(|_| {
                Error::Configuration(format!("OPENAI_TEMPERATURE is not a number: {}", raw))
            })?,
            Err(_) => 0.3,
        };

        Ok(Self {
            api_key,
            api_base,
            chat_model,
            embedding_model,
            ocr_model,
            temperature,
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            temperature: 0.3,
        }
    }

    /// Point the client at another compatible endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Vector size produced by the configured embedding model
    pub fn embedding_dimension(&self) -> usize {
        match self.embedding_model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }
}
