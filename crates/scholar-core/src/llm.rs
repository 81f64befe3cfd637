//! LLM provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::RetryConfig;
use crate::{Error, Result};

/// Configuration for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop_sequences: Vec<String>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o".to_string(),
            max_tokens: 2048,
            temperature: Some(0.3),
            top_p: None,
            stop_sequences: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Result of a text generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_id: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers (OpenAI or any compatible endpoint)
///
/// Implementations only need the single-shot calls; retry handling is
/// provided on top of `generate_with_config`.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Connect/authenticate with the LLM provider
    async fn connect(&mut self) -> Result<()>;

    /// Generate text using the LLM with default configuration
    async fn generate(&self, prompt: &str) -> Result<GenerationResult>;

    /// Generate text with custom configuration
    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult>;

    /// Generate with retries, extending the timeout on every attempt
    async fn generate_with_retry(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        retry_config: &RetryConfig,
    ) -> Result<GenerationResult> {
        let mut last_error = None;

        for attempt in 1..=retry_config.max_attempts.max(1) {
            let mut attempt_config = config.clone();
            attempt_config.timeout =
                retry_config.base_timeout + Duration::from_secs((attempt as u64 - 1) * 10);

            match self.generate_with_config(prompt, &attempt_config).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "generation attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::LLMProvider("All generation attempts failed".to_string())))
    }

    /// Get the model ID being used
    fn model_id(&self) -> &str;

    /// Generation settings the provider was configured with
    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.model_id().to_string(),
            ..Default::default()
        }
    }
}
