//! Free-text summarization

use std::sync::Arc;
use validator::Validate;

use scholar_core::{GenerationConfig, LLMProvider, Result, RetryConfig, SummaryRequest};

use crate::prompts::summary_prompt;

const SUMMARY_TEMPERATURE: f32 = 0.2;

pub struct Summarizer {
    llm: Arc<dyn LLMProvider>,
    generation: GenerationConfig,
    retry: RetryConfig,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        let generation = GenerationConfig {
            temperature: Some(SUMMARY_TEMPERATURE),
            ..llm.generation_config()
        };

        Self {
            llm,
            generation,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.generation.model_id = model_id.into();
        self
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        request.validate()?;

        let prompt = summary_prompt(&request.text, &request.instruction, request.word_limit);
        tracing::debug!(chars = request.text.len(), word_limit = request.word_limit, "summarizing text");

        let result = self
            .llm
            .generate_with_retry(&prompt, &self.generation, &self.retry)
            .await?;

        Ok(result.text.trim().to_string())
    }
}
