//! OpenAI-compatible client implementation

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use scholar_core::ocr::MEDIA_TYPE_PDF;
use scholar_core::{
    Embedder, Error, GenerationConfig, GenerationResult, LLMProvider, OcrEngine, Result,
};

use crate::config::OpenAIConfig;

/// Inputs per embeddings request
const EMBEDDING_BATCH_SIZE: usize = 256;

const OCR_INSTRUCTION: &str = "Transcribe all text contained in this document exactly as written. \
Keep the reading order and paragraph breaks. Output only the transcribed text.";

/// OpenAI-compatible client for chat, embeddings and vision OCR
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: Client,
    current_model: String,
    connected: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    File { file: FileData },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct FileData {
    filename: String,
    file_data: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIClient {
    /// Model constants
    pub const GPT_4O: &'static str = "gpt-4o";
    pub const GPT_4O_MINI: &'static str = "gpt-4o-mini";

    /// Create a new client from configuration
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let current_model = config.chat_model.clone();

        Ok(Self {
            config,
            client,
            current_model,
            connected: false,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env()?;
        Self::new(config)
    }

    /// Set the chat model to use for generation
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.current_model = model_id.into();
        self
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base, path.trim_start_matches('/'))
    }

    fn chat_request<'a>(
        &self,
        messages: Vec<ChatMessage>,
        config: &'a GenerationConfig,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &config.model_id,
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stop: config.stop_sequences.clone(),
        }
    }

    /// JSON body sent for a plain text prompt
    pub fn chat_request_body(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<serde_json::Value> {
        let request = self.chat_request(vec![user_text(prompt)], config);
        Ok(serde_json::to_value(&request)?)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B, on_status: fn(String) -> Error) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(Error::Authentication(format!(
                    "OpenAI API rejected credentials ({}): {}",
                    status, error_text
                )));
            }

            return Err(on_status(format!(
                "OpenAI API request to {} failed with status {}: {}",
                path, status, error_text
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn perform_chat(
        &self,
        messages: Vec<ChatMessage>,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let request = self.chat_request(messages, config);
        let response: ChatResponse = self
            .post_json("chat/completions", &request, Error::LLMProvider)
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::LLMProvider(
                "Empty response from chat completion".to_string(),
            ));
        }

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used: response.usage.map(|u| u.total_tokens),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };

        let mut response: EmbeddingResponse = self
            .post_json("embeddings", &request, Error::Embedding)
            .await?;

        if response.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, received {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

fn user_text(prompt: &str) -> ChatMessage {
    ChatMessage {
        role: "user",
        content: MessageContent::Text(prompt.to_string()),
    }
}

fn ocr_part(bytes: &[u8], media_type: &str) -> Result<ContentPart> {
    let data_url = format!("data:{};base64,{}", media_type, STANDARD.encode(bytes));

    if media_type == MEDIA_TYPE_PDF {
        Ok(ContentPart::File {
            file: FileData {
                filename: "document.pdf".to_string(),
                file_data: data_url,
            },
        })
    } else if media_type.starts_with("image/") {
        Ok(ContentPart::ImageUrl {
            image_url: ImageUrl { url: data_url },
        })
    } else {
        Err(Error::UnsupportedFormat(format!(
            "OCR does not support media type {}",
            media_type
        )))
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn connect(&mut self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(Error::Authentication("OpenAI API key is empty".to_string()));
        }

        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Authentication(format!(
                "Authentication failed: {}",
                response.status()
            )));
        }

        tracing::debug!(api_base = %self.config.api_base, "connected to OpenAI endpoint");
        self.connected = true;
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        self.generate_with_config(prompt, &self.generation_config())
            .await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_chat(vec![user_text(prompt)], config);

        match timeout(config.timeout, generation_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.current_model
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.current_model.clone(),
            temperature: Some(self.config.temperature),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Embedder for OpenAIClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            embeddings.extend(self.embed_batch(batch).await?);
        }

        tracing::debug!(count = embeddings.len(), model = %self.config.embedding_model, "embedded texts");
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("No embedding returned for query".to_string()))
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dimension()
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl OcrEngine for OpenAIClient {
    async fn recognize(&self, bytes: &[u8], media_type: &str) -> Result<String> {
        let message = ChatMessage {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: OCR_INSTRUCTION.to_string(),
                },
                ocr_part(bytes, media_type)?,
            ]),
        };

        let config = GenerationConfig {
            model_id: self.config.ocr_model.clone(),
            max_tokens: 4096,
            temperature: Some(0.0),
            ..Default::default()
        };

        let result = match timeout(config.timeout, self.perform_chat(vec![message], &config)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("OCR request timed out".to_string())),
        };

        Ok(result.text)
    }
}
