//! Question answering over uploaded documents

use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

use scholar_core::{
    Embedder, Error, GenerationConfig, LLMProvider, QnARequest, QnAResponse, RAGEngine, RAGQuery,
    Result, RetryConfig, UploadRegistry, UploadedFile,
};

use crate::engine::DocumentRagEngine;
use crate::extraction::{SUPPORTED_UPLOAD_EXTENSIONS, is_supported_upload};
use crate::prompts::{NO_CONTEXT_ANSWER, qna_prompt};
use crate::registry::DocumentStoreRegistry;

/// Chunks retrieved per question
pub const QNA_TOP_K: usize = 4;

pub struct QnAService {
    uploads: Arc<dyn UploadRegistry>,
    stores: Arc<DocumentStoreRegistry>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LLMProvider>,
    upload_dir: PathBuf,
    generation: GenerationConfig,
    retry: RetryConfig,
}

impl QnAService {
    pub fn new(
        uploads: Arc<dyn UploadRegistry>,
        stores: Arc<DocumentStoreRegistry>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LLMProvider>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        let generation = llm.generation_config();

        Self {
            uploads,
            stores,
            embedder,
            llm,
            upload_dir: upload_dir.into(),
            generation,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Store an uploaded file and build its vector store
    ///
    /// Uploading content the user already uploaded returns the earlier record.
    pub async fn upload_document(
        &self,
        user_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadedFile> {
        let file_name = sanitize_file_name(file_name)
            .ok_or_else(|| Error::InvalidInput("File name is empty".to_string()))?;

        if !is_supported_upload(&file_name) {
            return Err(Error::UnsupportedFormat(format!(
                "{} (supported: {})",
                file_name,
                SUPPORTED_UPLOAD_EXTENSIONS.join(", ")
            )));
        }

        let content_hash = format!("{:x}", md5::compute(bytes));

        if let Some(existing) = self.uploads.find_by_hash(user_id, &content_hash).await? {
            if Path::new(&existing.file_path).exists() {
                tracing::info!(user_id, file_id = %existing.id, "file already uploaded");
                return Ok(existing);
            }
            tracing::info!(user_id, file_id = %existing.id, "replacing upload missing on disk");
            self.uploads.remove(user_id, &existing.id).await?;
            self.stores.remove(&existing.id).await?;
        }

        let user_dir = self.upload_dir.join(sanitize_path_segment(user_id));
        tokio::fs::create_dir_all(&user_dir).await?;
        let file_path = user_dir.join(format!("{}_{}", content_hash, file_name));
        tokio::fs::write(&file_path, bytes).await?;

        let record = self
            .uploads
            .insert(
                user_id,
                &file_name,
                &file_path.to_string_lossy(),
                &content_hash,
            )
            .await?;

        if let Err(e) = self.stores.get_or_create(&record.id, &file_path).await {
            tracing::warn!(user_id, file_id = %record.id, error = %e, "discarding unprocessable upload");
            self.discard_upload(user_id, &record, &file_path).await;
            return Err(e);
        }

        tracing::info!(user_id, file_id = %record.id, file_name = %record.file_name, "document uploaded");
        Ok(record)
    }

    async fn discard_upload(&self, user_id: &str, record: &UploadedFile, file_path: &Path) {
        if let Err(e) = tokio::fs::remove_file(file_path).await {
            tracing::warn!(path = %file_path.display(), error = %e, "failed to remove upload");
        }
        if let Err(e) = self.uploads.remove(user_id, &record.id).await {
            tracing::warn!(file_id = %record.id, error = %e, "failed to remove upload record");
        }
        if let Err(e) = self.stores.remove(&record.id).await {
            tracing::warn!(file_id = %record.id, error = %e, "failed to remove vector store");
        }
    }

    pub async fn list_documents(&self, user_id: &str) -> Result<Vec<UploadedFile>> {
        self.uploads.list(user_id).await
    }

    /// Answer a question about one of the user's uploaded documents
    pub async fn ask(&self, user_id: &str, request: &QnARequest) -> Result<QnAResponse> {
        request.validate()?;

        let file_id = request.file_id.to_string();
        let file = self
            .uploads
            .get(user_id, &file_id)
            .await?
            .ok_or_else(|| Error::NotFound("File not found, upload it first".to_string()))?;

        if !Path::new(&file.file_path).exists() {
            return Err(Error::NotFound(format!(
                "{} is missing on disk, upload it again",
                file.file_name
            )));
        }

        if !is_supported_upload(&file.file_path) {
            return Err(Error::UnsupportedFormat(file.file_name.clone()));
        }

        tracing::info!(user_id, file_id = %file.id, "processing document query");

        let store = self.stores.get_or_create(&file.id, &file.file_path).await?;
        let engine = DocumentRagEngine::new(store, self.embedder.clone(), file.file_name.clone());

        let query = RAGQuery {
            query: request.query.clone(),
            top_k: QNA_TOP_K,
            score_threshold: None,
        };
        let retrieved = engine.retrieve(&query).await?;

        let answer = self
            .answer_question(
                &retrieved.context,
                &request.query,
                &file.file_name,
                request.word_limit,
            )
            .await?;

        Ok(QnAResponse {
            query: request.query.clone(),
            answer,
            references: format_document_references(&retrieved.context),
        })
    }

    /// Generate an answer from retrieved context; no context means no LLM call
    pub async fn answer_question(
        &self,
        context: &str,
        question: &str,
        doc_name: &str,
        word_limit: u32,
    ) -> Result<String> {
        if context.trim().is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let prompt = qna_prompt(context, question, doc_name, word_limit);
        let result = self
            .llm
            .generate_with_retry(&prompt, &self.generation, &self.retry)
            .await?;

        Ok(result.text.trim().to_string())
    }
}

/// Numbered list of the passages an answer was grounded on
pub fn format_document_references(context: &str) -> String {
    if context.trim().is_empty() {
        return String::new();
    }

    let mut references = String::from("📌 **Relevant Passages from Document**\n");
    let passages = context
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for (i, passage) in passages.enumerate() {
        references.push_str(&format!("{}. {}\n\n", i + 1, passage.replace('\n', " ")));
    }

    references.trim().to_string()
}

/// Last path component with anything but `[A-Za-z0-9._-]` replaced
fn sanitize_file_name(file_name: &str) -> Option<String> {
    let base = Path::new(file_name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())?;
    let cleaned = sanitize_path_segment(&base);
    (!cleaned.trim_matches(|c| c == '.' || c == '_').is_empty()).then_some(cleaned)
}

fn sanitize_path_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_document_references() {
        let context = "First passage\nwith a break\n\nSecond passage";
        assert_eq!(
            format_document_references(context),
            "📌 **Relevant Passages from Document**\n1. First passage with a break\n\n2. Second passage"
        );
        assert_eq!(format_document_references("  "), "");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("../secret/My Paper (v2).pdf"),
            Some("My_Paper__v2_.pdf".to_string())
        );
        assert_eq!(sanitize_file_name("  "), None);
        assert_eq!(sanitize_file_name(".."), None);
    }
}
