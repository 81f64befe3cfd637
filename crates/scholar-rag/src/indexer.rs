//! Document indexer that chunks, embeds and stores documents

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use scholar_core::{
    Document, DocumentIndexer, Embedder, Error, IndexingConfig, IndexingResult, Result,
    VectorDocument, VectorStore,
};

use crate::chunker::TextSplitter;
use crate::extraction::TextExtractor;

/// Indexer writing embedded chunks into any [`VectorStore`]
pub struct ChunkIndexer<V: VectorStore> {
    vector_store: Arc<V>,
    embedder: Arc<dyn Embedder>,
    extractor: Option<Arc<TextExtractor>>,
    splitter: TextSplitter,
}

impl<V: VectorStore> ChunkIndexer<V> {
    /// Create an indexer chunking with `config`
    pub fn with_config(
        vector_store: Arc<V>,
        embedder: Arc<dyn Embedder>,
        config: IndexingConfig,
    ) -> Result<Self> {
        Ok(Self {
            vector_store,
            embedder,
            extractor: None,
            splitter: TextSplitter::from_config(&config)?,
        })
    }

    /// Use an extractor for files instead of reading raw text
    pub fn with_extractor(mut self, extractor: Arc<TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    fn chunk_documents(&self, document: &Document, chunks: &[String], embeddings: Vec<Vec<f32>>) -> Vec<VectorDocument> {
        chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| {
                let mut metadata = match &document.metadata {
                    serde_json::Value::Object(_) => document.metadata.clone(),
                    _ => json!({}),
                };
                metadata["chunk_index"] = json!(i);
                metadata["total_chunks"] = json!(chunks.len());
                metadata["title"] = json!(document.title);
                if let Some(ref url) = document.url {
                    metadata["url"] = json!(url);
                }

                VectorDocument {
                    id: format!("{}_{}", document.id, i),
                    content: chunk.clone(),
                    embedding: Some(embedding),
                    metadata,
                    score: None,
                }
            })
            .collect()
    }
}

#[async_trait]
impl<V: VectorStore + 'static> DocumentIndexer for ChunkIndexer<V> {
    async fn index_document(&self, document: Document) -> Result<IndexingResult> {
        let chunks = self.splitter.split_text(&document.content);
        if chunks.is_empty() {
            return Ok(IndexingResult::default());
        }

        let embeddings = self.embedder.embed_documents(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let vector_docs = self.chunk_documents(&document, &chunks, embeddings);

        match self.vector_store.store_batch(vector_docs).await {
            Ok(ids) => {
                tracing::debug!(document = %document.id, chunks = ids.len(), "indexed document");
                Ok(IndexingResult {
                    documents_indexed: ids.len(),
                    documents_failed: 0,
                    errors: Vec::new(),
                })
            }
            Err(e) => Ok(IndexingResult {
                documents_indexed: 0,
                documents_failed: chunks.len(),
                errors: vec![format!("Failed to store chunks of {}: {}", document.id, e)],
            }),
        }
    }

    async fn index_from_file(&self, document_id: &str, path: &Path) -> Result<IndexingResult> {
        let content = match &self.extractor {
            Some(extractor) => extractor.extract_from_file(path).await?,
            None => tokio::fs::read_to_string(path).await?,
        };

        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| document_id.to_string());

        let document = Document {
            id: document_id.to_string(),
            title,
            content,
            url: None,
            metadata: json!({
                "file_id": document_id,
            }),
        };

        self.index_document(document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::vector_store::LocalVectorStore;

    fn indexer(store: Arc<LocalVectorStore>) -> ChunkIndexer<LocalVectorStore> {
        let config = IndexingConfig {
            chunk_size: 40,
            chunk_overlap: 8,
        };
        ChunkIndexer::with_config(store, Arc::new(HashingEmbedder::new(32)), config).unwrap()
    }

    #[tokio::test]
    async fn test_document_indexing() {
        let store = Arc::new(LocalVectorStore::new(32));
        let indexer = indexer(store.clone());

        let document = Document {
            id: "paper".to_string(),
            title: "Test Paper".to_string(),
            content: "Transformers replace recurrence with attention. \
                      Training is parallel across positions. \
                      Results improve translation quality."
                .to_string(),
            url: None,
            metadata: json!({"type": "test"}),
        };

        let result = indexer.index_document(document).await.unwrap();
        assert!(result.documents_indexed > 1);
        assert_eq!(result.documents_failed, 0);
        assert_eq!(store.count().await.unwrap(), result.documents_indexed);

        let first = store.get("paper_0").await.unwrap().unwrap();
        assert_eq!(first.metadata["chunk_index"], 0);
        assert_eq!(first.metadata["title"], "Test Paper");
        assert_eq!(first.metadata["type"], "test");
        assert_eq!(first.embedding.as_ref().map(Vec::len), Some(32));
    }

    #[tokio::test]
    async fn test_empty_document_indexes_nothing() {
        let store = Arc::new(LocalVectorStore::new(32));
        let indexer = indexer(store.clone());

        let document = Document {
            id: "blank".to_string(),
            title: "Blank".to_string(),
            content: "   ".to_string(),
            url: None,
            metadata: json!({}),
        };

        let result = indexer.index_document(document).await.unwrap();
        assert_eq!(result.documents_indexed, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_from_file_without_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Short note about diffusion models.").unwrap();

        let store = Arc::new(LocalVectorStore::new(32));
        let indexer = indexer(store.clone());

        let result = indexer.index_from_file("doc-1", &path).await.unwrap();
        assert_eq!(result.documents_indexed, 1);

        let chunk = store.get("doc-1_0").await.unwrap().unwrap();
        assert_eq!(chunk.metadata["file_id"], "doc-1");
        assert_eq!(chunk.metadata["title"], "notes.txt");
    }

    #[tokio::test]
    async fn test_index_from_file_with_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Heading\n\nBody about **contrastive** learning.").unwrap();

        let store = Arc::new(LocalVectorStore::new(32));
        let indexer =
            indexer(store.clone()).with_extractor(Arc::new(TextExtractor::new().unwrap()));

        let result = indexer.index_from_file("doc-2", &path).await.unwrap();
        assert!(result.documents_indexed >= 1);

        let chunk = store.get("doc-2_0").await.unwrap().unwrap();
        assert!(!chunk.content.contains("**"));
    }

    #[tokio::test]
    async fn test_index_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = indexer(Arc::new(LocalVectorStore::new(32)));

        assert!(indexer
            .index_from_file("doc-3", &dir.path().join("absent.txt"))
            .await
            .is_err());
    }
}
