//! RAG engine over a single document's vector store

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use scholar_core::{
    Embedder, RAGEngine, RAGQuery, RAGResult, Result, SearchConfig, VectorDocument, VectorStore,
};

/// Retrieves the chunks of one document closest to a question
pub struct DocumentRagEngine<V: VectorStore> {
    vector_store: Arc<V>,
    embedder: Arc<dyn Embedder>,
    document_name: String,
}

impl<V: VectorStore> DocumentRagEngine<V> {
    /// Create a new engine over a document store
    pub fn new(
        vector_store: Arc<V>,
        embedder: Arc<dyn Embedder>,
        document_name: impl Into<String>,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            document_name: document_name.into(),
        }
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }
}

#[async_trait]
impl<V: VectorStore + 'static> RAGEngine for DocumentRagEngine<V> {
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
        let query_vector = self.embedder.embed_query(&query.query).await?;

        let search_config = SearchConfig {
            top_k: query.top_k,
            score_threshold: query.score_threshold,
        };

        let search_result = self
            .vector_store
            .search_by_vector(&query_vector, &search_config)
            .await?;
        let context = self.build_context(&search_result.documents);

        tracing::debug!(
            document = %self.document_name,
            chunks = search_result.total,
            "retrieved context"
        );

        Ok(RAGResult {
            documents: search_result.documents,
            context,
            metadata: Some(json!({
                "query": query.query,
                "top_k": query.top_k,
                "results_count": search_result.total,
                "document": self.document_name,
            })),
        })
    }

    fn build_context(&self, documents: &[VectorDocument]) -> String {
        documents
            .iter()
            .map(|doc| doc.content.trim())
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::vector_store::LocalVectorStore;

    async fn engine_with(chunks: &[&str]) -> DocumentRagEngine<LocalVectorStore> {
        let embedder = Arc::new(HashingEmbedder::new(64));
        let store = Arc::new(LocalVectorStore::new(64));

        for (i, chunk) in chunks.iter().enumerate() {
            store
                .store(VectorDocument {
                    id: format!("doc_{}", i),
                    content: chunk.to_string(),
                    embedding: Some(embedder.embed(chunk)),
                    metadata: json!({}),
                    score: None,
                })
                .await
                .unwrap();
        }

        DocumentRagEngine::new(store, embedder, "paper.pdf")
    }

    #[tokio::test]
    async fn test_retrieve_finds_matching_chunk() {
        let engine = engine_with(&[
            "The dataset contains ten thousand labelled images.",
            "Gradient clipping stabilises training of recurrent networks.",
        ])
        .await;

        let mut query = RAGQuery::new("gradient clipping recurrent training");
        query.top_k = 1;

        let result = engine.retrieve(&query).await.unwrap();
        assert_eq!(result.documents.len(), 1);
        assert!(result.context.contains("Gradient clipping"));
    }

    #[tokio::test]
    async fn test_build_context_skips_blank_chunks() {
        let engine = engine_with(&[]).await;
        let docs = vec![
            VectorDocument {
                id: "1".to_string(),
                content: "  first passage \n".to_string(),
                embedding: None,
                metadata: json!({}),
                score: Some(0.9),
            },
            VectorDocument {
                id: "2".to_string(),
                content: "   ".to_string(),
                embedding: None,
                metadata: json!({}),
                score: Some(0.8),
            },
            VectorDocument {
                id: "3".to_string(),
                content: "second passage".to_string(),
                embedding: None,
                metadata: json!({}),
                score: Some(0.7),
            },
        ];

        assert_eq!(engine.build_context(&docs), "first passage\n\nsecond passage");
    }
}
