//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A chunk stored in the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: serde_json::Value,
    pub score: Option<f32>,
}

/// Search result from vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub documents: Vec<VectorDocument>,
    pub total: usize,
}

/// Configuration for vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: None,
        }
    }
}

/// Trait for vector stores
///
/// Documents are ranked by embedding distance; `score` on returned documents
/// is a similarity in `(0, 1]`, higher is closer.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document, replacing any document with the same id
    async fn store(&self, document: VectorDocument) -> Result<String>;

    /// Store multiple documents in batch
    async fn store_batch(&self, documents: Vec<VectorDocument>) -> Result<Vec<String>>;

    /// Search using a vector embedding
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult>;

    /// Get a document by ID
    async fn get(&self, id: &str) -> Result<Option<VectorDocument>>;

    /// Delete a document by ID
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Clear all documents from the store
    async fn clear(&self) -> Result<()>;

    /// Get the total number of documents
    async fn count(&self) -> Result<usize>;
}
