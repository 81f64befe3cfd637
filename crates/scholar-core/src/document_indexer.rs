//! Document indexer trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// A document to be indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub metadata: serde_json::Value,
}

/// Result of an indexing operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingResult {
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub errors: Vec<String>,
}

/// Configuration for document indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 750,
            chunk_overlap: 75,
        }
    }
}

/// Trait for document indexers
///
/// An indexer turns documents or uploaded files into embedded chunks
/// stored in a vector store.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    /// Index a single document
    async fn index_document(&self, document: Document) -> Result<IndexingResult>;

    /// Extract and index a local file under `document_id`
    async fn index_from_file(&self, document_id: &str, path: &Path) -> Result<IndexingResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_indexing_config() {
        let config = IndexingConfig::default();
        assert_eq!(config.chunk_size, 750);
        assert_eq!(config.chunk_overlap, 75);
    }
}
