//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, VectorDocument};

/// Query for RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGQuery {
    pub query: String,
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl RAGQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

impl Default for RAGQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 4,
            score_threshold: None,
        }
    }
}

/// Result from RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    pub documents: Vec<VectorDocument>,
    pub context: String,
    pub metadata: Option<serde_json::Value>,
}

/// Trait for RAG engines
///
/// An engine retrieves the chunks most relevant to a query and turns them
/// into prompt context.
#[async_trait]
pub trait RAGEngine: Send + Sync {
    /// Retrieve relevant documents for a query
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult>;

    /// Build context from retrieved documents
    fn build_context(&self, documents: &[VectorDocument]) -> String;
}
