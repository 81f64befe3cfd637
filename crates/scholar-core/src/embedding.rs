//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for text embedding models
///
/// `embed_documents` returns exactly one vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document chunks
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension of the produced vectors
    fn dimension(&self) -> usize;

    /// Name of the underlying model
    fn model_name(&self) -> &str;
}
