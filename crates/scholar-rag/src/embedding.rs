//! Offline hashing embedder
//!
//! Deterministic bag-of-words vectors without a network call, used as the
//! test embedder.

use async_trait::async_trait;

use scholar_core::{Embedder, Result};

pub const DEFAULT_HASHING_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Hash words and bigrams into a unit-length vector
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut embedding = vec![0.0f32; self.dimension];

        for word in &words {
            let (a, b) = self.buckets(word.as_bytes());
            embedding[a] += 1.0;
            embedding[b] += 0.5;
        }

        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            let (a, _) = self.buckets(bigram.as_bytes());
            embedding[a] += 0.8;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }

    fn buckets(&self, bytes: &[u8]) -> (usize, usize) {
        let digest = md5::compute(bytes);
        let hi = u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]);
        let lo = u64::from_le_bytes([
            digest[8], digest[9], digest[10], digest[11], digest[12], digest[13], digest[14],
            digest[15],
        ]);
        let dim = self.dimension as u64;
        ((hi % dim) as usize, (lo % dim) as usize)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Graph neural networks for molecules");
        let b = embedder.embed("graph neural networks for molecules");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        assert!(embedder.embed("  ").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let embedder = HashingEmbedder::default();
        let texts = vec!["protein folding".to_string(), "quantum error".to_string()];
        let vectors = embedder.embed_documents(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], embedder.embed_query("quantum error").await.unwrap());
        assert_eq!(embedder.dimension(), DEFAULT_HASHING_DIMENSION);
    }
}
