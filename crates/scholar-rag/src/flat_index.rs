//! Exact L2 similarity index
//!
//! Brute-force nearest neighbour search over a flat array of vectors,
//! returning squared euclidean distances. Vector `i` is the `i`-th vector
//! added; callers keep their own id mapping alongside.

use serde::{Deserialize, Serialize};

use scholar_core::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append vectors; every vector must match the index dimension
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(Error::VectorStore(format!(
                "vector dimension {} does not match index dimension {}",
                bad.len(),
                self.dimension
            )));
        }

        self.vectors.extend(vectors.iter().cloned());
        Ok(())
    }

    /// Up to `k` nearest vectors as `(position, squared distance)`, closest first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(Error::VectorStore(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        // stable sort keeps insertion order on equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored)
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(position).map(Vec::as_slice)
    }
}

pub(crate) fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
