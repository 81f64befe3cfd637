//! Shared similarity index over the chunks of every analysed paper

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use scholar_core::Result;

use crate::flat_index::FlatIndex;

/// Dimension of a freshly created index, matching the default embedding model
pub const DEFAULT_PAPER_INDEX_DIMENSION: usize = 1536;

#[derive(Debug, Serialize, Deserialize)]
struct PaperIndexData {
    index: FlatIndex,
    paper_ids: Vec<String>,
}

/// Flat L2 index whose `i`-th vector belongs to `paper_ids[i]`
#[derive(Debug)]
pub struct PaperIndex {
    path: PathBuf,
    index: FlatIndex,
    paper_ids: Vec<String>,
}

impl PaperIndex {
    /// Empty index that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: FlatIndex::new(DEFAULT_PAPER_INDEX_DIMENSION),
            paper_ids: Vec::new(),
        }
    }

    /// Load the index at `path`; a missing, empty or unreadable file yields a fresh index
    pub fn load_or_create(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            return Self::new(path);
        }

        match Self::read(&path) {
            Ok(data) if data.index.len() == data.paper_ids.len() && !data.index.is_empty() => {
                tracing::info!(
                    path = %path.display(),
                    vectors = data.index.len(),
                    "loaded paper index"
                );
                Self {
                    path,
                    index: data.index,
                    paper_ids: data.paper_ids,
                }
            }
            Ok(data) if data.index.len() != data.paper_ids.len() => {
                tracing::warn!(
                    path = %path.display(),
                    vectors = data.index.len(),
                    ids = data.paper_ids.len(),
                    "paper index ids out of sync, creating a new one"
                );
                Self::new(path)
            }
            Ok(_) => Self::new(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "error loading paper index, creating a new one");
                Self::new(path)
            }
        }
    }

    fn read(path: &Path) -> Result<PaperIndexData> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn contains(&self, paper_id: &str) -> bool {
        self.paper_ids.iter().any(|id| id == paper_id)
    }

    /// Add the chunk embeddings of a paper; returns false when nothing was added
    pub fn add_paper(&mut self, paper_id: &str, embeddings: &[Vec<f32>]) -> Result<bool> {
        if self.contains(paper_id) || embeddings.is_empty() {
            return Ok(false);
        }

        if self.index.is_empty() && embeddings[0].len() != self.index.dimension() {
            self.index = FlatIndex::new(embeddings[0].len());
        }

        self.index.add(embeddings)?;
        self.paper_ids
            .extend(std::iter::repeat(paper_id.to_string()).take(embeddings.len()));

        Ok(true)
    }

    /// Persist the index; an empty index is never written
    pub fn save(&self) -> Result<bool> {
        if self.index.is_empty() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = PaperIndexData {
            index: self.index.clone(),
            paper_ids: self.paper_ids.clone(),
        };
        fs::write(&self.path, serde_json::to_string(&data)?)?;
        Ok(true)
    }

    /// Positions of the `k` nearest chunk vectors
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<usize>> {
        if self.index.is_empty() {
            tracing::debug!("paper index is empty, nothing to retrieve");
            return Ok(Vec::new());
        }

        let hits = self.index.search(query, k)?;
        Ok(hits.into_iter().map(|(position, _)| position).collect())
    }

    pub fn paper_id_at(&self, position: usize) -> Option<&str> {
        self.paper_ids.get(position).map(String::as_str)
    }
}
