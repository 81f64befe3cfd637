//! Local vector store with JSON persistence

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use scholar_core::{Error, Result, SearchConfig, SearchResult, VectorDocument, VectorStore};

use crate::flat_index::squared_l2;

#[derive(Debug, Serialize, Deserialize)]
struct VectorStoreData {
    documents: Vec<VectorDocument>,
    embedding_dimension: usize,
}

#[derive(Debug)]
struct StoreState {
    documents: Vec<VectorDocument>,
    embedding_dimension: usize,
}

impl StoreState {
    fn has_vectors(&self) -> bool {
        self.documents
            .iter()
            .any(|d| d.embedding.as_ref().is_some_and(|e| !e.is_empty()))
    }

    /// Check the embedding lengths of an insert, adopting the first length into an empty store
    fn accept(&mut self, documents: &[VectorDocument]) -> Result<()> {
        let mut lengths = documents
            .iter()
            .filter_map(|d| d.embedding.as_ref().map(Vec::len))
            .filter(|len| *len > 0);

        let Some(first) = lengths.next() else {
            return Ok(());
        };

        let expected = if self.has_vectors() {
            self.embedding_dimension
        } else {
            first
        };

        if let Some(len) = std::iter::once(first).chain(lengths).find(|len| *len != expected) {
            return Err(Error::VectorStore(format!(
                "embedding dimension {} does not match store dimension {}",
                len, expected
            )));
        }

        if expected != self.embedding_dimension {
            tracing::info!(
                from = self.embedding_dimension,
                to = expected,
                "empty vector store adopting embedding dimension"
            );
            self.embedding_dimension = expected;
        }
        Ok(())
    }

    fn upsert(&mut self, document: VectorDocument) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }
}

/// In-memory vector store ranking chunks by euclidean distance
///
/// Documents keep insertion order, so equally distant chunks come back in
/// the order they were stored. Every stored embedding has the store's
/// dimension; an empty store takes the dimension of the first vectors it
/// receives.
#[derive(Debug)]
pub struct LocalVectorStore {
    state: Arc<RwLock<StoreState>>,
}

impl LocalVectorStore {
    /// Create an empty store expecting vectors of the given dimension
    pub fn new(embedding_dimension: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                documents: Vec::new(),
                embedding_dimension,
            })),
        }
    }

    pub fn embedding_dimension(&self) -> usize {
        self.read_state()
            .map(|state| state.embedding_dimension)
            .unwrap_or_default()
    }

    /// Load a store previously written with [`LocalVectorStore::save_to`]
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let data: VectorStoreData = serde_json::from_str(&content)?;

        Ok(Self {
            state: Arc::new(RwLock::new(StoreState {
                documents: data.documents,
                embedding_dimension: data.embedding_dimension,
            })),
        })
    }

    /// Write the store as JSON, creating parent directories as needed
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = {
            let state = self.read_state()?;
            VectorStoreData {
                documents: state.documents.clone(),
                embedding_dimension: state.embedding_dimension,
            }
        };

        let content = serde_json::to_string(&data)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn store(&self, document: VectorDocument) -> Result<String> {
        let id = document.id.clone();
        let mut state = self.write_state()?;
        state.accept(std::slice::from_ref(&document))?;
        state.upsert(document);
        Ok(id)
    }

    async fn store_batch(&self, documents: Vec<VectorDocument>) -> Result<Vec<String>> {
        let mut state = self.write_state()?;
        state.accept(&documents)?;

        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(document.id.clone());
            state.upsert(document);
        }

        Ok(ids)
    }

    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult> {
        let state = self.read_state()?;

        if vector.len() != state.embedding_dimension {
            return Err(Error::VectorStore(format!(
                "query dimension {} does not match store dimension {}",
                vector.len(),
                state.embedding_dimension
            )));
        }

        let mut results: Vec<(f32, VectorDocument)> = state
            .documents
            .iter()
            .filter_map(|doc| {
                let embedding = doc.embedding.as_ref()?;
                if embedding.len() != vector.len() {
                    return None;
                }
                let distance = squared_l2(vector, embedding);
                let mut doc_with_score = doc.clone();
                doc_with_score.score = Some(1.0 / (1.0 + distance));
                Some((distance, doc_with_score))
            })
            .filter(|(_, doc)| match config.score_threshold {
                Some(threshold) => doc.score.unwrap_or(0.0) >= threshold,
                None => true,
            })
            .collect();

        results.sort_by(|a, b| a.0.total_cmp(&b.0));
        results.truncate(config.top_k);

        let documents: Vec<VectorDocument> = results.into_iter().map(|(_, doc)| doc).collect();
        let total = documents.len();

        Ok(SearchResult { documents, total })
    }

    async fn get(&self, id: &str) -> Result<Option<VectorDocument>> {
        let state = self.read_state()?;
        Ok(state.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.write_state()?;
        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        Ok(state.documents.len() != before)
    }

    async fn clear(&self) -> Result<()> {
        self.write_state()?.documents.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read_state()?.documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, content: &str, embedding: Vec<f32>) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            content: content.to_string(),
            embedding: Some(embedding),
            metadata: json!({}),
            score: None,
        }
    }

    #[tokio::test]
    async fn test_store_replaces_same_id() {
        let store = LocalVectorStore::new(2);

        store.store(doc("a", "first", vec![0.0, 0.0])).await.unwrap();
        store.store(doc("a", "second", vec![1.0, 1.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get("a").await.unwrap().unwrap();
        assert_eq!(stored.content, "second");
    }

    #[tokio::test]
    async fn test_search_ranks_nearest_first() {
        let store = LocalVectorStore::new(2);
        store
            .store_batch(vec![
                doc("far", "far away", vec![3.0, 4.0]),
                doc("near", "close by", vec![0.0, 1.0]),
                doc("none", "no vector", vec![]),
            ])
            .await
            .unwrap();

        let config = SearchConfig {
            top_k: 5,
            score_threshold: None,
        };
        let result = store.search_by_vector(&[0.0, 0.0], &config).await.unwrap();

        let ids: Vec<&str> = result.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert_eq!(result.documents[0].score, Some(0.5));
        assert_eq!(result.total, 2);
    }

    #[tokio::test]
    async fn test_search_applies_threshold_and_top_k() {
        let store = LocalVectorStore::new(1);
        store
            .store_batch(vec![
                doc("0", "zero", vec![0.0]),
                doc("1", "one", vec![1.0]),
                doc("2", "two", vec![2.0]),
            ])
            .await
            .unwrap();

        let config = SearchConfig {
            top_k: 1,
            score_threshold: None,
        };
        let result = store.search_by_vector(&[0.0], &config).await.unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].id, "0");

        let config = SearchConfig {
            top_k: 10,
            score_threshold: Some(0.4),
        };
        let result = store.search_by_vector(&[0.0], &config).await.unwrap();
        assert_eq!(result.total, 2);
    }

    #[tokio::test]
    async fn test_query_dimension_checked() {
        let store = LocalVectorStore::new(3);
        let result = store.search_by_vector(&[1.0], &SearchConfig::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejects_mismatched_embeddings() {
        let store = LocalVectorStore::new(4);
        store.store(doc("a", "a", vec![1.0, 0.0, 0.0, 0.0])).await.unwrap();

        let err = store
            .store_batch(vec![
                doc("b", "b", vec![0.0, 1.0, 0.0, 0.0]),
                doc("c", "c", vec![1.0, 1.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_adopts_first_dimension() {
        let store = LocalVectorStore::new(1536);
        store
            .store_batch(vec![doc("a", "a", vec![0.0; 768]), doc("b", "b", vec![1.0; 768])])
            .await
            .unwrap();
        assert_eq!(store.embedding_dimension(), 768);

        let result = store
            .search_by_vector(&[0.0; 768], &SearchConfig::default())
            .await
            .unwrap();
        assert_eq!(result.documents[0].id, "a");

        assert!(store.search_by_vector(&[0.0; 1536], &SearchConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = LocalVectorStore::new(1);
        store.store(doc("x", "x", vec![1.0])).await.unwrap();
        store.store(doc("y", "y", vec![2.0])).await.unwrap();

        assert!(store.delete("x").await.unwrap());
        assert!(!store.delete("x").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexes").join("file.json");

        let store = LocalVectorStore::new(2);
        store.store(doc("c0", "chunk zero", vec![0.5, 0.5])).await.unwrap();
        store.save_to(&path).unwrap();

        let loaded = LocalVectorStore::load_from(&path).unwrap();
        assert_eq!(loaded.embedding_dimension(), 2);
        assert_eq!(loaded.count().await.unwrap(), 1);
        assert_eq!(loaded.get("c0").await.unwrap().unwrap().content, "chunk zero");
    }
}
