//! Per-document vector stores keyed by uploaded file id

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use scholar_core::{DocumentIndexer, Embedder, Error, IndexingConfig, Result};

use crate::extraction::TextExtractor;
use crate::indexer::ChunkIndexer;
use crate::vector_store::LocalVectorStore;

type StoreCell = Arc<OnceCell<Arc<LocalVectorStore>>>;

/// Builds, persists and caches one vector store per uploaded file
///
/// Each file id owns its own cell, so building one document never blocks
/// lookups of another.
pub struct DocumentStoreRegistry {
    index_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<TextExtractor>,
    config: IndexingConfig,
    cache: Mutex<HashMap<String, StoreCell>>,
}

impl DocumentStoreRegistry {
    pub fn new(
        index_dir: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<TextExtractor>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            index_dir: index_dir.into(),
            embedder,
            extractor,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn store_path(&self, file_id: &str) -> PathBuf {
        self.index_dir.join(format!("{}.json", file_id))
    }

    /// Whether a persisted store exists for the file
    pub fn exists(&self, file_id: &str) -> bool {
        self.store_path(file_id).is_file()
    }

    /// Load the persisted store; unreadable files are treated as missing
    pub fn load(&self, file_id: &str) -> Option<LocalVectorStore> {
        if !self.exists(file_id) {
            return None;
        }

        match LocalVectorStore::load_from(self.store_path(file_id)) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(file_id, error = %e, "discarding unreadable vector store");
                None
            }
        }
    }

    pub fn save(&self, file_id: &str, store: &LocalVectorStore) -> Result<()> {
        store.save_to(self.store_path(file_id))
    }

    /// Cached store, else the persisted one, else a store built from the file
    pub async fn get_or_create(
        &self,
        file_id: &str,
        file_path: impl AsRef<Path>,
    ) -> Result<Arc<LocalVectorStore>> {
        let cell = self
            .cache
            .lock()
            .await
            .entry(file_id.to_string())
            .or_default()
            .clone();

        let store = cell
            .get_or_try_init(|| async {
                match self.load(file_id) {
                    Some(store) => Ok(Arc::new(store)),
                    None => self.build(file_id, file_path.as_ref()).await,
                }
            })
            .await?;

        Ok(store.clone())
    }

    /// Drop the cached and persisted store of a file
    pub async fn remove(&self, file_id: &str) -> Result<()> {
        self.cache.lock().await.remove(file_id);

        let path = self.store_path(file_id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn build(&self, file_id: &str, file_path: &Path) -> Result<Arc<LocalVectorStore>> {
        tracing::info!(file_id, path = %file_path.display(), "building document vector store");

        let store = Arc::new(LocalVectorStore::new(self.embedder.dimension()));
        let indexer =
            ChunkIndexer::with_config(store.clone(), self.embedder.clone(), self.config.clone())?
                .with_extractor(self.extractor.clone());

        let result = indexer
            .index_from_file(file_id, file_path)
            .await
            .map_err(|e| Error::DocumentIndexer(format!("Could not process the document: {}", e)))?;

        if result.documents_indexed == 0 {
            return Err(Error::DocumentIndexer(format!(
                "Could not process the document: no text to index{}",
                result
                    .errors
                    .first()
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default()
            )));
        }

        self.save(file_id, &store)?;
        tracing::info!(file_id, chunks = result.documents_indexed, "document vector store saved");

        Ok(store)
    }
}
