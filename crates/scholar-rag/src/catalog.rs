//! JSON-file catalogs of searched papers and uploaded documents

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use scholar_core::{
    Error, PaperCatalog, PaperRecord, Result, UploadRegistry, UploadedFile,
};

/// Records stored at `path`; a missing file is an empty catalog
///
/// An unparseable file is reported and left in place, never replaced.
fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "catalog file is corrupt");
        Error::Serialization(format!(
            "{} is corrupt, fix or move it aside: {}",
            path.display(),
            e
        ))
    })
}

async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).await?;
    Ok(())
}

/// File-based implementation of [`PaperCatalog`]
pub struct FilePaperCatalog {
    records: RwLock<Vec<PaperRecord>>,
    file_path: PathBuf,
}

impl FilePaperCatalog {
    /// Open the catalog, loading the records already saved at `file_path`
    pub fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        Ok(Self {
            records: RwLock::new(load_records(&file_path)?),
            file_path,
        })
    }
}

#[async_trait]
impl PaperCatalog for FilePaperCatalog {
    async fn insert(&self, record: PaperRecord) -> Result<bool> {
        let mut records = self.records.write().await;

        if records
            .iter()
            .any(|r| r.user_id == record.user_id && r.paper_id == record.paper_id)
        {
            return Ok(false);
        }

        let mut updated = records.clone();
        updated.push(record);
        write_records(&self.file_path, &updated).await?;

        *records = updated;
        Ok(true)
    }

    async fn get_paper(&self, user_id: &str, paper_id: &str) -> Result<Option<PaperRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.user_id == user_id && r.paper_id == paper_id)
            .cloned())
    }

    async fn papers_by_index(&self, user_id: &str, index_id: &str) -> Result<Vec<PaperRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.index_id == index_id)
            .cloned()
            .collect())
    }

    async fn index_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let records = self.records.read().await;
        let mut ids: Vec<String> = Vec::new();

        for record in records.iter().filter(|r| r.user_id == user_id) {
            if !ids.contains(&record.index_id) {
                ids.push(record.index_id.clone());
            }
        }

        Ok(ids)
    }
}

/// File-based implementation of [`UploadRegistry`]
pub struct FileUploadRegistry {
    files: RwLock<Vec<UploadedFile>>,
    file_path: PathBuf,
}

impl FileUploadRegistry {
    pub fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        Ok(Self {
            files: RwLock::new(load_records(&file_path)?),
            file_path,
        })
    }
}

#[async_trait]
impl UploadRegistry for FileUploadRegistry {
    async fn insert(
        &self,
        user_id: &str,
        file_name: &str,
        file_path: &str,
        content_hash: &str,
    ) -> Result<UploadedFile> {
        let record = UploadedFile {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            content_hash: content_hash.to_string(),
            upload_time: Utc::now(),
        };

        let mut files = self.files.write().await;
        let mut updated = files.clone();
        updated.push(record.clone());
        write_records(&self.file_path, &updated).await?;

        *files = updated;
        Ok(record)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<UploadedFile>> {
        let files = self.files.read().await;
        Ok(files.iter().filter(|f| f.user_id == user_id).cloned().collect())
    }

    async fn get(&self, user_id: &str, file_id: &str) -> Result<Option<UploadedFile>> {
        let files = self.files.read().await;
        Ok(files
            .iter()
            .find(|f| f.user_id == user_id && f.id == file_id)
            .cloned())
    }

    async fn find_by_hash(&self, user_id: &str, content_hash: &str) -> Result<Option<UploadedFile>> {
        let files = self.files.read().await;
        Ok(files
            .iter()
            .find(|f| f.user_id == user_id && f.content_hash == content_hash)
            .cloned())
    }

    async fn remove(&self, user_id: &str, file_id: &str) -> Result<bool> {
        let mut files = self.files.write().await;
        let updated: Vec<UploadedFile> = files
            .iter()
            .filter(|f| !(f.user_id == user_id && f.id == file_id))
            .cloned()
            .collect();

        if updated.len() == files.len() {
            return Ok(false);
        }

        write_records(&self.file_path, &updated).await?;
        *files = updated;
        Ok(true)
    }
}
