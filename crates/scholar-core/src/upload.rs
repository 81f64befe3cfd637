//! Uploaded document records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A document uploaded by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Uuid that also keys the document's vector store
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    pub file_path: String,
    /// Hex md5 of the file content
    pub content_hash: String,
    pub upload_time: DateTime<Utc>,
}

/// Trait for the registry of uploaded documents
#[async_trait]
pub trait UploadRegistry: Send + Sync {
    /// Register a new upload and return its record
    async fn insert(
        &self,
        user_id: &str,
        file_name: &str,
        file_path: &str,
        content_hash: &str,
    ) -> Result<UploadedFile>;

    /// All uploads of a user, oldest first
    async fn list(&self, user_id: &str) -> Result<Vec<UploadedFile>>;

    /// A single upload of the user
    async fn get(&self, user_id: &str, file_id: &str) -> Result<Option<UploadedFile>>;

    /// An upload of the user with the given content hash
    async fn find_by_hash(&self, user_id: &str, content_hash: &str) -> Result<Option<UploadedFile>>;

    /// Remove an upload record
    async fn remove(&self, user_id: &str, file_id: &str) -> Result<bool>;
}
