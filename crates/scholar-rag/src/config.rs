//! Storage locations and pipeline settings

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use scholar_core::{Error, IndexingConfig, Result};

pub const DEFAULT_PAPER_INDEX_PATH: &str = "faiss_paper_index.json";
pub const DEFAULT_DOCUMENT_INDEX_DIR: &str = "faiss_indexes";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_CATALOG_PATH: &str = "search_history.json";
pub const DEFAULT_UPLOADS_PATH: &str = "uploaded_files.json";

/// Where the assistant keeps its state, and how documents are chunked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    pub paper_index_path: PathBuf,
    pub document_index_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub uploads_path: PathBuf,
    /// Contact address sent with NCBI E-utilities requests
    pub entrez_email: Option<String>,
    /// Enables Google Scholar search
    #[serde(skip)]
    pub serpapi_api_key: Option<String>,
    /// Enables the research agent together with `firecrawl_api_key`
    #[serde(skip)]
    pub serper_api_key: Option<String>,
    #[serde(skip)]
    pub firecrawl_api_key: Option<String>,
    pub indexing: IndexingConfig,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            paper_index_path: PathBuf::from(DEFAULT_PAPER_INDEX_PATH),
            document_index_dir: PathBuf::from(DEFAULT_DOCUMENT_INDEX_DIR),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            uploads_path: PathBuf::from(DEFAULT_UPLOADS_PATH),
            entrez_email: None,
            serpapi_api_key: None,
            serper_api_key: None,
            firecrawl_api_key: None,
            indexing: IndexingConfig::default(),
        }
    }
}

impl AssistantSettings {
    /// Create settings from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };
        let secret = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str, default: usize| -> Result<usize> {
            match lookup(key) {
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    Error::Configuration(format!("{} is not a valid number: {}", key, raw))
                }),
                None => Ok(default),
            }
        };

        let indexing = IndexingConfig {
            chunk_size: number("CHUNK_SIZE", defaults.indexing.chunk_size)?,
            chunk_overlap: number("CHUNK_OVERLAP", defaults.indexing.chunk_overlap)?,
        };

        if indexing.chunk_overlap >= indexing.chunk_size {
            return Err(Error::Configuration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                indexing.chunk_overlap, indexing.chunk_size
            )));
        }

        Ok(Self {
            paper_index_path: path("PAPER_INDEX_PATH", defaults.paper_index_path),
            document_index_dir: path("DOCUMENT_INDEX_DIR", defaults.document_index_dir),
            upload_dir: path("UPLOAD_DIR", defaults.upload_dir),
            catalog_path: path("CATALOG_PATH", defaults.catalog_path),
            uploads_path: path("UPLOADS_PATH", defaults.uploads_path),
            entrez_email: lookup("ENTREZ_EMAIL").filter(|v| !v.trim().is_empty()),
            serpapi_api_key: secret("SERPAPI_API_KEY"),
            serper_api_key: secret("SERPER_API_KEY"),
            firecrawl_api_key: secret("FIRECRAWL_API_KEY"),
            indexing,
        })
    }

    /// Settings with every path placed under `root`
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            paper_index_path: root.join(DEFAULT_PAPER_INDEX_PATH),
            document_index_dir: root.join(DEFAULT_DOCUMENT_INDEX_DIR),
            upload_dir: root.join(DEFAULT_UPLOAD_DIR),
            catalog_path: root.join(DEFAULT_CATALOG_PATH),
            uploads_path: root.join(DEFAULT_UPLOADS_PATH),
            ..Self::default()
        }
    }
}
