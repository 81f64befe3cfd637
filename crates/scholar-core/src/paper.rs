//! Academic paper sources, metadata and catalog abstractions

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Supported academic sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSource {
    /// arXiv preprint server
    ArXiv,
    /// PubMed (NCBI Entrez)
    PubMed,
    /// Google Scholar
    GoogleScholar,
}

impl PaperSource {
    /// Get the display name for this source
    pub fn display_name(&self) -> &'static str {
        match self {
            PaperSource::ArXiv => "ArXiv",
            PaperSource::PubMed => "PubMed",
            PaperSource::GoogleScholar => "Google Scholar",
        }
    }

    /// Get all supported sources
    pub fn all() -> Vec<PaperSource> {
        vec![
            PaperSource::ArXiv,
            PaperSource::PubMed,
            PaperSource::GoogleScholar,
        ]
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<PaperSource> {
        match s.to_lowercase().as_str() {
            "arxiv" => Some(PaperSource::ArXiv),
            "pubmed" | "entrez" => Some(PaperSource::PubMed),
            "scholar" | "google scholar" | "googlescholar" => Some(PaperSource::GoogleScholar),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaperSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A paper as returned by a search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub paper_id: Uuid,
    pub title: String,
    pub authors: String,
    pub summary: String,
    pub link: String,
    pub source: PaperSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<NaiveDate>,
}

/// A paper saved in a user's catalog under a search index id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub paper_id: String,
    pub user_id: String,
    pub index_id: String,
    pub title: String,
    pub authors: String,
    pub summary: String,
    pub link: Option<String>,
    pub source: PaperSource,
    pub search_time: DateTime<Utc>,
}

impl PaperRecord {
    /// Build a catalog record for a search result
    pub fn from_metadata(user_id: &str, index_id: &str, paper: &PaperMetadata) -> Self {
        let link = paper.link.trim();
        Self {
            paper_id: paper.paper_id.to_string(),
            user_id: user_id.to_string(),
            index_id: index_id.to_string(),
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            summary: paper.summary.clone(),
            link: (!link.is_empty()).then(|| link.to_string()),
            source: paper.source,
            search_time: Utc::now(),
        }
    }
}

/// Parameters for a provider search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperQuery {
    /// Raw provider query string
    pub query: String,
    pub max_results: usize,
    /// Newest updates first instead of relevance
    pub sort_by_updated: bool,
}

impl PaperQuery {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            sort_by_updated: false,
        }
    }
}

/// Trait for external academic search APIs
#[async_trait]
pub trait PaperSearchProvider: Send + Sync {
    /// Source this provider queries
    fn source(&self) -> PaperSource;

    /// Run a search and return paper metadata with fresh paper ids
    async fn search(&self, query: &PaperQuery) -> Result<Vec<PaperMetadata>>;
}

/// Trait for the per-user store of searched papers
#[async_trait]
pub trait PaperCatalog: Send + Sync {
    /// Insert a record; returns false when the user already has this paper id
    async fn insert(&self, record: PaperRecord) -> Result<bool>;

    /// Fetch a paper belonging to the user
    async fn get_paper(&self, user_id: &str, paper_id: &str) -> Result<Option<PaperRecord>>;

    /// All papers of one search index for the user
    async fn papers_by_index(&self, user_id: &str, index_id: &str) -> Result<Vec<PaperRecord>>;

    /// Distinct index ids of the user, in first-seen order
    async fn index_ids(&self, user_id: &str) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_str() {
        assert_eq!(PaperSource::from_str("arxiv"), Some(PaperSource::ArXiv));
        assert_eq!(PaperSource::from_str("PubMed"), Some(PaperSource::PubMed));
        assert_eq!(
            PaperSource::from_str("Google Scholar"),
            Some(PaperSource::GoogleScholar)
        );
        assert_eq!(PaperSource::from_str("scopus"), None);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(PaperSource::ArXiv.to_string(), "ArXiv");
        assert_eq!(PaperSource::GoogleScholar.to_string(), "Google Scholar");
        assert_eq!(PaperSource::all().len(), 3);
    }

    #[test]
    fn test_record_from_metadata_drops_blank_link() {
        let paper = PaperMetadata {
            paper_id: Uuid::new_v4(),
            title: "Attention".to_string(),
            authors: "A. Author".to_string(),
            summary: "We study attention.".to_string(),
            link: "  ".to_string(),
            source: PaperSource::PubMed,
            published: None,
            updated: None,
        };

        let record = PaperRecord::from_metadata("alice", "idx-1", &paper);
        assert_eq!(record.paper_id, paper.paper_id.to_string());
        assert_eq!(record.index_id, "idx-1");
        assert_eq!(record.link, None);
    }
}
