//! Paper search across academic sources
//!
//! Every configured provider is queried in turn. A failing provider is
//! logged and contributes no results. Each returned paper is saved in the
//! user's catalog under the search's index id, with the same paper id the
//! response carries.

mod arxiv;
mod pubmed;
mod scholar;

pub use arxiv::{ARXIV_API_URL, ArxivClient, parse_atom_feed};
pub use pubmed::{PUBMED_EUTILS_URL, PubMedClient, parse_summaries};
pub use scholar::{GoogleScholarClient, SERPAPI_SEARCH_URL, parse_organic_results};

use chrono::Datelike;
use std::sync::Arc;
use validator::Validate;

use scholar_core::{
    PaperCatalog, PaperMetadata, PaperQuery, PaperRecord, PaperSearchProvider,
    PaperSearchRequest, PaperSearchResponse, PaperSource, Result,
};

pub struct SearchService {
    providers: Vec<Arc<dyn PaperSearchProvider>>,
    catalog: Arc<dyn PaperCatalog>,
}

impl SearchService {
    pub fn new(catalog: Arc<dyn PaperCatalog>) -> Self {
        Self {
            providers: Vec::new(),
            catalog,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn PaperSearchProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn sources(&self) -> Vec<PaperSource> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    pub async fn search(
        &self,
        user_id: &str,
        index_id: &str,
        request: &PaperSearchRequest,
    ) -> Result<PaperSearchResponse> {
        request.validate()?;

        let query = PaperQuery::new(request.query.clone(), request.num_papers);
        let mut results: Vec<PaperMetadata> = Vec::new();

        for provider in &self.providers {
            match provider.search(&query).await {
                Ok(papers) => {
                    let before = results.len();
                    results.extend(
                        papers
                            .into_iter()
                            .filter(|p| meets_min_year(p, request.min_year)),
                    );
                    tracing::info!(
                        source = %provider.source(),
                        count = results.len() - before,
                        "search results"
                    );
                }
                Err(e) => {
                    tracing::warn!(source = %provider.source(), error = %e, "search source failed");
                }
            }
        }

        for paper in &results {
            let record = PaperRecord::from_metadata(user_id, index_id, paper);
            self.catalog.insert(record).await?;
        }

        Ok(PaperSearchResponse {
            query: request.query.clone(),
            index_id: index_id.to_string(),
            results,
        })
    }
}

/// arXiv papers must have been updated in or after `min_year`
fn meets_min_year(paper: &PaperMetadata, min_year: i32) -> bool {
    if paper.source != PaperSource::ArXiv {
        return true;
    }

    match paper.updated.or(paper.published) {
        Some(date) => date.year() >= min_year,
        None => true,
    }
}
