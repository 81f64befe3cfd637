//! Analysis reports over papers from the user's catalog
//!
//! Selected papers are first ingested into the shared paper index (unless
//! already present), then the index is searched with the papers' titles and
//! summaries to pull in related material before the report is generated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use scholar_core::{
    AnalysisRequest, AnalysisResponse, Embedder, Error, GenerationConfig, LLMProvider,
    PaperCatalog, PaperRecord, Result, RetryConfig,
};

use crate::chunker::TextSplitter;
use crate::extraction::TextExtractor;
use crate::paper_index::PaperIndex;
use crate::prompts::{multi_paper_report_prompt, single_paper_report_prompt};

/// Related chunks retrieved from the paper index
pub const RELATED_TOP_K: usize = 5;
const MAX_QUERY_CHARS: usize = 8000;
const PREVIEW_CHARS: usize = 500;
const RELATED_CONTENT_CHARS: usize = 1000;
const NO_LINK: &str = "No link available";

#[derive(Debug, Clone)]
struct SourceRef {
    paper_id: String,
    title: String,
    authors: String,
    link: String,
}

impl SourceRef {
    fn from_record(paper: &PaperRecord) -> Self {
        Self {
            paper_id: paper.paper_id.clone(),
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            link: paper.link.clone().unwrap_or_else(|| NO_LINK.to_string()),
        }
    }
}

pub struct AnalysisService {
    catalog: Arc<dyn PaperCatalog>,
    paper_index: Arc<RwLock<PaperIndex>>,
    extractor: Arc<TextExtractor>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LLMProvider>,
    splitter: TextSplitter,
    generation: GenerationConfig,
    retry: RetryConfig,
}

impl AnalysisService {
    pub fn new(
        catalog: Arc<dyn PaperCatalog>,
        paper_index: Arc<RwLock<PaperIndex>>,
        extractor: Arc<TextExtractor>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LLMProvider>,
    ) -> Self {
        let generation = GenerationConfig {
            max_tokens: 4096,
            ..llm.generation_config()
        };

        Self {
            catalog,
            paper_index,
            extractor,
            embedder,
            llm,
            splitter: TextSplitter::default(),
            generation,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub async fn generate_report(
        &self,
        user_id: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse> {
        request.validate()?;

        let paper_ids: Vec<String> = request
            .selected_paper_ids
            .iter()
            .map(|id| id.to_string())
            .collect();
        let mut extracted: HashMap<String, Option<String>> = HashMap::new();

        self.ingest_new_papers(user_id, &paper_ids, &mut extracted).await;

        let mut sources: Vec<SourceRef> = Vec::new();
        let mut paper_details: Vec<String> = Vec::new();
        let mut papers_text: Vec<String> = Vec::new();

        for paper_id in &paper_ids {
            let Some(paper) = self.catalog.get_paper(user_id, paper_id).await? else {
                tracing::warn!(user_id, paper_id = %paper_id, "selected paper not in catalog");
                continue;
            };

            if !sources.iter().any(|s| s.paper_id == paper.paper_id) {
                sources.push(SourceRef::from_record(&paper));
            }

            let mut info = vec![
                format!("Title: {}", paper.title),
                format!("Authors: {}", paper.authors),
                format!("Summary: {}", paper.summary),
            ];

            if let Some(ref link) = paper.link {
                info.push(format!("Source: {}", link));
                if let Some(content) = self.extract_cached(link, &mut extracted).await {
                    let preview = if content.chars().count() > PREVIEW_CHARS {
                        format!("{}...", truncate_chars(&content, PREVIEW_CHARS))
                    } else {
                        content
                    };
                    info.push(format!("Extracted Content Preview: {}", preview));
                }
            }

            paper_details.push(info.join("\n"));
            papers_text.push(format!("{} {}", paper.title, paper.summary));
        }

        if paper_details.is_empty() {
            return Err(Error::NotFound("No valid papers found for analysis".to_string()));
        }

        let retrieved_texts = self
            .related_content(user_id, &papers_text.join(" "), &mut sources, &mut extracted)
            .await?;

        let prompt = if request.selected_paper_ids.len() == 1 {
            single_paper_report_prompt(
                &paper_details[0],
                &retrieved_texts,
                &request.sections,
                request.word_limit,
            )
        } else {
            multi_paper_report_prompt(
                &paper_details,
                &retrieved_texts,
                &request.sections,
                request.word_limit,
            )
        };

        tracing::info!(
            user_id,
            papers = paper_details.len(),
            related = retrieved_texts.len(),
            "generating analysis report"
        );

        let result = self
            .llm
            .generate_with_retry(&prompt, &self.generation, &self.retry)
            .await?;

        Ok(AnalysisResponse {
            report: format!("{}\n\n{}", result.text.trim(), format_references(&sources)),
        })
    }

    /// Chunk, embed and index selected papers the shared index does not know yet
    async fn ingest_new_papers(
        &self,
        user_id: &str,
        paper_ids: &[String],
        extracted: &mut HashMap<String, Option<String>>,
    ) {
        let new_ids: Vec<&String> = {
            let index = self.paper_index.read().await;
            paper_ids.iter().filter(|id| !index.contains(id)).collect()
        };

        if new_ids.is_empty() {
            tracing::debug!("all selected papers already indexed");
            return;
        }

        for paper_id in new_ids {
            if let Err(e) = self.ingest_paper(user_id, paper_id, extracted).await {
                tracing::warn!(paper_id = %paper_id, error = %e, "failed to index paper");
            }
        }
    }

    async fn ingest_paper(
        &self,
        user_id: &str,
        paper_id: &str,
        extracted: &mut HashMap<String, Option<String>>,
    ) -> Result<()> {
        let Some(paper) = self.catalog.get_paper(user_id, paper_id).await? else {
            return Err(Error::NotFound(format!("paper {}", paper_id)));
        };

        let mut text = format!(
            "Title: {}\nAuthors: {}\nSummary: {}",
            paper.title, paper.authors, paper.summary
        );
        if let Some(ref link) = paper.link {
            if let Some(content) = self.extract_cached(link, extracted).await {
                text.push_str("\nExtracted Content:\n");
                text.push_str(&content);
            }
        }

        let chunks = self.splitter.split_text(&text);
        if chunks.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_documents(&chunks).await?;

        let mut index = self.paper_index.write().await;
        if index.add_paper(paper_id, &embeddings)? {
            index.save()?;
            tracing::info!(paper_id, chunks = chunks.len(), "paper indexed");
        }

        Ok(())
    }

    /// Content blocks of indexed papers closest to the selected ones
    async fn related_content(
        &self,
        user_id: &str,
        query: &str,
        sources: &mut Vec<SourceRef>,
        extracted: &mut HashMap<String, Option<String>>,
    ) -> Result<Vec<String>> {
        let query_vector = self
            .embedder
            .embed_query(truncate_chars(query, MAX_QUERY_CHARS))
            .await?;

        let hit_ids: Vec<String> = {
            let index = self.paper_index.read().await;
            index
                .search(&query_vector, RELATED_TOP_K)?
                .into_iter()
                .filter_map(|position| index.paper_id_at(position).map(str::to_string))
                .collect()
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut retrieved = Vec::new();

        for paper_id in hit_ids {
            let Some(paper) = self.catalog.get_paper(user_id, &paper_id).await? else {
                continue;
            };

            if !sources.iter().any(|s| s.paper_id == paper.paper_id) {
                sources.push(SourceRef::from_record(&paper));
            }

            let mut content = vec![
                format!("[Source: {}]", paper.title),
                format!("Summary: {}", paper.summary),
            ];
            if let Some(ref link) = paper.link {
                if let Some(text) = self.extract_cached(link, extracted).await {
                    content.push("Extracted content:".to_string());
                    content.push(truncate_chars(&text, RELATED_CONTENT_CHARS).to_string());
                }
            }

            let block = content.join("\n");
            if seen.insert(block.clone()) {
                retrieved.push(block);
            }
        }

        Ok(retrieved)
    }

    async fn extract_cached(
        &self,
        link: &str,
        cache: &mut HashMap<String, Option<String>>,
    ) -> Option<String> {
        if let Some(cached) = cache.get(link) {
            return cached.clone();
        }

        let content = match self.extractor.extract_from_link(link).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(link, error = %e, "could not extract linked content");
                None
            }
        };

        cache.insert(link.to_string(), content.clone());
        content
    }
}

fn format_references(sources: &[SourceRef]) -> String {
    let mut references = String::from("References:\n");
    for source in sources {
        references.push_str(&format!(
            "- {} by {}\n  Link: {}\n",
            source.title, source.authors, source.link
        ));
    }
    references.trim_end().to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_format_references() {
        let sources = vec![
            SourceRef {
                paper_id: "1".to_string(),
                title: "Paper One".to_string(),
                authors: "A. Author".to_string(),
                link: "https://arxiv.org/pdf/1".to_string(),
            },
            SourceRef {
                paper_id: "2".to_string(),
                title: "Paper Two".to_string(),
                authors: "B. Author".to_string(),
                link: NO_LINK.to_string(),
            },
        ];

        assert_eq!(
            format_references(&sources),
            "References:\n- Paper One by A. Author\n  Link: https://arxiv.org/pdf/1\n- Paper Two by B. Author\n  Link: No link available"
        );
    }
}
