//! Google Scholar search through the SerpAPI `google_scholar` engine

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use scholar_core::{Error, PaperMetadata, PaperQuery, PaperSearchProvider, PaperSource, Result};

pub const SERPAPI_SEARCH_URL: &str = "https://serpapi.com/search.json";

/// SerpAPI bills per request; larger pages are clamped
const MAX_RESULTS_PER_REQUEST: usize = 20;

static YEAR_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").ok());

#[derive(Debug, Default, Deserialize)]
struct ScholarResponse {
    error: Option<String>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    publication_info: Option<PublicationInfo>,
}

#[derive(Debug, Deserialize)]
struct PublicationInfo {
    summary: Option<String>,
    #[serde(default)]
    authors: Vec<ScholarAuthor>,
}

#[derive(Debug, Deserialize)]
struct ScholarAuthor {
    name: Option<String>,
}

pub struct GoogleScholarClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleScholarClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Configuration("SerpAPI key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: SERPAPI_SEARCH_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, query: &PaperQuery) -> Result<Url> {
        let num = query.max_results.clamp(1, MAX_RESULTS_PER_REQUEST).to_string();

        Url::parse_with_params(
            &self.base_url,
            &[
                ("engine", "google_scholar"),
                ("q", query.query.trim()),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| Error::Configuration(format!("Invalid SerpAPI URL: {}", e)))
    }
}

#[async_trait]
impl PaperSearchProvider for GoogleScholarClient {
    fn source(&self) -> PaperSource {
        PaperSource::GoogleScholar
    }

    async fn search(&self, query: &PaperQuery) -> Result<Vec<PaperMetadata>> {
        let url = self.request_url(query)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Google Scholar request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication("SerpAPI rejected the API key".to_string()));
        }
        if !status.is_success() {
            return Err(Error::Network(format!("Google Scholar returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read Google Scholar response: {}", e)))?;

        let mut papers = parse_organic_results(&body)?;
        papers.truncate(query.max_results);
        tracing::debug!(count = papers.len(), "Google Scholar results");
        Ok(papers)
    }
}

/// Last plausible publication year in a SerpAPI publication summary
fn publication_year(summary: &str) -> Option<i32> {
    YEAR_PATTERN
        .as_ref()?
        .find_iter(summary)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

fn authors_of(info: Option<&PublicationInfo>) -> String {
    let Some(info) = info else {
        return "No Authors".to_string();
    };

    let named: Vec<&str> = info
        .authors
        .iter()
        .filter_map(|a| a.name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();
    if !named.is_empty() {
        return named.join(", ");
    }

    // "A Vaswani, N Shazeer - Advances in ..., 2017 - neurips.cc"
    info.summary
        .as_deref()
        .and_then(|s| s.split(" - ").next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("No Authors")
        .to_string()
}

/// Papers of a SerpAPI Google Scholar response; an `error` field becomes an error
pub fn parse_organic_results(body: &str) -> Result<Vec<PaperMetadata>> {
    let response: ScholarResponse = serde_json::from_str(body)
        .map_err(|e| Error::Serialization(format!("Failed to parse Google Scholar response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(Error::Network(format!("SerpAPI error: {}", error)));
    }

    let papers = response
        .organic_results
        .into_iter()
        .map(|result| {
            let published = result
                .publication_info
                .as_ref()
                .and_then(|info| info.summary.as_deref())
                .and_then(publication_year)
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));

            PaperMetadata {
                paper_id: Uuid::new_v4(),
                title: result
                    .title
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "No Title".to_string()),
                authors: authors_of(result.publication_info.as_ref()),
                summary: result
                    .snippet
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "N/A".to_string()),
                link: result.link.unwrap_or_default(),
                source: PaperSource::GoogleScholar,
                published,
                updated: None,
            }
        })
        .collect();

    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "search_metadata": {"status": "Success"},
        "organic_results": [
            {
                "position": 0,
                "title": "Attention is all you need",
                "link": "https://proceedings.neurips.cc/paper/7181-attention",
                "snippet": "The dominant sequence transduction models are based on complex recurrent networks.",
                "publication_info": {
                    "summary": "A Vaswani, N Shazeer, N Parmar - Advances in neural information processing systems, 2017 - proceedings.neurips.cc",
                    "authors": [{"name": "A Vaswani"}, {"name": "N Shazeer"}]
                }
            },
            {
                "position": 1,
                "title": "BERT: Pre-training of deep bidirectional transformers",
                "publication_info": {
                    "summary": "J Devlin, MW Chang, K Lee - arXiv preprint arXiv:1810.04805, 2018 - arxiv.org"
                }
            },
            {"position": 2}
        ]
    }"#;

    #[test]
    fn test_parse_organic_results() {
        let papers = parse_organic_results(RESPONSE).unwrap();
        assert_eq!(papers.len(), 3);

        assert_eq!(papers[0].title, "Attention is all you need");
        assert_eq!(papers[0].authors, "A Vaswani, N Shazeer");
        assert_eq!(papers[0].published, NaiveDate::from_ymd_opt(2017, 1, 1));
        assert_eq!(papers[0].source, PaperSource::GoogleScholar);

        assert_eq!(papers[1].authors, "J Devlin, MW Chang, K Lee");
        assert_eq!(papers[1].summary, "N/A");
        assert_eq!(papers[1].link, "");
        assert_eq!(papers[1].published, NaiveDate::from_ymd_opt(2018, 1, 1));

        assert_eq!(papers[2].title, "No Title");
        assert_eq!(papers[2].authors, "No Authors");
        assert_eq!(papers[2].published, None);
    }

    #[test]
    fn test_serpapi_error_field() {
        let err = parse_organic_results(r#"{"error": "Invalid API key."}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid API key."));
    }

    #[test]
    fn test_request_url_clamps_page_size() {
        let client = GoogleScholarClient::new("key").unwrap();
        let url = client
            .request_url(&PaperQuery::new("graph neural networks", 100))
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        assert!(pairs.contains(&("engine".to_string(), "google_scholar".to_string())));
        assert!(pairs.contains(&("q".to_string(), "graph neural networks".to_string())));
        assert!(pairs.contains(&("num".to_string(), "20".to_string())));
        assert!(GoogleScholarClient::new("  ").is_err());
    }
}
