//! PubMed search through the NCBI E-utilities JSON API

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use scholar_core::{Error, PaperMetadata, PaperQuery, PaperSearchProvider, PaperSource, Result};

pub const PUBMED_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

pub struct PubMedClient {
    client: reqwest::Client,
    base_url: String,
    email: Option<String>,
}

impl PubMedClient {
    pub fn new(email: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: PUBMED_EUTILS_URL.to_string(),
            email: email.filter(|e| !e.trim().is_empty()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, tool: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, tool))
            .map_err(|e| Error::Configuration(format!("Invalid E-utilities URL: {}", e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("db", "pubmed").append_pair("retmode", "json");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("tool", "scholar");
            if let Some(ref email) = self.email {
                pairs.append_pair("email", email);
            }
        }

        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("PubMed request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("PubMed returned {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse PubMed response: {}", e)))
    }
}

#[async_trait]
impl PaperSearchProvider for PubMedClient {
    fn source(&self) -> PaperSource {
        PaperSource::PubMed
    }

    async fn search(&self, query: &PaperQuery) -> Result<Vec<PaperMetadata>> {
        let retmax = query.max_results.to_string();
        let search_url = self.endpoint(
            "esearch.fcgi",
            &[("term", query.query.as_str()), ("retmax", retmax.as_str())],
        )?;

        let found: ESearchResponse = self.get_json(search_url).await?;
        let ids = found.esearchresult.idlist;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids.join(",");
        let summary_url = self.endpoint("esummary.fcgi", &[("id", id_list.as_str())])?;
        let summaries: Value = self.get_json(summary_url).await?;

        let papers = parse_summaries(&summaries, &ids);
        tracing::debug!(count = papers.len(), "PubMed results");
        Ok(papers)
    }
}

/// Papers of an esummary response, in the order of `ids`
pub fn parse_summaries(response: &Value, ids: &[String]) -> Vec<PaperMetadata> {
    let Some(result) = response.get("result") else {
        return Vec::new();
    };

    ids.iter()
        .filter_map(|id| {
            let record = result.get(id)?;
            if record.get("error").is_some() {
                return None;
            }

            let title = record
                .get("title")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("No Title");

            let authors: Vec<&str> = record
                .get("authors")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(|a| a.get("name").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();

            let published = record
                .get("sortpubdate")
                .and_then(Value::as_str)
                .and_then(|d| d.get(..10))
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y/%m/%d").ok());

            Some(PaperMetadata {
                paper_id: Uuid::new_v4(),
                title: title.to_string(),
                authors: if authors.is_empty() {
                    "No Authors".to_string()
                } else {
                    authors.join(", ")
                },
                // esummary carries no abstract
                summary: "N/A".to_string(),
                link: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id),
                source: PaperSource::PubMed,
                published,
                updated: None,
            })
        })
        .collect()
}
