//! Web search through Serper and page scraping through Firecrawl

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use scholar_core::{Error, Result, ScrapedPage, Scraper, WebResult, WebSearch};

pub const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";
pub const FIRECRAWL_SCRAPE_URL: &str = "https://api.firecrawl.dev/v1/scrape";

/// Firecrawl requests give up after this long
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlResponse {
    #[serde(default)]
    success: bool,
    data: Option<FirecrawlData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlData {
    markdown: Option<String>,
    content: Option<String>,
    metadata: Option<FirecrawlMetadata>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlMetadata {
    title: Option<String>,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))
}

fn require_key(api_key: String, name: &str) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(Error::Configuration(format!("{} is empty", name)));
    }
    Ok(api_key)
}

/// Google search results from serper.dev
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    search_url: String,
}

impl SerperClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(30))?,
            api_key: require_key(api_key.into(), "SERPER_API_KEY")?,
            search_url: SERPER_SEARCH_URL.to_string(),
        })
    }

    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }
}

#[async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebResult>> {
        let response = self
            .client
            .post(&self.search_url)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": limit.max(1) }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Serper request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication("Serper rejected the API key".to_string()));
        }
        if !status.is_success() {
            return Err(Error::Network(format!("Serper returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read Serper response: {}", e)))?;

        let mut results = parse_serper_results(&body)?;
        results.truncate(limit);
        tracing::debug!(query, count = results.len(), "web search results");
        Ok(results)
    }
}

/// Organic results of a Serper response; results without a link are skipped
pub fn parse_serper_results(body: &str) -> Result<Vec<WebResult>> {
    let response: SerperResponse = serde_json::from_str(body)
        .map_err(|e| Error::Serialization(format!("Failed to parse Serper response: {}", e)))?;

    Ok(response
        .organic
        .into_iter()
        .filter_map(|r| {
            let link = r.link.filter(|l| !l.trim().is_empty())?;
            Some(WebResult {
                title: r.title.unwrap_or_else(|| "No title".to_string()),
                link,
                snippet: r.snippet.unwrap_or_default(),
            })
        })
        .collect())
}

/// Page text through the Firecrawl scrape API
pub struct FirecrawlClient {
    client: reqwest::Client,
    api_key: String,
    scrape_url: String,
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(SCRAPE_TIMEOUT)?,
            api_key: require_key(api_key.into(), "FIRECRAWL_API_KEY")?,
            scrape_url: FIRECRAWL_SCRAPE_URL.to_string(),
        })
    }

    pub fn with_scrape_url(mut self, scrape_url: impl Into<String>) -> Self {
        self.scrape_url = scrape_url.into();
        self
    }
}

#[async_trait]
impl Scraper for FirecrawlClient {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let response = self
            .client
            .post(&self.scrape_url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "url": url, "formats": ["markdown"] }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Scraping {} timed out", url))
                } else {
                    Error::Network(format!("Firecrawl request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Extraction(format!("Firecrawl returned {} for {}", status, url)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read Firecrawl response: {}", e)))?;

        parse_firecrawl_page(&body)
    }
}

/// Title and text of a Firecrawl scrape response
pub fn parse_firecrawl_page(body: &str) -> Result<ScrapedPage> {
    let response: FirecrawlResponse = serde_json::from_str(body)
        .map_err(|e| Error::Serialization(format!("Failed to parse Firecrawl response: {}", e)))?;

    let data = match response.data {
        Some(data) if response.success => data,
        _ => {
            return Err(Error::Extraction(
                response
                    .error
                    .unwrap_or_else(|| "Firecrawl returned no page".to_string()),
            ));
        }
    };

    Ok(ScrapedPage {
        title: data
            .metadata
            .and_then(|m| m.title)
            .filter(|t| !t.trim().is_empty()),
        content: data.markdown.or(data.content).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serper_results() {
        let body = r#"{
            "searchParameters": {"q": "rlhf"},
            "organic": [
                {"title": "RLHF explained", "link": "https://example.org/rlhf", "snippet": "Reward models.", "position": 1},
                {"title": "No link"},
                {"link": "https://example.org/untitled"}
            ]
        }"#;

        let results = parse_serper_results(body).unwrap();
        assert_eq!(
            results,
            vec![
                WebResult {
                    title: "RLHF explained".to_string(),
                    link: "https://example.org/rlhf".to_string(),
                    snippet: "Reward models.".to_string(),
                },
                WebResult {
                    title: "No title".to_string(),
                    link: "https://example.org/untitled".to_string(),
                    snippet: String::new(),
                },
            ]
        );
        assert!(parse_serper_results(r#"{"organic": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_firecrawl_page() {
        let page = parse_firecrawl_page(
            r##"{"success": true, "data": {"markdown": "# PPO\nClipped objective.", "metadata": {"title": "PPO paper", "statusCode": 200}}}"##,
        )
        .unwrap();
        assert_eq!(page.title.as_deref(), Some("PPO paper"));
        assert_eq!(page.content, "# PPO\nClipped objective.");

        let legacy = parse_firecrawl_page(r#"{"success": true, "data": {"content": "Plain"}}"#).unwrap();
        assert_eq!(legacy.title, None);
        assert_eq!(legacy.content, "Plain");

        let err = parse_firecrawl_page(r#"{"success": false, "error": "blocked"}"#).unwrap_err();
        assert!(matches!(err, Error::Extraction(ref msg) if msg == "blocked"));
    }

    #[test]
    fn test_empty_keys_are_rejected() {
        assert!(SerperClient::new(" ").is_err());
        assert!(FirecrawlClient::new("").is_err());
        assert!(SerperClient::new("key").is_ok());
    }
}
