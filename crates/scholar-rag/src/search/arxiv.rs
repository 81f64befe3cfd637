//! arXiv search through the Atom export API

use async_trait::async_trait;
use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use scholar_core::{Error, PaperMetadata, PaperQuery, PaperSearchProvider, PaperSource, Result};

pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivClient {
    client: reqwest::Client,
    api_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: ARXIV_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn request_url(&self, query: &PaperQuery) -> Result<Url> {
        let sort_by = if query.sort_by_updated {
            "lastUpdatedDate"
        } else {
            "relevance"
        };
        let max_results = query.max_results.to_string();

        Url::parse_with_params(
            &self.api_url,
            &[
                ("search_query", query.query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", sort_by),
                ("sortOrder", "descending"),
            ],
        )
        .map_err(|e| Error::Configuration(format!("Invalid arXiv API URL: {}", e)))
    }
}

#[async_trait]
impl PaperSearchProvider for ArxivClient {
    fn source(&self) -> PaperSource {
        PaperSource::ArXiv
    }

    async fn search(&self, query: &PaperQuery) -> Result<Vec<PaperMetadata>> {
        let url = self.request_url(query)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("arXiv request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("arXiv returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read arXiv response: {}", e)))?;

        let papers = parse_atom_feed(&body)?;
        tracing::debug!(count = papers.len(), "arXiv results");
        Ok(papers)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_pdf_link(link: &Link) -> bool {
    link.title.as_deref() == Some("pdf") || link.media_type.as_deref() == Some("application/pdf")
}

fn summary_text(entry: &Entry) -> String {
    entry
        .summary
        .as_ref()
        .map(|t| collapse_whitespace(&t.content))
        .unwrap_or_default()
}

/// Papers of an arXiv Atom feed; an API error entry becomes an error
pub fn parse_atom_feed(xml: &str) -> Result<Vec<PaperMetadata>> {
    let feed = parser::parse(xml.as_bytes())
        .map_err(|e| Error::Serialization(format!("Invalid arXiv feed: {}", e)))?;
    let mut papers = Vec::new();

    for entry in feed.entries {
        if entry.id.contains("/api/errors") {
            let message = Some(summary_text(&entry))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| entry.id.clone());
            return Err(Error::Network(format!("arXiv API error: {}", message)));
        }

        let Some(title) = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let authors = entry
            .authors
            .iter()
            .map(|a| collapse_whitespace(&a.name))
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let link = entry
            .links
            .iter()
            .find(|l| is_pdf_link(l))
            .map(|l| l.href.clone())
            .unwrap_or_else(|| entry.id.clone());

        papers.push(PaperMetadata {
            paper_id: Uuid::new_v4(),
            title,
            authors,
            summary: summary_text(&entry),
            link,
            source: PaperSource::ArXiv,
            published: entry.published.map(|d| d.date_naive()),
            updated: entry.updated.map(|d| d.date_naive()),
        });
    }

    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:attention</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on
      recurrent networks &amp; convolutions.
    </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <updated>2021-01-01T00:00:00Z</updated>
    <published>2021-01-01T00:00:00Z</published>
    <title>No PDF Link</title>
    <summary>Short.</summary>
    <author><name>Solo Author</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_feed() {
        let papers = parse_atom_feed(FEED).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.title, "Attention Is All You Need");
        assert_eq!(first.authors, "Ashish Vaswani, Noam Shazeer");
        assert_eq!(
            first.summary,
            "The dominant sequence transduction models are based on recurrent networks & convolutions."
        );
        assert_eq!(first.link, "http://arxiv.org/pdf/1706.03762v7");
        assert_eq!(first.published, NaiveDate::from_ymd_opt(2017, 6, 12));
        assert_eq!(first.updated, NaiveDate::from_ymd_opt(2023, 8, 2));

        assert_eq!(papers[1].link, "http://arxiv.org/abs/2101.00001v1");
        assert_ne!(papers[0].paper_id, papers[1].paper_id);
    }

    #[test]
    fn test_api_error_entry() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
            <title>Error</title>
            <summary>incorrect id format for 1234</summary>
        </entry></feed>"#;

        let err = parse_atom_feed(feed).unwrap_err();
        assert!(err.to_string().contains("incorrect id format"));
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let err = parse_atom_feed("<html><body>rate limited</body>").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_request_url() {
        let client = ArxivClient::new().unwrap();
        let mut query = PaperQuery::new("graph neural networks", 5);
        query.sort_by_updated = true;

        let url = client.request_url(&query).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        assert!(pairs.contains(&("search_query".to_string(), "graph neural networks".to_string())));
        assert!(pairs.contains(&("max_results".to_string(), "5".to_string())));
        assert!(pairs.contains(&("sortBy".to_string(), "lastUpdatedDate".to_string())));
    }
}
