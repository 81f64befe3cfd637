//! Web tools and replies of the research agent

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One organic result of a web search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Main text of a scraped page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub title: Option<String>,
    pub content: String,
}

/// Trait for web search backends
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Top `limit` organic results for `query`
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebResult>>;
}

/// Trait for page scrapers
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage>;
}

/// A web source cited by the research agent, numbered in order of first use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: usize,
    pub title: String,
    pub url: String,
}

/// Answer of the research agent and the sources it consulted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReply {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

impl ResearchReply {
    /// Markdown reference list appended to the answer, empty without sources
    pub fn references(&self) -> String {
        if self.sources.is_empty() {
            return String::new();
        }

        let lines: Vec<String> = self
            .sources
            .iter()
            .map(|s| format!("{}. [{}]({})", s.id, s.title, s.url))
            .collect();
        format!("\n\n📌 **References**\n{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_list() {
        let mut reply = ResearchReply {
            query: "q".to_string(),
            answer: "a".to_string(),
            sources: Vec::new(),
        };
        assert_eq!(reply.references(), "");

        reply.sources = vec![
            SourceRef {
                id: 1,
                title: "RLHF explained".to_string(),
                url: "https://example.org/rlhf".to_string(),
            },
            SourceRef {
                id: 2,
                title: "PPO".to_string(),
                url: "https://example.org/ppo".to_string(),
            },
        ];
        assert_eq!(
            reply.references(),
            "\n\n📌 **References**\n1. [RLHF explained](https://example.org/rlhf)\n2. [PPO](https://example.org/ppo)"
        );
    }
}
