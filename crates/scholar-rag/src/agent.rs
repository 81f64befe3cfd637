//! Research chat agent answering questions from web sources
//!
//! The agent runs a bounded tool loop. Each turn the LLM replies with one
//! JSON action: `Web_Search`, `Page_Scraper` or `Final Answer`. Tool output
//! is appended to the scratchpad as an observation for the next turn, and
//! every source a tool touched is numbered by a [`ReferenceTracker`]. A
//! reply with no JSON object at all is taken as the final answer.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use scholar_core::{
    Error, GenerationConfig, LLMProvider, ResearchReply, Result, RetryConfig, Scraper, SourceRef,
    WebSearch,
};

use crate::prompts::{AGENT_STOPPED_ANSWER, research_agent_prompt};

/// Tool calls allowed before the agent gives up
pub const MAX_ITERATIONS: usize = 5;

/// Search results passed to the LLM per query
pub const SEARCH_RESULTS: usize = 3;

/// Characters of a scraped page passed to the LLM
pub const SCRAPE_CHAR_LIMIT: usize = 10_000;

const AGENT_TEMPERATURE: f32 = 0.7;

/// Numbers sources in order of first use, one id per URL
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    sources: Vec<SourceRef>,
}

impl ReferenceTracker {
    /// Id of `url`, registering it under `title` when first seen
    pub fn add_source(&mut self, title: &str, url: &str) -> usize {
        if let Some(existing) = self.sources.iter().find(|s| s.url == url) {
            return existing.id;
        }

        let id = self.sources.len() + 1;
        self.sources.push(SourceRef {
            id,
            title: title.to_string(),
            url: url.to_string(),
        });
        id
    }

    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<SourceRef> {
        self.sources
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    WebSearch(String),
    PageScraper(String),
    FinalAnswer(String),
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    #[serde(default)]
    action_input: Value,
}

fn input_text(input: Value) -> String {
    match input {
        Value::String(s) => s,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Action of an LLM reply
///
/// `None` means the reply held a JSON object that is not a valid action.
pub fn parse_action(reply: &str) -> Option<AgentAction> {
    let reply = reply.trim();
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Some(AgentAction::FinalAnswer(reply.to_string()));
    };
    if end < start {
        return Some(AgentAction::FinalAnswer(reply.to_string()));
    }

    let raw: RawAction = serde_json::from_str(&reply[start..=end]).ok()?;
    let input = input_text(raw.action_input).trim().to_string();

    match raw.action.trim() {
        "Web_Search" if !input.is_empty() => Some(AgentAction::WebSearch(input)),
        "Page_Scraper" if !input.is_empty() => Some(AgentAction::PageScraper(input)),
        "Final Answer" => Some(AgentAction::FinalAnswer(input)),
        _ => None,
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct ResearchAgent {
    llm: Arc<dyn LLMProvider>,
    search: Arc<dyn WebSearch>,
    scraper: Arc<dyn Scraper>,
    generation: GenerationConfig,
    retry: RetryConfig,
    max_iterations: usize,
}

impl ResearchAgent {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        search: Arc<dyn WebSearch>,
        scraper: Arc<dyn Scraper>,
    ) -> Self {
        let generation = GenerationConfig {
            temperature: Some(AGENT_TEMPERATURE),
            ..llm.generation_config()
        };

        Self {
            llm,
            search,
            scraper,
            generation,
            retry: RetryConfig::default(),
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Answer `query`, citing the sources the tools returned
    pub async fn run(&self, query: &str) -> Result<ResearchReply> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }

        let mut tracker = ReferenceTracker::default();
        let mut scratchpad = String::new();

        for step in 1..=self.max_iterations {
            let prompt = research_agent_prompt(query, &scratchpad);
            let reply = self
                .llm
                .generate_with_retry(&prompt, &self.generation, &self.retry)
                .await?;

            let (action, observation) = match parse_action(&reply.text) {
                Some(AgentAction::FinalAnswer(answer)) => {
                    tracing::info!(step, sources = tracker.sources().len(), "research answer ready");
                    return Ok(ResearchReply {
                        query: query.to_string(),
                        answer,
                        sources: tracker.into_sources(),
                    });
                }
                Some(AgentAction::WebSearch(q)) => {
                    let observation = self.web_search(&q, &mut tracker).await;
                    (format!("Web_Search: {}", q), observation)
                }
                Some(AgentAction::PageScraper(url)) => {
                    let observation = self.scrape_page(&url, &mut tracker).await;
                    (format!("Page_Scraper: {}", url), observation)
                }
                None => {
                    tracing::debug!(step, "unparseable agent action");
                    (
                        format!("Invalid action: {}", reply.text.trim()),
                        "Invalid or incomplete response, reply with one JSON action".to_string(),
                    )
                }
            };

            tracing::debug!(step, action = %action, "agent step");
            scratchpad.push_str(&format!("Action: {}\nObservation: {}\n\n", action, observation));
        }

        tracing::warn!(max_iterations = self.max_iterations, "research agent stopped");
        Ok(ResearchReply {
            query: query.to_string(),
            answer: AGENT_STOPPED_ANSWER.to_string(),
            sources: tracker.into_sources(),
        })
    }

    async fn web_search(&self, query: &str, tracker: &mut ReferenceTracker) -> String {
        match self.search.search(query, SEARCH_RESULTS).await {
            Ok(results) if results.is_empty() => "No results found".to_string(),
            Ok(results) => results
                .iter()
                .take(SEARCH_RESULTS)
                .map(|r| {
                    let id = tracker.add_source(&r.title, &r.link);
                    format!("[Source {}] {}\nSummary: {}\n", id, r.title, r.snippet)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                tracing::warn!(query, error = %e, "web search failed");
                format!("Search error: {}", e)
            }
        }
    }

    async fn scrape_page(&self, url: &str, tracker: &mut ReferenceTracker) -> String {
        match self.scraper.scrape(url).await {
            Ok(page) => {
                let title = page.title.as_deref().unwrap_or(url);
                let id = tracker.add_source(title, url);
                format!("[Source {}] {}", id, truncate_chars(&page.content, SCRAPE_CHAR_LIMIT))
            }
            Err(Error::Timeout(_)) => "Scraping timed out (15s)".to_string(),
            Err(Error::Extraction(msg)) => {
                tracing::warn!(url, error = %msg, "scrape failed");
                "Scrape failed".to_string()
            }
            Err(e) => format!("Scraping error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_tracker_dedupes_by_url() {
        let mut tracker = ReferenceTracker::default();
        assert_eq!(tracker.add_source("A", "https://a.org"), 1);
        assert_eq!(tracker.add_source("B", "https://b.org"), 2);
        assert_eq!(tracker.add_source("A again", "https://a.org"), 1);

        let sources = tracker.into_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "A");
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            parse_action(r#"{"action": "Web_Search", "action_input": "rlhf overview"}"#),
            Some(AgentAction::WebSearch("rlhf overview".to_string()))
        );
        assert_eq!(
            parse_action(
                "```json\n{\"action\": \"Page_Scraper\", \"action_input\": {\"url\": \"https://a.org\"}}\n```"
            ),
            Some(AgentAction::PageScraper("https://a.org".to_string()))
        );
        assert_eq!(
            parse_action(r#"{"action": "Final Answer", "action_input": "**Analysis**"}"#),
            Some(AgentAction::FinalAnswer("**Analysis**".to_string()))
        );
        assert_eq!(
            parse_action("  Plain prose answer. "),
            Some(AgentAction::FinalAnswer("Plain prose answer.".to_string()))
        );
        assert_eq!(parse_action(r#"{"action": "Calculator", "action_input": "1+1"}"#), None);
        assert_eq!(parse_action(r#"{"action": "Web_Search"}"#), None);
        assert_eq!(parse_action("{not json}"), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
