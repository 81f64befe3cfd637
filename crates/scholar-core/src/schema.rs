//! Request and response types of the assistant's operations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::paper::PaperMetadata;

fn default_qna_word_limit() -> u32 {
    150
}

fn default_analysis_word_limit() -> u32 {
    300
}

fn default_sections() -> Vec<String> {
    vec![
        "Abstract".to_string(),
        "Introduction".to_string(),
        "Conclusion".to_string(),
    ]
}

fn default_num_papers() -> usize {
    5
}

fn default_min_year() -> i32 {
    2018
}

fn default_summary_instruction() -> String {
    "Write a concise summary".to_string()
}

fn default_summary_word_limit() -> u32 {
    50
}

/// Question about a previously uploaded document
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QnARequest {
    pub file_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub query: String,
    #[serde(default = "default_qna_word_limit")]
    #[validate(range(min = 50, max = 1000))]
    pub word_limit: u32,
}

impl QnARequest {
    pub fn new(file_id: Uuid, query: impl Into<String>) -> Self {
        Self {
            file_id,
            query: query.into(),
            word_limit: default_qna_word_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QnAResponse {
    pub query: String,
    pub answer: String,
    /// Passages of the document the answer was grounded on
    pub references: String,
}

/// Report over one or more papers from the user's catalog
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisRequest {
    #[validate(length(min = 1))]
    pub selected_paper_ids: Vec<Uuid>,
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
    #[serde(default = "default_analysis_word_limit")]
    #[validate(range(min = 100, max = 5000))]
    pub word_limit: u32,
}

impl AnalysisRequest {
    pub fn new(selected_paper_ids: Vec<Uuid>) -> Self {
        Self {
            selected_paper_ids,
            sections: default_sections(),
            word_limit: default_analysis_word_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub report: String,
}

/// Search across the configured academic sources
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaperSearchRequest {
    #[validate(length(min = 1, max = 100))]
    pub query: String,
    #[serde(default = "default_num_papers")]
    #[validate(range(min = 1, max = 50))]
    pub num_papers: usize,
    #[serde(default = "default_min_year")]
    #[validate(range(min = 1900))]
    pub min_year: i32,
}

impl PaperSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_papers: default_num_papers(),
            min_year: default_min_year(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSearchResponse {
    pub query: String,
    pub index_id: String,
    pub results: Vec<PaperMetadata>,
}

/// Publication trends of a topic over a time range such as "last 3 years"
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrendsRequest {
    #[validate(length(min = 1, max = 100))]
    pub time_range: String,
    #[validate(length(min = 1, max = 100))]
    pub search_query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub total_papers: usize,
    pub time_category: String,
    pub time_period: u32,
    pub date_range: String,
    pub average_papers_per_period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendsResponse {
    pub query: String,
    /// Paper counts per day, month or year bucket, in date order
    pub publication_trends: BTreeMap<String, usize>,
    /// Keyword frequencies over the matching papers
    pub trending_topics: BTreeMap<String, usize>,
    pub time_range: String,
    pub time_value: u32,
    pub time_unit: String,
    pub summary_stats: TrendSummary,
}

/// Free-text summarization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SummaryRequest {
    #[validate(length(min = 1))]
    pub text: String,
    #[serde(default = "default_summary_instruction")]
    pub instruction: String,
    #[serde(default = "default_summary_word_limit")]
    #[validate(range(min = 10, max = 1000))]
    pub word_limit: u32,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            instruction: default_summary_instruction(),
            word_limit: default_summary_word_limit(),
        }
    }
}
