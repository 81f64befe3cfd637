//! Publication trends and trending topics over a time window

use chrono::{Months, NaiveDate, Utc};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use validator::Validate;

use scholar_core::{
    PaperMetadata, PaperQuery, PaperSearchProvider, Result, TrendSummary, TrendsRequest,
    TrendsResponse,
};

/// Papers fetched per trends query
pub const TRENDS_MAX_RESULTS: usize = 100;

/// Keywords taken from each paper
pub const KEYWORDS_PER_PAPER: usize = 5;

static PERIOD_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(day|days|month|months|year|years)").ok());

static STOP_WORDS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    stop_words::get(stop_words::LANGUAGE::English)
        .iter()
        .map(|word| word.to_string())
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Month,
    Year,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Day => "day",
            TimeUnit::Month => "month",
            TimeUnit::Year => "year",
        }
    }

    /// strftime pattern of a trend bucket
    fn bucket_format(&self) -> &'static str {
        match self {
            TimeUnit::Day => "%Y-%m-%d",
            TimeUnit::Month => "%Y-%m",
            TimeUnit::Year => "%Y",
        }
    }
}

/// Length of the window a trend is computed over, e.g. "last 3 months"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePeriod {
    pub value: u32,
    pub unit: TimeUnit,
}

impl Default for TimePeriod {
    fn default() -> Self {
        Self {
            value: 1,
            unit: TimeUnit::Year,
        }
    }
}

impl TimePeriod {
    /// First "<number> <unit>" in the text; one year when absent or zero
    pub fn parse(text: &str) -> Self {
        let Some(pattern) = PERIOD_PATTERN.as_ref() else {
            return Self::default();
        };

        let Some(captures) = pattern.captures(text) else {
            return Self::default();
        };

        let value = captures
            .get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        if value == 0 {
            return Self::default();
        }

        let unit = match captures.get(2).map(|m| m.as_str().to_lowercase()) {
            Some(u) if u.starts_with("day") => TimeUnit::Day,
            Some(u) if u.starts_with("month") => TimeUnit::Month,
            _ => TimeUnit::Year,
        };

        Self { value, unit }
    }

    /// Start of the window ending `today`, clamping to the last day of shorter months
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        let start = match self.unit {
            TimeUnit::Day => today.checked_sub_days(chrono::Days::new(u64::from(self.value))),
            TimeUnit::Month => today.checked_sub_months(Months::new(self.value)),
            TimeUnit::Year => self
                .value
                .checked_mul(12)
                .and_then(|months| today.checked_sub_months(Months::new(months))),
        };

        start.unwrap_or(NaiveDate::MIN)
    }
}

/// arXiv query restricted to papers updated within `[start, today]`
pub fn arxiv_date_query(query: &str, start: NaiveDate, today: NaiveDate) -> String {
    format!(
        "{} AND lastUpdatedDate:[{}000000 TO {}235959]",
        query,
        start.format("%Y%m%d"),
        today.format("%Y%m%d")
    )
}

/// Most frequent non-stop-word alphabetic tokens, ties in order of first appearance
///
/// Tokens are whitespace separated with surrounding punctuation trimmed; a
/// token with any non-letter inside (`don't`, `gpt4`) is skipped whole.
pub fn extract_keywords(text: &str, n: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    let tokens = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty() && t.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(t));

    for (position, token) in tokens.enumerate() {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));

    ranked.into_iter().take(n).map(|(word, _)| word).collect()
}

/// Build the trends report of `papers` for the window described by `time_range`
pub fn analyze(
    query: &str,
    time_range: &str,
    papers: &[PaperMetadata],
    today: NaiveDate,
) -> TrendsResponse {
    let period = TimePeriod::parse(time_range);
    let start = period.start_date(today);

    let in_window: Vec<(&PaperMetadata, NaiveDate)> = papers
        .iter()
        .filter_map(|p| p.published.map(|d| (p, d)))
        .filter(|(_, published)| *published >= start && *published <= today)
        .collect();

    let mut publication_trends: BTreeMap<String, usize> = BTreeMap::new();
    let mut trending_topics: BTreeMap<String, usize> = BTreeMap::new();

    for (paper, published) in &in_window {
        let bucket = published.format(period.unit.bucket_format()).to_string();
        *publication_trends.entry(bucket).or_default() += 1;

        let text = format!("{} {}", paper.summary, paper.title);
        for keyword in extract_keywords(&text, KEYWORDS_PER_PAPER) {
            *trending_topics.entry(keyword).or_default() += 1;
        }
    }

    let total_papers = in_window.len();
    let average = total_papers as f64 / f64::from(period.value);

    TrendsResponse {
        query: query.to_string(),
        publication_trends,
        trending_topics,
        time_range: time_range.to_string(),
        time_value: period.value,
        time_unit: period.unit.as_str().to_string(),
        summary_stats: TrendSummary {
            total_papers,
            time_category: format!("{}s", period.unit.as_str()),
            time_period: period.value,
            date_range: format!("{} to {}", start.format("%Y-%m-%d"), today.format("%Y-%m-%d")),
            average_papers_per_period: (average * 100.0).round() / 100.0,
        },
    }
}

/// Runs trend queries against arXiv
pub struct TrendsService {
    provider: Arc<dyn PaperSearchProvider>,
}

impl TrendsService {
    pub fn new(provider: Arc<dyn PaperSearchProvider>) -> Self {
        Self { provider }
    }

    pub async fn analyze(&self, request: &TrendsRequest) -> Result<TrendsResponse> {
        request.validate()?;

        let today = Utc::now().date_naive();
        let period = TimePeriod::parse(&request.time_range);
        let start = period.start_date(today);

        let query = PaperQuery {
            query: arxiv_date_query(&request.search_query, start, today),
            max_results: TRENDS_MAX_RESULTS,
            sort_by_updated: true,
        };

        tracing::info!(query = %query.query, source = %self.provider.source(), "fetching trend papers");

        let papers = match self.provider.search(&query).await {
            Ok(papers) => papers,
            Err(e) => {
                tracing::warn!(error = %e, "trend source failed, returning empty report");
                Vec::new()
            }
        };

        Ok(analyze(&request.search_query, &request.time_range, &papers, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::PaperSource;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paper(title: &str, summary: &str, published: NaiveDate) -> PaperMetadata {
        PaperMetadata {
            paper_id: Uuid::new_v4(),
            title: title.to_string(),
            authors: "A. Author".to_string(),
            summary: summary.to_string(),
            link: String::new(),
            source: PaperSource::ArXiv,
            published: Some(published),
            updated: None,
        }
    }

    #[test]
    fn test_parse_time_period() {
        assert_eq!(
            TimePeriod::parse("Last 3 months"),
            TimePeriod { value: 3, unit: TimeUnit::Month }
        );
        assert_eq!(
            TimePeriod::parse("past 10days"),
            TimePeriod { value: 10, unit: TimeUnit::Day }
        );
        assert_eq!(
            TimePeriod::parse("LAST 2 YEARS"),
            TimePeriod { value: 2, unit: TimeUnit::Year }
        );
        assert_eq!(TimePeriod::parse("recently"), TimePeriod::default());
        assert_eq!(TimePeriod::parse("0 days"), TimePeriod::default());
    }

    #[test]
    fn test_start_date_clamps_month_end() {
        let period = TimePeriod { value: 1, unit: TimeUnit::Month };
        assert_eq!(period.start_date(date(2025, 3, 31)), date(2025, 2, 28));

        let period = TimePeriod { value: 1, unit: TimeUnit::Year };
        assert_eq!(period.start_date(date(2024, 2, 29)), date(2023, 2, 28));

        let period = TimePeriod { value: 14, unit: TimeUnit::Month };
        assert_eq!(period.start_date(date(2025, 1, 15)), date(2023, 11, 15));

        let period = TimePeriod { value: 10, unit: TimeUnit::Day };
        assert_eq!(period.start_date(date(2025, 1, 5)), date(2024, 12, 26));
    }

    #[test]
    fn test_arxiv_date_query() {
        assert_eq!(
            arxiv_date_query("llm agents", date(2024, 1, 2), date(2025, 1, 2)),
            "llm agents AND lastUpdatedDate:[20240102000000 TO 20250102235959]"
        );
    }

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords(
            "Attention transformer and attention: the transformer stacks attention.",
            3,
        );
        assert_eq!(keywords, vec!["attention", "transformer", "stacks"]);
    }

    #[test]
    fn test_extract_keywords_drops_common_english_words() {
        let keywords = extract_keywords(
            "first first first nobody nobody whereby whereby transformer",
            3,
        );
        assert_eq!(keywords, vec!["transformer"]);
    }

    #[test]
    fn test_extract_keywords_skips_mixed_tokens_whole() {
        let keywords = extract_keywords("Don't don't gpt4 (diffusion) diffusion, sampling", 5);
        assert_eq!(keywords, vec!["diffusion", "sampling"]);
    }

    #[test]
    fn test_analyze_buckets_by_month() {
        let today = date(2025, 6, 15);
        let papers = vec![
            paper("Diffusion policy", "Diffusion for robots", date(2025, 6, 1)),
            paper("Robot diffusion", "Robots learn", date(2025, 5, 20)),
            paper("Old robots", "Too old", date(2024, 1, 1)),
        ];

        let report = analyze("robots", "last 2 months", &papers, today);

        assert_eq!(report.summary_stats.total_papers, 2);
        assert_eq!(report.publication_trends.get("2025-05"), Some(&1));
        assert_eq!(report.publication_trends.get("2025-06"), Some(&1));
        assert_eq!(report.trending_topics.get("diffusion"), Some(&2));
        assert_eq!(report.time_unit, "month");
        assert_eq!(report.summary_stats.time_category, "months");
        assert_eq!(report.summary_stats.date_range, "2025-04-15 to 2025-06-15");
        assert_eq!(report.summary_stats.average_papers_per_period, 1.0);
    }

    #[test]
    fn test_average_rounds_to_two_decimals() {
        let today = date(2025, 6, 15);
        let papers = vec![paper("One", "Only one", date(2025, 6, 1))];

        let report = analyze("q", "last 3 years", &papers, today);
        assert_eq!(report.summary_stats.average_papers_per_period, 0.33);
        assert_eq!(report.publication_trends.get("2025"), Some(&1));
    }

    #[test]
    fn test_empty_report_keeps_shape() {
        let report = analyze("q", "last 5 days", &[], date(2025, 1, 10));

        assert!(report.publication_trends.is_empty());
        assert!(report.trending_topics.is_empty());
        assert_eq!(report.time_value, 5);
        assert_eq!(report.summary_stats.total_papers, 0);
        assert_eq!(report.summary_stats.average_papers_per_period, 0.0);
        assert_eq!(report.summary_stats.date_range, "2025-01-05 to 2025-01-10");
    }
}
