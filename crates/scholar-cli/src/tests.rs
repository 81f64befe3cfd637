//! Snapshot tests for terminal rendering

#[cfg(test)]
mod snapshot_tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use insta::assert_snapshot;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    use crate::{
        format_history, render_answer, render_documents, render_error,
        render_papers, render_research, render_search, render_trends,
    };
    use scholar_core::{
        Error, PaperMetadata, PaperRecord, PaperSearchResponse, PaperSource,
        QnAResponse, ResearchReply, SourceRef, TrendSummary, TrendsResponse, UploadedFile,
    };

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_documents_listing() {
        plain();
        let files = vec![UploadedFile {
            id: "file-1".to_string(),
            user_id: "local".to_string(),
            file_name: "notes.txt".to_string(),
            file_path: "uploads/local/abc_notes.txt".to_string(),
            content_hash: "abc".to_string(),
            upload_time: Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
        }];

        assert_snapshot!(render_documents(&files), @r###"
        Uploaded documents:
          file-1  notes.txt  2025-06-01 09:30
        "###);
        assert!(render_documents(&[]).ends_with("No documents uploaded yet"));
    }

    #[test]
    fn test_answer_with_references() {
        plain();
        let response = QnAResponse {
            query: "What is new?".to_string(),
            answer: "Self-attention.".to_string(),
            references: "📌 **Relevant Passages from Document**\n1. Attention only.".to_string(),
        };

        assert_snapshot!(render_answer(&response), @r###"
        ❓ What is new?

        Self-attention.

        📌 **Relevant Passages from Document**
        1. Attention only.
        "###);
    }

    #[test]
    fn test_research_reply_with_sources() {
        plain();
        let reply = ResearchReply {
            query: "What is RLHF?".to_string(),
            answer: "Reward models rank outputs [1].\n".to_string(),
            sources: vec![
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
            ],
        };

        assert_snapshot!(render_research(&reply), @r###"
        🔎 Research

        Reward models rank outputs [1].

        📌 **References**
        1. [RLHF explained](https://example.org/rlhf)
        2. [PPO](https://example.org/ppo)
        "###);

        let unsourced = ResearchReply {
            sources: Vec::new(),
            ..reply
        };
        assert!(render_research(&unsourced).ends_with("Reward models rank outputs [1]."));
    }

    #[test]
    fn test_search_results() {
        plain();
        let response = PaperSearchResponse {
            query: "robots".to_string(),
            index_id: "idx-1".to_string(),
            results: vec![PaperMetadata {
                paper_id: Uuid::nil(),
                title: "Diffusion Robots".to_string(),
                authors: "A. Author, B. Author".to_string(),
                summary: "Policies for robots.".to_string(),
                link: "https://arxiv.org/pdf/2501.00001".to_string(),
                source: PaperSource::ArXiv,
                published: NaiveDate::from_ymd_opt(2025, 1, 2),
                updated: None,
            }],
        };

        assert_snapshot!(render_search(&response), @r###"
        🔍 1 result(s) for "robots" (index idx-1)

        1. Diffusion Robots [ArXiv]
           Authors: A. Author, B. Author
           Published: 2025-01-02
           Summary: Policies for robots.
           Link: https://arxiv.org/pdf/2501.00001
           Paper id: 00000000-0000-0000-0000-000000000000
        "###);
    }

    #[test]
    fn test_long_summaries_are_shortened() {
        plain();
        let mut response = PaperSearchResponse {
            query: "q".to_string(),
            index_id: "i".to_string(),
            results: Vec::new(),
        };
        response.results.push(PaperMetadata {
            paper_id: Uuid::nil(),
            title: "T".to_string(),
            authors: "A".to_string(),
            summary: "word ".repeat(100),
            link: String::new(),
            source: PaperSource::PubMed,
            published: None,
            updated: None,
        });

        let rendered = render_search(&response);
        assert!(rendered.contains("..."));
        assert!(!rendered.contains("Link:"));
    }

    #[test]
    fn test_papers_listing() {
        plain();
        let papers = vec![PaperRecord {
            paper_id: "p-1".to_string(),
            user_id: "local".to_string(),
            index_id: "idx-1".to_string(),
            title: "Robotic Surgery".to_string(),
            authors: "C. Author".to_string(),
            summary: "N/A".to_string(),
            link: None,
            source: PaperSource::PubMed,
            search_time: Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
        }];

        assert_snapshot!(render_papers(&papers), @r###"
        p-1  Robotic Surgery [PubMed]
            C. Author
        "###);
    }

    #[test]
    fn test_trends_chart() {
        plain();
        let response = TrendsResponse {
            query: "robots".to_string(),
            publication_trends: BTreeMap::from([
                ("2025-05".to_string(), 1),
                ("2025-06".to_string(), 2),
            ]),
            trending_topics: BTreeMap::from([
                ("diffusion".to_string(), 1),
                ("robots".to_string(), 3),
            ]),
            time_range: "Last 2 months".to_string(),
            time_value: 2,
            time_unit: "month".to_string(),
            summary_stats: TrendSummary {
                total_papers: 3,
                time_category: "months".to_string(),
                time_period: 2,
                date_range: "2025-04-15 to 2025-06-15".to_string(),
                average_papers_per_period: 1.5,
            },
        };

        assert_snapshot!(render_trends(&response), @r###"
        📈 Trends for "robots"
           3 papers from 2025-04-15 to 2025-06-15 (1.50 per month)

        Publications:
          2025-05    ███████████████ 1
          2025-06    ██████████████████████████████ 2

        Trending topics:
          robots               3
          diffusion            1
        "###);
    }

    #[test]
    fn test_error_messages() {
        plain();
        assert_eq!(
            render_error(&Error::NotFound("File not found, upload it first".to_string())),
            "❌ File not found, upload it first"
        );
        assert_eq!(
            render_error(&Error::InvalidInput("query: length".to_string())),
            "❌ Invalid request: query: length"
        );
    }

    #[test]
    fn test_history_listing() {
        assert_eq!(format_history(&[]), "No questions asked yet");
        assert_eq!(
            format_history(&["first?".to_string(), "second?".to_string()]),
            "  1. first?\n  2. second?"
        );
    }
}
