//! Rendering of assistant responses for the terminal
//!
//! Every renderer returns a `String` so output can be checked without a
//! terminal. Colors follow the `colored` global override.

use colored::*;

use scholar_core::{
    AnalysisResponse, Error, PaperRecord, PaperSearchResponse, QnAResponse,
    ResearchReply, TrendsResponse, UploadedFile,
};

const SUMMARY_PREVIEW_CHARS: usize = 200;
const TREND_BAR_WIDTH: usize = 30;

fn preview(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn render_upload(file: &UploadedFile) -> String {
    format!(
        "{} Uploaded {}\n   {} {}",
        "✅".green(),
        file.file_name.bold(),
        "file id:".dimmed(),
        file.id
    )
}

pub fn render_documents(files: &[UploadedFile]) -> String {
    if files.is_empty() {
        return format!("{} No documents uploaded yet", "ℹ️".blue());
    }

    let mut lines = vec![format!("{}", "Uploaded documents:".bold())];
    for file in files {
        lines.push(format!(
            "  {}  {}  {}",
            file.id.cyan(),
            file.file_name,
            file.upload_time.format("%Y-%m-%d %H:%M").to_string().dimmed()
        ));
    }
    lines.join("\n")
}

pub fn render_answer(response: &QnAResponse) -> String {
    let mut out = format!("{} {}\n\n{}", "❓".cyan(), response.query.bold(), response.answer);
    if !response.references.is_empty() {
        out.push_str("\n\n");
        out.push_str(&response.references.dimmed().to_string());
    }
    out
}

pub fn render_search(response: &PaperSearchResponse) -> String {
    let mut lines = vec![format!(
        "{} {} result(s) for \"{}\" (index {})",
        "🔍".blue(),
        response.results.len(),
        response.query,
        response.index_id.cyan()
    )];

    for (i, paper) in response.results.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {} [{}]", i + 1, paper.title.bold(), paper.source));
        lines.push(format!("   {} {}", "Authors:".dimmed(), paper.authors));
        if let Some(date) = paper.published {
            lines.push(format!("   {} {}", "Published:".dimmed(), date));
        }
        lines.push(format!(
            "   {} {}",
            "Summary:".dimmed(),
            preview(&paper.summary, SUMMARY_PREVIEW_CHARS)
        ));
        if !paper.link.is_empty() {
            lines.push(format!("   {} {}", "Link:".dimmed(), paper.link.underline()));
        }
        lines.push(format!("   {} {}", "Paper id:".dimmed(), paper.paper_id));
    }

    lines.join("\n")
}

pub fn render_papers(papers: &[PaperRecord]) -> String {
    if papers.is_empty() {
        return format!("{} No papers saved under this index", "ℹ️".blue());
    }

    papers
        .iter()
        .map(|p| {
            format!(
                "{}  {} [{}]\n    {}",
                p.paper_id.cyan(),
                p.title.bold(),
                p.source,
                p.authors.dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_report(response: &AnalysisResponse) -> String {
    format!("{}\n\n{}", "📄 Analysis Report".bold(), response.report)
}

pub fn render_trends(response: &TrendsResponse) -> String {
    let stats = &response.summary_stats;
    let mut lines = vec![
        format!("{} Trends for \"{}\"", "📈".blue(), response.query.bold()),
        format!(
            "   {} papers from {} ({:.2} per {})",
            stats.total_papers,
            stats.date_range,
            stats.average_papers_per_period,
            response.time_unit
        ),
    ];

    if response.publication_trends.is_empty() {
        lines.push(String::new());
        lines.push("No publications found in this period".dimmed().to_string());
        return lines.join("\n");
    }

    let max = response
        .publication_trends
        .values()
        .copied()
        .max()
        .unwrap_or(1)
        .max(1);

    lines.push(String::new());
    lines.push(format!("{}", "Publications:".bold()));
    for (bucket, count) in &response.publication_trends {
        let width = (count * TREND_BAR_WIDTH).div_ceil(max);
        lines.push(format!("  {:<10} {} {}", bucket, "█".repeat(width).green(), count));
    }

    let mut topics: Vec<(&String, &usize)> = response.trending_topics.iter().collect();
    topics.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    lines.push(String::new());
    lines.push(format!("{}", "Trending topics:".bold()));
    for (topic, count) in topics.into_iter().take(10) {
        lines.push(format!("  {:<20} {}", topic, count));
    }

    lines.join("\n")
}

/// Agent answer followed by its numbered web sources
pub fn render_research(reply: &ResearchReply) -> String {
    let mut out = format!("{}\n\n{}", "🔎 Research".bold(), reply.answer.trim());
    let references = reply.references();
    if !references.is_empty() {
        out.push_str(&references);
    }
    out
}

pub fn render_summary(summary: &str) -> String {
    format!("{}\n{}", "📝 Summary".bold(), summary)
}

/// User-facing message for a failed operation
pub fn render_error(error: &Error) -> String {
    let message = match error {
        Error::NotFound(msg) => msg.clone(),
        Error::InvalidInput(msg) => format!("Invalid request: {}", msg),
        Error::UnsupportedFormat(msg) => format!("Unsupported file format: {}", msg),
        other => other.to_string(),
    };
    format!("{} {}", "❌".red(), message.red())
}
