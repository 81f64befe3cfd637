use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use scholar_cli::{
    ChatMode, display_banner, format_history, handle_input_with_history, print_help,
    render_answer, render_documents, render_error, render_papers, render_report, render_research,
    render_search, render_summary, render_trends, render_upload,
};
use scholar_core::{
    AnalysisRequest, Embedder, LLMProvider, OcrEngine, PaperSearchRequest, QnARequest,
    SummaryRequest, TrendsRequest,
};
use scholar_openai::OpenAIClient;
use scholar_rag::{AssistantSettings, Collaborators, ResearchAssistant};

#[derive(Parser)]
#[command(name = "scholar")]
#[command(about = "AI-powered academic research assistant", long_about = None)]
struct Cli {
    /// User whose uploads and searches are used
    #[arg(short, long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document (PDF, TXT, MD, PNG, JPG, JPEG) for Q&A
    Upload { path: PathBuf },

    /// List uploaded documents
    Documents,

    /// Ask a question about an uploaded document
    Ask {
        file_id: Uuid,
        question: String,
        #[arg(long, default_value_t = 150)]
        word_limit: u32,
    },

    /// Search arXiv, PubMed and Google Scholar (with SERPAPI_API_KEY) for papers
    Search {
        query: String,
        /// Group results under an existing index id
        #[arg(long)]
        index_id: Option<String>,
        #[arg(long, default_value_t = 5)]
        num_papers: usize,
        #[arg(long, default_value_t = 2018)]
        min_year: i32,
    },

    /// List papers saved by a search, or all search index ids
    Papers { index_id: Option<String> },

    /// Generate an analysis report over saved papers
    Analyze {
        #[arg(required = true)]
        paper_ids: Vec<Uuid>,
        /// Report sections, repeat for several
        #[arg(long = "section")]
        sections: Vec<String>,
        #[arg(long, default_value_t = 300)]
        word_limit: u32,
    },

    /// Publication trends for a topic
    Trends {
        query: String,
        #[arg(long, default_value = "Last 1 year")]
        time_range: String,
    },

    /// Summarize a text file
    Summarize {
        path: PathBuf,
        #[arg(long, default_value = "Write a concise summary")]
        instruction: String,
        #[arg(long, default_value_t = 50)]
        word_limit: u32,
    },

    /// Interactive Q&A over an uploaded document
    Chat {
        file_id: Uuid,
        #[arg(long, default_value_t = 150)]
        word_limit: u32,
    },

    /// Research a question on the web; interactive without a query
    Research { query: Option<String> },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scholar=info,scholar_rag=info,scholar_openai=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn build_assistant() -> Result<ResearchAssistant> {
    let mut openai = OpenAIClient::from_env().context("OpenAI configuration")?;
    if let Err(e) = openai.connect().await {
        tracing::warn!(error = %e, "could not verify OpenAI credentials");
    }
    let openai = Arc::new(openai);

    let llm: Arc<dyn LLMProvider> = openai.clone();
    let embedder: Arc<dyn Embedder> = openai.clone();
    let ocr: Arc<dyn OcrEngine> = openai;

    let settings = AssistantSettings::from_env()?;
    let collaborators = Collaborators::with_default_sources(&settings, llm, embedder, Some(ocr))?;

    Ok(ResearchAssistant::new(settings, collaborators)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let assistant = build_assistant().await?;
    let user = cli.user.as_str();

    let outcome = match cli.command {
        Commands::Upload { path } => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .context("upload path has no file name")?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;

            println!("{} Processing {}...", "⏳".yellow(), file_name);
            assistant
                .upload_document(user, &file_name, &bytes)
                .await
                .map(|file| render_upload(&file))
        }
        Commands::Documents => assistant
            .list_documents(user)
            .await
            .map(|files| render_documents(&files)),
        Commands::Ask {
            file_id,
            question,
            word_limit,
        } => {
            let mut request = QnARequest::new(file_id, question);
            request.word_limit = word_limit;
            assistant
                .ask(user, &request)
                .await
                .map(|response| render_answer(&response))
        }
        Commands::Search {
            query,
            index_id,
            num_papers,
            min_year,
        } => {
            let index_id = index_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let request = PaperSearchRequest {
                query,
                num_papers,
                min_year,
            };
            assistant
                .search_papers(user, &index_id, &request)
                .await
                .map(|response| render_search(&response))
        }
        Commands::Papers { index_id: Some(index_id) } => assistant
            .papers(user, &index_id)
            .await
            .map(|papers| render_papers(&papers)),
        Commands::Papers { index_id: None } => {
            assistant.search_index_ids(user).await.map(|ids| {
                if ids.is_empty() {
                    "No searches saved yet".to_string()
                } else {
                    format!("{}\n{}", "Search index ids:".bold(), ids.join("\n"))
                }
            })
        }
        Commands::Analyze {
            paper_ids,
            sections,
            word_limit,
        } => {
            let mut request = AnalysisRequest::new(paper_ids);
            if !sections.is_empty() {
                request.sections = sections;
            }
            request.word_limit = word_limit;

            println!("{} Generating report...", "🤖".blue());
            assistant
                .analyze(user, &request)
                .await
                .map(|response| render_report(&response))
        }
        Commands::Trends { query, time_range } => {
            let request = TrendsRequest {
                time_range,
                search_query: query,
            };
            assistant
                .trends(&request)
                .await
                .map(|response| render_trends(&response))
        }
        Commands::Summarize {
            path,
            instruction,
            word_limit,
        } => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let request = SummaryRequest {
                text,
                instruction,
                word_limit,
            };
            assistant
                .summarize(&request)
                .await
                .map(|summary| render_summary(&summary))
        }
        Commands::Chat { file_id, word_limit } => {
            return chat(&assistant, user, file_id, word_limit).await;
        }
        Commands::Research { query: Some(query) } => {
            println!("{} Researching...", "🤖".blue());
            assistant
                .research(user, &query)
                .await
                .map(|reply| render_research(&reply))
        }
        Commands::Research { query: None } => {
            return research_chat(&assistant, user).await;
        }
    };

    match outcome {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", render_error(&e));
            std::process::exit(1);
        }
    }
}

async fn chat(
    assistant: &ResearchAssistant,
    user: &str,
    file_id: Uuid,
    word_limit: u32,
) -> Result<()> {
    let file_key = file_id.to_string();
    let document = assistant
        .list_documents(user)
        .await?
        .into_iter()
        .find(|f| f.id == file_key)
        .map(|f| f.file_name)
        .context("File not found, upload it first")?;

    display_banner(ChatMode::Document(&document));

    let mut history = Vec::new();
    let mut questions: Vec<String> = Vec::new();

    loop {
        let input = handle_input_with_history(&mut history).await?;

        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            "help" => {
                print_help(ChatMode::Document(&document));
                continue;
            }
            "history" => {
                println!("{}", format_history(&questions));
                continue;
            }
            _ => {}
        }

        println!("{} Thinking...", "🤖".blue());

        let mut request = QnARequest::new(file_id, input.clone());
        request.word_limit = word_limit;

        match assistant.ask(user, &request).await {
            Ok(response) => {
                questions.push(input);
                println!("{}\n", render_answer(&response));
            }
            Err(e) => println!("{}", render_error(&e)),
        }
    }

    Ok(())
}

async fn research_chat(assistant: &ResearchAssistant, user: &str) -> Result<()> {
    display_banner(ChatMode::Research);

    let mut history = Vec::new();
    let mut questions: Vec<String> = Vec::new();

    loop {
        let input = handle_input_with_history(&mut history).await?;

        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            "help" => {
                print_help(ChatMode::Research);
                continue;
            }
            "history" => {
                println!("{}", format_history(&questions));
                continue;
            }
            _ => {}
        }

        println!("{} Researching...", "🤖".blue());

        match assistant.research(user, &input).await {
            Ok(reply) => {
                questions.push(input);
                println!("{}\n", render_research(&reply));
            }
            Err(e) => println!("{}", render_error(&e)),
        }
    }

    Ok(())
}
