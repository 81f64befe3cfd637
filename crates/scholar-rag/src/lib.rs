//! Retrieval-augmented research pipeline for Scholar
//!
//! This crate provides text extraction, chunking, local vector stores, the
//! shared paper index, and the services built on them: document Q&A, paper
//! search, multi-paper analysis, publication trends, summarization and a web
//! research chat agent.

pub mod agent;
pub mod analysis;
pub mod assistant;
pub mod catalog;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod extraction;
pub mod flat_index;
pub mod indexer;
pub mod paper_index;
pub mod prompts;
pub mod qna;
pub mod registry;
pub mod search;
pub mod summarize;
pub mod trends;
pub mod vector_store;
pub mod web;


pub use agent::{ReferenceTracker, ResearchAgent};
pub use analysis::AnalysisService;
pub use assistant::{Collaborators, ResearchAssistant};
pub use catalog::{FilePaperCatalog, FileUploadRegistry};
pub use chunker::TextSplitter;
pub use config::AssistantSettings;
pub use embedding::HashingEmbedder;
pub use engine::DocumentRagEngine;
pub use extraction::{SUPPORTED_UPLOAD_EXTENSIONS, TextExtractor};
pub use flat_index::FlatIndex;
pub use indexer::ChunkIndexer;
pub use paper_index::PaperIndex;
pub use qna::{QnAService, format_document_references};
pub use registry::DocumentStoreRegistry;
pub use search::{ArxivClient, GoogleScholarClient, PubMedClient, SearchService};
pub use summarize::Summarizer;
pub use trends::{TimePeriod, TrendsService};
pub use vector_store::LocalVectorStore;
pub use web::{FirecrawlClient, SerperClient};

// Re-export core types for convenience
pub use scholar_core::{
    Document, DocumentIndexer, Error, IndexingConfig, IndexingResult, RAGEngine, RAGQuery,
    RAGResult, Result, SearchConfig, SearchResult, VectorDocument, VectorStore,
};
