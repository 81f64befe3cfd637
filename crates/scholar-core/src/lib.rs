//! Core traits and types for Scholar, an academic research assistant
//!
//! This crate defines the fundamental traits and types used across the system.
//! It provides capability-facing interfaces for LLM providers, embedders, OCR
//! engines, vector stores, document indexers, RAG engines, paper search
//! providers and catalogs, and the research agent's web tools, making the pipeline
//! test-friendly and extensible.

pub mod llm;
pub mod embedding;
pub mod ocr;
pub mod rag;
pub mod vector_store;
pub mod document_indexer;
pub mod paper;
pub mod upload;
pub mod tools;
pub mod schema;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use llm::{LLMProvider, GenerationConfig, GenerationResult};
pub use embedding::Embedder;
pub use ocr::OcrEngine;
pub use rag::{RAGEngine, RAGQuery, RAGResult};
pub use vector_store::{VectorStore, VectorDocument, SearchResult, SearchConfig};
pub use document_indexer::{DocumentIndexer, Document, IndexingResult, IndexingConfig};
pub use paper::{
    PaperCatalog, PaperMetadata, PaperQuery, PaperRecord, PaperSearchProvider, PaperSource,
};
pub use upload::{UploadRegistry, UploadedFile};
pub use tools::{ResearchReply, ScrapedPage, Scraper, SourceRef, WebResult, WebSearch};
pub use schema::*;
pub use types::*;
