//! OpenAI integration for the Scholar research assistant
//!
//! This crate provides the OpenAI-compatible implementation of the
//! `LLMProvider`, `Embedder` and `OcrEngine` traits.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::OpenAIClient;
pub use config::{
    OpenAIConfig, DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_OCR_MODEL,
};

// Re-export core types for convenience
pub use scholar_core::{
    Embedder, Error, GenerationConfig, GenerationResult, LLMProvider, OcrEngine, Result,
};
