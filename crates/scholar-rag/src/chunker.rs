//! Recursive character text splitter
//!
//! Text is cut on the coarsest separator present (paragraphs, then lines,
//! then words, then characters). Pieces that fit are merged back into chunks
//! of at most `chunk_size` characters, and the tail of each chunk (up to
//! `chunk_overlap` characters) is repeated at the start of the next one.

use std::collections::VecDeque;

use scholar_core::{Error, IndexingConfig, Result};

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidInput("chunk size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn from_config(config: &IndexingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into overlapping chunks; blank chunks are dropped
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_on(text, separator);
        let mut good_splits: Vec<&str> = Vec::new();

        for piece in splits {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            let joined_len = |current: &VecDeque<&str>, total: usize| {
                total + len + if current.is_empty() { 0 } else { separator_len }
            };

            if joined_len(&current, total) > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        size = total,
                        limit = self.chunk_size,
                        "created a chunk larger than the configured size"
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current, separator) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (joined_len(&current, total) > self.chunk_size && total > 0)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        let sep = if current.is_empty() { 0 } else { separator_len };
                        total = total.saturating_sub(char_len(first) + sep);
                    }
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_pieces(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        let config = IndexingConfig::default();
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn join_pieces(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_text("Attention is all you need.");
        assert_eq!(chunks, vec!["Attention is all you need."]);
    }

    #[test]
    fn test_word_chunks_carry_overlap() {
        let splitter = TextSplitter::new(20, 5).unwrap();
        let chunks = splitter.split_text("aaaa bbbb cccc dddd eeee ffff");
        assert_eq!(chunks, vec!["aaaa bbbb cccc dddd", "dddd eeee ffff"]);
    }

    #[test]
    fn test_paragraphs_split_before_words() {
        let splitter = TextSplitter::new(30, 0).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks, vec!["First paragraph here.", "Second paragraph here."]);
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let splitter = TextSplitter::new(50, 10).unwrap();
        let text = "word ".repeat(200);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let chunks = splitter.split_text(&"x".repeat(25));

        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0], "x".repeat(10));
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        let splitter = TextSplitter::default();
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
    }
}
