//! In-memory keyword vector store.
//!
//! Scores a chunk by the share of query tokens it contains. Tokens are
//! lowercase unicode words of at least two bytes, minus common stopwords.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::models::Chunk;
use crate::rag::{ScoredChunk, VectorStore};

/// Minimum token length in bytes.
const MIN_TOKEN_LEN: usize = 2;

/// Metadata fields indexed along with the content.
const INDEXED_META: &[&str] = &["title", "board_name", "category", "department"];

struct Entry {
    chunk: Chunk,
    tokens: HashSet<String>,
}

/// Vector store kept in memory, optionally seeded from a snapshot.
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously saved chunks.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        let entries = chunks.into_iter().map(index_chunk).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// All chunks in insertion order.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.chunk.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for chunk in chunks {
            let entry = index_chunk(chunk.clone());
            match entries.iter_mut().find(|e| e.chunk.id == chunk.id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query: HashSet<String> = tokenize(text).into_iter().collect();
        if query.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut hits: Vec<ScoredChunk> = entries
            .iter()
            .filter_map(|entry| {
                let matched = query.iter().filter(|t| entry.tokens.contains(*t)).count();
                (matched > 0).then(|| ScoredChunk {
                    chunk: entry.chunk.clone(),
                    score: matched as f32 / query.len() as f32,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

fn index_chunk(chunk: Chunk) -> Entry {
    let mut tokens: HashSet<String> = tokenize(&chunk.content).into_iter().collect();
    for key in INDEXED_META {
        if let Some(value) = chunk.meta(key) {
            tokens.extend(tokenize(value));
        }
    }
    Entry { chunk, tokens }
}

/// Tokenize a string into normalized keywords.
fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.to_lowercase();

    normalized
        .unicode_words()
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .filter(|word| !is_stopword(word))
        .map(String::from)
        .collect()
}

/// Check if a word is a common stopword (Korean/English).
fn is_stopword(word: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        // Korean particles and filler
        "및", "의", "를", "을", "에서", "으로", "와", "과", "관련", "대한", "안내",
        // English common words
        "the", "an", "is", "are", "was", "be", "of", "to", "in", "for", "on", "with", "at", "by",
        "from", "as", "or", "and", // URL artifacts
        "http", "https", "www", "com", "kr", "html",
    ];
    STOPWORDS.contains(&word)
}
