// src/rag/mod.rs

//! Retrieval-augmented answering over ingested chunks.
//!
//! The vector store and the chat model are external collaborators behind
//! traits. [`MemoryVectorStore`] is a keyword scorer for local runs and tests.

mod context;
mod memory;
mod output;

pub use context::{SourceRef, format_context, sources};
pub use memory::MemoryVectorStore;
pub use output::{clean_model_output, parse_model_json};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Chunk;

/// A chunk returned by a query, with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Chunk storage with similarity search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks, replacing any with the same id.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Up to `k` chunks most relevant to `text`, best first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A model reply, whole or as a stream of fragments.
pub enum Completion {
    Text(String),
    Stream(BoxStream<'static, Result<String>>),
}

impl Completion {
    /// Concatenate the reply into one string.
    pub async fn into_text(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(fragment) = stream.next().await {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }
}

/// Language model used to answer questions.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Message], streaming: bool) -> Result<Completion>;
}

const SYSTEM_PROMPT: &str = "아래 문서만 근거로 질문에 답하세요. 문서에 없는 내용은 모른다고 답하세요.";

/// A model answer with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Retrieve `k` chunks for `question`, then ask the model with them as context.
pub async fn answer(
    store: &dyn VectorStore,
    model: &dyn ChatModel,
    question: &str,
    k: usize,
) -> Result<Answer> {
    let hits = store.query(question, k).await?;
    let chunks: Vec<Chunk> = hits.into_iter().map(|hit| hit.chunk).collect();

    let messages = [
        Message::system(format!("{SYSTEM_PROMPT}\n\n{}", format_context(&chunks))),
        Message::user(question),
    ];
    let text = model.complete(&messages, false).await?.into_text().await?;

    Ok(Answer {
        text,
        sources: sources(&chunks),
    })
}
