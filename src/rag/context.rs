//! Prompt context built from retrieved chunks.

use serde::Serialize;

use crate::models::Chunk;

/// Message used in place of context when nothing was retrieved.
pub const NO_DOCUMENTS: &str = "관련 문서를 찾지 못했습니다.";

/// Where a retrieved chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub board_name: String,
    pub title: String,
    pub date: String,
    pub post_identifier: String,
}

/// Numbered document blocks for the prompt.
pub fn format_context(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return NO_DOCUMENTS.to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "=== 문서 {} ===\n출처: {}\n제목: {}\n날짜: {}\n내용:\n{}\n",
                i + 1,
                origin(chunk),
                chunk.meta("title").unwrap_or(""),
                chunk.meta("date").unwrap_or(""),
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Provenance of each chunk, in order.
pub fn sources(chunks: &[Chunk]) -> Vec<SourceRef> {
    chunks
        .iter()
        .map(|chunk| SourceRef {
            board_name: origin(chunk).to_string(),
            title: chunk.meta("title").unwrap_or("").to_string(),
            date: chunk.meta("date").unwrap_or("").to_string(),
            post_identifier: chunk.meta("post_identifier").unwrap_or("").to_string(),
        })
        .collect()
}

/// Board name, or the file name for PDF chunks.
fn origin(chunk: &Chunk) -> &str {
    chunk
        .meta("board_name")
        .or_else(|| chunk.meta("filename"))
        .unwrap_or("")
}
