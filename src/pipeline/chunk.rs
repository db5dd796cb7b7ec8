//! Character-window text chunker.
//!
//! Splits document content into windows of at most `chunk_size` characters,
//! consecutive windows sharing up to `chunk_overlap` characters. Window ends
//! are pulled back to the last newline, or failing that the last space, so
//! words are not cut. Sizes count characters, not bytes.
//!
//! Chunk ids are SHA-256 digests of the document identity and chunk index, so
//! re-ingesting the same notice replaces its chunks instead of duplicating them.

use sha2::{Digest, Sha256};

use crate::models::{Chunk, Document};

/// Metadata keys that together identify a document.
const IDENTITY_KEYS: &[&str] = &["source_type", "board_name", "post_identifier", "filename", "page"];

/// Split every document into chunks.
pub fn chunk_documents(documents: &[Document], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| chunk_document(doc, chunk_size, chunk_overlap))
        .collect()
}

/// Split one document. Documents with blank content yield no chunks.
pub fn chunk_document(doc: &Document, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let identity = document_identity(doc);

    split_text(&doc.content, chunk_size, chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(index, content)| {
            let mut metadata = doc.metadata.clone();
            metadata.insert("chunk_index".to_string(), index.to_string());
            Chunk {
                id: chunk_id(&identity, index),
                content,
                metadata,
            }
        })
        .collect()
}

/// Split text into overlapping windows.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let overlap = chunk_overlap.min(chunk_size.saturating_sub(1));

    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        if chars.len() - start <= chunk_size {
            push_piece(&mut pieces, &chars[start..]);
            break;
        }

        let hard_end = start + chunk_size;
        // Break after the overlap so the next window always moves forward.
        let end = break_point(&chars, start + overlap + 1, hard_end).unwrap_or(hard_end);
        push_piece(&mut pieces, &chars[start..end]);
        start = end - overlap;
    }
    pieces
}

/// Index just past the last newline (else space) in `chars[min..max]`.
fn break_point(chars: &[char], min: usize, max: usize) -> Option<usize> {
    let window = chars.get(min..max)?;
    window
        .iter()
        .rposition(|c| *c == '\n')
        .or_else(|| window.iter().rposition(|c| c.is_whitespace()))
        .map(|pos| min + pos + 1)
}

fn push_piece(pieces: &mut Vec<String>, chars: &[char]) {
    let piece: String = chars.iter().collect();
    let piece = piece.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }
}

fn document_identity(doc: &Document) -> String {
    IDENTITY_KEYS
        .iter()
        .filter_map(|key| doc.meta(key).map(|v| format!("{key}={v}")))
        .collect::<Vec<_>>()
        .join("|")
}

fn chunk_id(identity: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(b"#");
    hasher.update(index.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
