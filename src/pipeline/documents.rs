//! Conversion of notices into indexable documents.

use crate::models::{Document, Notice};
use crate::utils::text::clean_text;

/// Turn a notice into a document with flat string metadata.
///
/// Core fields always win over source-specific metadata of the same name.
pub fn assemble(notice: &Notice) -> Document {
    let mut doc = Document::new(clean_text(&notice.body))
        .with("board_name", &notice.board_name)
        .with("title", clean_text(notice.title()))
        .with("date", notice.date().unwrap_or(""))
        .with("post_identifier", notice.post_identifier())
        .with("link", &notice.stub.link)
        .with("source_type", format!("{}_notice", notice.board_name))
        .with("is_pinned", notice.stub.is_pinned.to_string());

    if let Some(category) = &notice.stub.category {
        doc = doc.with("category", category);
    }
    if let Some(author) = &notice.stub.author {
        doc = doc.with("author", author);
    }
    for (key, value) in &notice.extra_meta {
        doc.metadata
            .entry(key.clone())
            .or_insert_with(|| clean_text(value));
    }
    doc
}

pub fn assemble_all(notices: &[Notice]) -> Vec<Document> {
    notices.iter().map(assemble).collect()
}
