//! PDF inbox loading.
//!
//! Every `*.pdf` in the inbox becomes one document per page. Loading only
//! reads; files are moved to the processed directory by [`archive_pdfs`] once
//! their documents are indexed. A file that failed to load or move stays in
//! the inbox for the next run.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Document;
use crate::utils::text::clean_text;

/// A PDF read from the inbox.
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    pub path: PathBuf,
    pub filename: String,
    pub documents: Vec<Document>,
}

/// Load every PDF in `inbox`. A missing inbox has no PDFs.
///
/// Per-file failures are logged and skipped.
pub async fn load_pdf_documents(inbox: &Path) -> Result<Vec<LoadedPdf>> {
    let files = list_pdfs(inbox).await?;
    if files.is_empty() {
        log::info!("No PDF files in {}", inbox.display());
        return Ok(Vec::new());
    }
    log::info!("Found {} PDF file(s)", files.len());

    let mut loaded = Vec::new();
    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match load_one(&path, &filename).await {
            Ok(documents) => {
                log::info!("{filename}: {} page(s)", documents.len());
                loaded.push(LoadedPdf {
                    path,
                    filename,
                    documents,
                });
            }
            Err(e) => log::warn!("Skipping {filename}: {e}"),
        }
    }
    Ok(loaded)
}

/// Move loaded PDFs into `processed`. Returns how many were moved.
///
/// A file that cannot be moved is logged and left in the inbox.
pub async fn archive_pdfs(loaded: &[LoadedPdf], processed: &Path) -> Result<usize> {
    if loaded.is_empty() {
        return Ok(0);
    }
    tokio::fs::create_dir_all(processed).await?;

    let mut moved = 0;
    for pdf in loaded {
        match tokio::fs::rename(&pdf.path, processed.join(&pdf.filename)).await {
            Ok(()) => moved += 1,
            Err(e) => log::warn!("Could not move {} to processed: {e}", pdf.filename),
        }
    }
    Ok(moved)
}

async fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::Io(e)),
    };
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn load_one(path: &Path, filename: &str) -> Result<Vec<Document>> {
    let bytes = tokio::fs::read(path).await?;
    let name = filename.to_string();
    let text = tokio::task::spawn_blocking(move || extract_text(&bytes, &name))
        .await
        .map_err(|e| AppError::pdf(filename, e))??;
    Ok(page_documents(&text, filename))
}

#[cfg(feature = "pdf")]
fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| AppError::pdf(filename, e))
}

#[cfg(not(feature = "pdf"))]
fn extract_text(_bytes: &[u8], filename: &str) -> Result<String> {
    Err(AppError::pdf(filename, "built without the `pdf` feature"))
}

/// Split extracted text on form feeds into one document per page.
fn page_documents(text: &str, filename: &str) -> Vec<Document> {
    text.split('\u{000C}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(index, page)| {
            Document::new(clean_text(page.trim()))
                .with("source_type", "pdf")
                .with("filename", filename)
                .with("page", index.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_documents() {
        let docs = page_documents("첫 페이지\u{000C}  \u{000C}셋째 페이지", "guide.pdf");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "첫 페이지");
        assert_eq!(docs[1].meta("page"), Some("2"));
        assert_eq!(docs[1].meta("source_type"), Some("pdf"));
        assert_eq!(docs[1].meta("filename"), Some("guide.pdf"));
    }

    #[tokio::test]
    async fn test_missing_inbox_is_empty_and_not_created() {
        let tmp = TempDir::new().unwrap();
        let inbox = tmp.path().join("pdf_doc/new");

        let loaded = load_pdf_documents(&inbox).await.unwrap();
        assert!(loaded.is_empty());
        assert!(!inbox.exists());
    }

    #[tokio::test]
    async fn test_unreadable_pdf_stays_in_inbox() {
        let tmp = TempDir::new().unwrap();
        let inbox = tmp.path().join("new");
        tokio::fs::create_dir_all(&inbox).await.unwrap();
        tokio::fs::write(inbox.join("broken.pdf"), b"not a pdf").await.unwrap();
        tokio::fs::write(inbox.join("notes.txt"), b"ignored").await.unwrap();

        let loaded = load_pdf_documents(&inbox).await.unwrap();
        assert!(loaded.is_empty());
        assert!(inbox.join("broken.pdf").exists());
    }

    #[tokio::test]
    async fn test_archive_moves_each_file_independently() {
        let tmp = TempDir::new().unwrap();
        let inbox = tmp.path().join("new");
        let processed = tmp.path().join("processed");
        tokio::fs::create_dir_all(&inbox).await.unwrap();
        tokio::fs::write(inbox.join("a.pdf"), b"a").await.unwrap();

        let loaded = vec![
            LoadedPdf {
                path: inbox.join("gone.pdf"),
                filename: "gone.pdf".to_string(),
                documents: page_documents("사라진 파일", "gone.pdf"),
            },
            LoadedPdf {
                path: inbox.join("a.pdf"),
                filename: "a.pdf".to_string(),
                documents: page_documents("안내", "a.pdf"),
            },
        ];

        assert_eq!(archive_pdfs(&loaded, &processed).await.unwrap(), 1);
        assert!(processed.join("a.pdf").exists());
        assert!(!inbox.join("a.pdf").exists());
    }
}
