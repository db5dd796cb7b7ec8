// src/pipeline/ingest.rs

//! Ingest run: load, crawl, chunk, index, then commit state.
//!
//! State is committed only after the vector store accepted the chunks: PDFs
//! move to the processed directory, watermarks are saved and the latest file
//! is written. A run that fails before that leaves every state file as it was,
//! so the same notices and PDFs are picked up again next time.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, Document};
use crate::pipeline::chunk::chunk_documents;
use crate::pipeline::crawl::{Crawler, SourceReport};
use crate::pipeline::documents::assemble_all;
use crate::pipeline::latest::latest_notices;
use crate::pipeline::pdf::{LoadedPdf, archive_pdfs, load_pdf_documents};
use crate::pipeline::watermark::WatermarkStore;
use crate::rag::VectorStore;
use crate::services::{SessionLauncher, SourceRegistry};
use crate::storage::StateStorage;

/// What an ingest run does.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Crawl the notice boards
    pub include_crawl: bool,
    /// Load PDFs from the inbox
    pub include_pdf: bool,
    /// Ignore stored watermarks and crawl every board from the top
    pub create: bool,
    /// Load and crawl only: no state writes, PDF moves or vector store updates
    pub dry_run: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            include_crawl: true,
            include_pdf: false,
            create: false,
            dry_run: false,
        }
    }
}

/// Summary of an ingest run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub new_notices: usize,
    pub pdf_documents: usize,
    /// PDFs moved to the processed directory
    pub pdfs_archived: usize,
    pub documents: usize,
    pub chunks: usize,
    pub state_saved: bool,
    pub sources: Vec<SourceReport>,
}

/// Everything an ingest run talks to.
pub struct Ingestor<'a> {
    pub config: &'a Config,
    pub storage: &'a dyn StateStorage,
    pub registry: &'a SourceRegistry,
    pub launcher: &'a dyn SessionLauncher,
    /// Without one, documents are built and counted but no state is committed
    pub vector_store: Option<&'a dyn VectorStore>,
    /// PDF inbox and processed directories
    pub pdf_dirs: (PathBuf, PathBuf),
}

impl Ingestor<'_> {
    pub async fn run(&self, options: &IngestOptions) -> Result<IngestSummary> {
        let started_at = Utc::now();
        let mut documents: Vec<Document> = Vec::new();
        let mut summary = IngestSummary {
            started_at,
            finished_at: started_at,
            new_notices: 0,
            pdf_documents: 0,
            pdfs_archived: 0,
            documents: 0,
            chunks: 0,
            state_saved: false,
            sources: Vec::new(),
        };

        let mut pdfs: Vec<LoadedPdf> = Vec::new();
        if options.include_pdf {
            let (inbox, _) = &self.pdf_dirs;
            pdfs = load_pdf_documents(inbox).await?;
            for pdf in &pdfs {
                summary.pdf_documents += pdf.documents.len();
                documents.extend(pdf.documents.iter().cloned());
            }
        }

        let mut crawl = None;
        if options.include_crawl {
            let store = if options.create {
                log::info!("Create mode: ignoring stored watermarks");
                WatermarkStore::new()
            } else {
                self.storage.load_watermarks().await
            };

            let crawler = Crawler::new(
                self.launcher,
                Duration::from_millis(self.config.crawler.request_delay_ms),
            );
            let run = crawler.run(self.registry, store).await;
            summary.new_notices = run.notices.len();
            summary.sources = run.reports.clone();
            documents.extend(assemble_all(&run.notices));
            crawl = Some(run);
        }

        summary.documents = documents.len();
        let chunks = chunk_documents(
            &documents,
            self.config.ingest.chunk_size,
            self.config.ingest.chunk_overlap,
        );
        summary.chunks = chunks.len();

        if options.dry_run {
            log::info!("Dry run: built {} chunks, nothing written", chunks.len());
            summary.finished_at = Utc::now();
            return Ok(summary);
        }
        let Some(vector_store) = self.vector_store else {
            log::info!("No vector store: built {} chunks, state not saved", chunks.len());
            summary.finished_at = Utc::now();
            return Ok(summary);
        };

        if !chunks.is_empty() {
            vector_store.upsert(&chunks).await?;
            log::info!("Indexed {} chunks from {} documents", chunks.len(), documents.len());
        }

        summary.pdfs_archived = archive_pdfs(&pdfs, &self.pdf_dirs.1).await?;

        if let Some(run) = crawl {
            if run.changed {
                self.storage.save_watermarks(&run.store).await?;
                summary.state_saved = true;
            } else {
                log::info!("No new identifiers; watermark file left as is");
            }
            if !run.notices.is_empty() {
                let latest = latest_notices(&run.notices, self.config.ingest.top_n);
                self.storage.write_latest(&latest).await?;
            }
        }

        summary.finished_at = Utc::now();
        Ok(summary)
    }
}
