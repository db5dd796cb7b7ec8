// src/pipeline/crawl.rs

//! Incremental crawl across all sources.
//!
//! Sources are crawled one after another. Each gets its own session, which is
//! closed before the next source starts regardless of how the crawl ended. A
//! source that fails contributes no notices and leaves its watermark untouched;
//! the remaining sources still run.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::models::Notice;
use crate::pipeline::watermark::{ScanOutcome, ScanStats, WatermarkSet, WatermarkStore, scan_page};
use crate::services::{BrowsingSession, NoticeSource, SessionLauncher, SourceRegistry};

/// Why a source's crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Reached a post ingested on an earlier run
    Watermark,
    /// A listing page had no rows
    Exhausted,
    /// Loaded the configured number of pages
    MaxPages,
    /// The source failed and produced nothing
    Failed,
}

/// Notices collected from one source.
#[derive(Debug, Clone)]
pub struct SourceCrawl {
    pub notices: Vec<Notice>,
    pub pages: usize,
    pub stop: StopReason,
    pub stats: ScanStats,
    /// Accepted rows whose detail page could not be loaded
    pub failed_bodies: usize,
}

/// Per-source line of a run summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub board_name: String,
    pub new_notices: usize,
    pub pages: usize,
    pub stop_reason: StopReason,
    pub stats: ScanStats,
    pub failed_bodies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    fn completed(board_name: &str, crawl: &SourceCrawl) -> Self {
        Self {
            board_name: board_name.to_string(),
            new_notices: crawl.notices.len(),
            pages: crawl.pages,
            stop_reason: crawl.stop,
            stats: crawl.stats,
            failed_bodies: crawl.failed_bodies,
            error: None,
        }
    }

    fn failed(board_name: &str, error: &dyn std::fmt::Display) -> Self {
        Self {
            board_name: board_name.to_string(),
            new_notices: 0,
            pages: 0,
            stop_reason: StopReason::Failed,
            stats: ScanStats::default(),
            failed_bodies: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Outcome of crawling every source.
#[derive(Debug, Clone)]
pub struct CrawlRun {
    /// New notices in source order, then listing order
    pub notices: Vec<Notice>,
    /// Input watermarks unioned with the new notices' identifiers
    pub store: WatermarkStore,
    /// Whether any watermark grew
    pub changed: bool,
    pub reports: Vec<SourceReport>,
}

/// Drives sources through sessions from a launcher.
pub struct Crawler<'a> {
    launcher: &'a dyn SessionLauncher,
    request_delay: Duration,
}

impl<'a> Crawler<'a> {
    pub fn new(launcher: &'a dyn SessionLauncher, request_delay: Duration) -> Self {
        Self {
            launcher,
            request_delay,
        }
    }

    /// Crawl every registered source against `store`.
    ///
    /// Never fails as a whole; per-source failures end up in the reports.
    pub async fn run(&self, registry: &SourceRegistry, mut store: WatermarkStore) -> CrawlRun {
        let mut notices = Vec::new();
        let mut reports = Vec::with_capacity(registry.len());
        let mut changed = false;

        for source in registry.iter() {
            let board = source.board_name();
            log::info!("[{board}] crawling up to {} pages", source.max_pages());

            match self.crawl_source(source, store.get(board)).await {
                Ok(crawl) => {
                    log::info!(
                        "[{board}] {} new notices from {} pages ({:?})",
                        crawl.notices.len(),
                        crawl.pages,
                        crawl.stop
                    );
                    let ids = crawl.notices.iter().map(|n| n.post_identifier().to_string());
                    changed |= store.extend(board, ids);
                    reports.push(SourceReport::completed(board, &crawl));
                    notices.extend(crawl.notices);
                }
                Err(e) => {
                    log::error!("[{board}] crawl failed: {e}");
                    reports.push(SourceReport::failed(board, &e));
                }
            }
        }

        CrawlRun {
            notices,
            store,
            changed,
            reports,
        }
    }

    /// Crawl one source inside its own session.
    pub async fn crawl_source(
        &self,
        source: &dyn NoticeSource,
        watermark: Option<&WatermarkSet>,
    ) -> Result<SourceCrawl> {
        let mut session = self.launcher.launch(source.settle_delay()).await?;

        let result = self.drive(source, session.as_mut(), watermark).await;

        if let Err(e) = session.close().await {
            log::warn!("[{}] session close failed: {e}", source.board_name());
        }
        result
    }

    async fn drive(
        &self,
        source: &dyn NoticeSource,
        session: &mut dyn BrowsingSession,
        watermark: Option<&WatermarkSet>,
    ) -> Result<SourceCrawl> {
        let board = source.board_name();
        let mut seen = HashSet::new();
        let mut crawl = SourceCrawl {
            notices: Vec::new(),
            pages: 0,
            stop: StopReason::MaxPages,
            stats: ScanStats::default(),
            failed_bodies: 0,
        };

        for page_index in 0..source.max_pages() {
            let rows = source.list_page(session, page_index).await?;
            crawl.pages += 1;

            let scan = scan_page(rows, watermark, &mut seen);
            crawl.stats.absorb(&scan.stats);
            log::debug!("[{board}] page {page_index}: {:?}", scan.stats);

            let (accepted, stop) = match scan.outcome {
                ScanOutcome::Continue(rows) => (rows, None),
                ScanOutcome::StopWatermark(rows) => (rows, Some(StopReason::Watermark)),
                ScanOutcome::StopExhausted => (Vec::new(), Some(StopReason::Exhausted)),
            };

            for stub in accepted {
                match source.fetch_body(session, &stub).await {
                    Ok(fetched) => crawl.notices.push(Notice::from_stub(stub, board, fetched)),
                    Err(e) => {
                        crawl.failed_bodies += 1;
                        log::warn!("[{board}] skipping {}: {e}", stub.link);
                    }
                }

                if !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }
            }

            if let Some(reason) = stop {
                crawl.stop = reason;
                return Ok(crawl);
            }
        }

        Ok(crawl)
    }
}
