//! Pipeline stages of an ingest run.
//!
//! - `watermark`: per-board seen sets and the page scan
//! - `crawl`: drives every source through its session
//! - `latest`: newest-notices projection
//! - `documents`, `chunk`, `pdf`: document assembly for the index
//! - `ingest`: the whole run

pub mod chunk;
pub mod crawl;
pub mod documents;
pub mod ingest;
pub mod latest;
pub mod pdf;
pub mod watermark;

pub use crawl::{CrawlRun, Crawler, SourceCrawl, SourceReport, StopReason};
pub use ingest::{IngestOptions, IngestSummary, Ingestor};
pub use latest::latest_notices;
pub use watermark::{PageScan, ScanOutcome, ScanStats, WatermarkSet, WatermarkStore, scan_page};
