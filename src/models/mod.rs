// src/models/mod.rs

//! Domain models for the ingest pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod document;
mod notice;

// Re-export all public types
pub use config::{Config, CrawlerConfig, IngestConfig, PathsConfig, SourceConfig, SourceKind};
pub use document::{Chunk, Document};
pub use notice::{FetchedBody, LatestNotice, ListingRow, Notice, NoticeStub};
