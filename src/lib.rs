// src/lib.rs

//! Incremental notice ingest for SKKU boards.
//!
//! Crawls each configured board newest-first, stops at the first post already
//! ingested, and hands the new notices to a chunking and retrieval index.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod rag;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
