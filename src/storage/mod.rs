//! Storage abstractions for ingest state.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── crawled_data.json     # Watermarks: board name -> ingested post identifiers
//! ├── latest_notices.json   # Newest notices across boards from the last run
//! ├── chunks.json           # Snapshot of the local vector store
//! └── pdf_doc/
//!     ├── new/              # PDFs waiting to be ingested
//!     └── processed/        # PDFs already ingested
//! ```

pub mod local;
pub mod snapshot;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::LatestNotice;
use crate::pipeline::WatermarkStore;

pub use local::LocalStorage;
pub use snapshot::SnapshotIndex;

/// Persistence of watermarks and the latest-notices projection.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load watermarks. A missing or unreadable file yields an empty store.
    async fn load_watermarks(&self) -> WatermarkStore;

    /// Replace the watermark file atomically.
    async fn save_watermarks(&self, store: &WatermarkStore) -> Result<()>;

    /// Replace the latest-notices file atomically.
    async fn write_latest(&self, latest: &[LatestNotice]) -> Result<()>;

    /// Load the latest-notices file, empty when missing or unreadable.
    async fn load_latest(&self) -> Vec<LatestNotice>;
}
