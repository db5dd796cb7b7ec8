//! In-memory index persisted to the chunk snapshot file.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Chunk;
use crate::rag::{MemoryVectorStore, ScoredChunk, VectorStore};
use crate::storage::LocalStorage;

/// [`MemoryVectorStore`] whose upserts also rewrite the snapshot file.
///
/// An upsert succeeds only once the snapshot is on disk.
pub struct SnapshotIndex {
    index: MemoryVectorStore,
    storage: LocalStorage,
}

impl SnapshotIndex {
    /// Load the snapshot from `storage`, empty when there is none.
    pub async fn open(storage: LocalStorage) -> Self {
        let index = MemoryVectorStore::from_chunks(storage.load_chunks().await);
        Self { index, storage }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl VectorStore for SnapshotIndex {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        self.index.upsert(chunks).await?;
        self.storage.save_chunks(&self.index.chunks()).await
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.index.query(text, k).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::PathsConfig;
    use tempfile::TempDir;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_persists_snapshot() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), PathsConfig::default());

        let index = SnapshotIndex::open(storage.clone()).await;
        assert!(index.is_empty());
        index.upsert(&[chunk("1", "장학금 신청")]).await.unwrap();

        let reopened = SnapshotIndex::open(storage).await;
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.query("장학금", 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_fails_when_snapshot_cannot_be_written() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("chunks.json"))
            .await
            .unwrap();
        let storage = LocalStorage::new(tmp.path(), PathsConfig::default());

        let index = SnapshotIndex::open(storage).await;
        assert!(index.upsert(&[chunk("1", "본문")]).await.is_err());
    }
}
