//! Local filesystem storage implementation.
//!
//! All writes go to a temporary file that is renamed over the target, so a
//! crash mid-write leaves the previous file intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Chunk, LatestNotice, PathsConfig};
use crate::pipeline::WatermarkStore;
use crate::storage::StateStorage;

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    paths: PathsConfig,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            paths,
        }
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// PDF inbox and processed directories.
    pub fn pdf_dirs(&self) -> (PathBuf, PathBuf) {
        (
            self.path(&self.paths.pdf_inbox_dir),
            self.path(&self.paths.pdf_processed_dir),
        )
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write pretty-printed JSON.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read JSON, treating a missing or unreadable file as the default value.
    async fn read_json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_json(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                log::info!("No {key} found, starting empty");
                T::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable {key}: {e}");
                T::default()
            }
        }
    }

    /// Load the local vector store snapshot.
    pub async fn load_chunks(&self) -> Vec<Chunk> {
        self.read_json_or_default(&self.paths.chunks_file).await
    }

    /// Replace the local vector store snapshot.
    pub async fn save_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        self.write_json(&self.paths.chunks_file, chunks).await
    }
}

#[async_trait]
impl StateStorage for LocalStorage {
    async fn load_watermarks(&self) -> WatermarkStore {
        self.read_json_or_default(&self.paths.crawled_data_file).await
    }

    async fn save_watermarks(&self, store: &WatermarkStore) -> Result<()> {
        self.write_json(&self.paths.crawled_data_file, store).await?;
        log::info!(
            "Saved {} identifiers to {}",
            store.total(),
            self.paths.crawled_data_file
        );
        Ok(())
    }

    async fn write_latest(&self, latest: &[LatestNotice]) -> Result<()> {
        self.write_json(&self.paths.latest_notices_file, latest).await?;
        log::info!(
            "Wrote {} latest notices to {}",
            latest.len(),
            self.paths.latest_notices_file
        );
        Ok(())
    }

    async fn load_latest(&self) -> Vec<LatestNotice> {
        self.read_json_or_default(&self.paths.latest_notices_file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> LocalStorage {
        LocalStorage::new(tmp.path(), PathsConfig::default())
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let data = storage(&tmp).read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_missing_watermarks_are_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(storage(&tmp).load_watermarks().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_watermarks_are_empty() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("crawled_data.json"), b"{not json")
            .await
            .unwrap();
        assert!(storage(&tmp).load_watermarks().await.is_empty());
    }

    #[tokio::test]
    async fn test_watermarks_round_trip_through_file() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        let mut store = WatermarkStore::new();
        store.extend("소프트웨어학과", ["909", "NOTICE_공지_2025-01-01"]);
        storage.save_watermarks(&store).await.unwrap();

        let raw = tokio::fs::read_to_string(tmp.path().join("crawled_data.json"))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["소프트웨어학과"].is_array());

        assert_eq!(storage.load_watermarks().await, store);
    }

    #[tokio::test]
    async fn test_latest_notices_file() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let latest = vec![LatestNotice {
            board_name: "기숙사_수원".to_string(),
            title: "정전 안내".to_string(),
            date: "2025.09.01".to_string(),
            post_identifier: "77".to_string(),
            link: "https://dorm.skku.edu/x".to_string(),
        }];

        storage.write_latest(&latest).await.unwrap();
        assert_eq!(storage.load_latest().await, latest);
    }
}
