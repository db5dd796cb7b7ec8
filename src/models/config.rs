//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// State and inbox file locations, relative to the storage directory
    #[serde(default)]
    pub paths: PathsConfig,

    /// Projection and chunking settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Notice boards to crawl, in crawl order
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.article_limit == 0 {
            return Err(AppError::validation("crawler.article_limit must be > 0"));
        }
        if self.ingest.top_n == 0 {
            return Err(AppError::validation("ingest.top_n must be > 0"));
        }
        if self.ingest.chunk_size == 0 {
            return Err(AppError::validation("ingest.chunk_size must be > 0"));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::validation(
                "ingest.chunk_overlap must be smaller than ingest.chunk_size",
            ));
        }
        if self.enabled_sources().next().is_none() {
            return Err(AppError::validation("No enabled sources defined"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.board_name.trim().is_empty() {
                return Err(AppError::validation("sources.board_name is empty"));
            }
            if !names.insert(source.board_name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate board name: {}",
                    source.board_name
                )));
            }
            url::Url::parse(&source.url).map_err(|e| {
                AppError::validation(format!("Invalid URL for {}: {e}", source.board_name))
            })?;
            if source.kind == SourceKind::DormTable && source.board_no.is_none() {
                return Err(AppError::validation(format!(
                    "{} is a dorm_table source and needs board_no",
                    source.board_name
                )));
            }
        }
        Ok(())
    }

    /// Sources that take part in a run, in configured order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            paths: PathsConfig::default(),
            ingest: IngestConfig::default(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between detail-page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Posts per listing page; page N starts at offset N * article_limit
    #[serde(default = "defaults::article_limit")]
    pub article_limit: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            article_limit: defaults::article_limit(),
        }
    }
}

/// File locations relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Per-board identifier lists
    #[serde(default = "defaults::crawled_data_file")]
    pub crawled_data_file: String,

    /// Latest notices across all boards
    #[serde(default = "defaults::latest_notices_file")]
    pub latest_notices_file: String,

    /// Chunk snapshot of the local vector store
    #[serde(default = "defaults::chunks_file")]
    pub chunks_file: String,

    /// PDFs waiting to be ingested
    #[serde(default = "defaults::pdf_inbox_dir")]
    pub pdf_inbox_dir: String,

    /// PDFs already ingested
    #[serde(default = "defaults::pdf_processed_dir")]
    pub pdf_processed_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            crawled_data_file: defaults::crawled_data_file(),
            latest_notices_file: defaults::latest_notices_file(),
            chunks_file: defaults::chunks_file(),
            pdf_inbox_dir: defaults::pdf_inbox_dir(),
            pdf_processed_dir: defaults::pdf_processed_dir(),
        }
    }
}

/// Projection, chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Size of the latest-notices projection
    #[serde(default = "defaults::top_n")]
    pub top_n: usize,

    /// Chunk size in characters
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "defaults::chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks returned per retrieval query
    #[serde(default = "defaults::retrieval_k")]
    pub retrieval_k: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            top_n: defaults::top_n(),
            chunk_size: defaults::chunk_size(),
            chunk_overlap: defaults::chunk_overlap(),
            retrieval_k: defaults::retrieval_k(),
        }
    }
}

/// Page shape of a notice board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `ul.board-list-wrap > li` list markup (department boards)
    BoardList,
    /// `table tbody tr` rows (dormitory boards)
    DormTable,
    /// `a[href*='articleNo=']` anchors (university portal)
    PortalAnchor,
}

/// A single notice board to crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Board name; key of the watermark file and document metadata
    pub board_name: String,

    /// Page shape
    pub kind: SourceKind,

    /// Listing URL without query string
    pub url: String,

    /// `board_no` query value for dormitory boards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_no: Option<String>,

    /// Maximum listing pages per run
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Settle delay after each navigation in milliseconds
    #[serde(default = "defaults::settle_delay")]
    pub delay_ms: u64,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
}

mod defaults {
    use super::{SourceConfig, SourceKind};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; notice-ingest/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn article_limit() -> usize {
        10
    }

    // Path defaults
    pub fn crawled_data_file() -> String {
        "crawled_data.json".into()
    }
    pub fn latest_notices_file() -> String {
        "latest_notices.json".into()
    }
    pub fn chunks_file() -> String {
        "chunks.json".into()
    }
    pub fn pdf_inbox_dir() -> String {
        "pdf_doc/new".into()
    }
    pub fn pdf_processed_dir() -> String {
        "pdf_doc/processed".into()
    }

    // Ingest defaults
    pub fn top_n() -> usize {
        6
    }
    pub fn chunk_size() -> usize {
        400
    }
    pub fn chunk_overlap() -> usize {
        100
    }
    pub fn retrieval_k() -> usize {
        5
    }

    // Source defaults
    pub fn max_pages() -> usize {
        3
    }
    pub fn settle_delay() -> u64 {
        2000
    }
    pub fn enabled() -> bool {
        true
    }

    fn source(board_name: &str, kind: SourceKind, url: &str, board_no: Option<&str>) -> SourceConfig {
        SourceConfig {
            board_name: board_name.to_string(),
            kind,
            url: url.to_string(),
            board_no: board_no.map(str::to_string),
            max_pages: max_pages(),
            delay_ms: settle_delay(),
            enabled: enabled(),
        }
    }

    pub fn sources() -> Vec<SourceConfig> {
        vec![
            source(
                "소프트웨어학과",
                SourceKind::BoardList,
                "https://cse.skku.edu/cse/notice.do",
                None,
            ),
            source(
                "소프트웨어융합대학",
                SourceKind::BoardList,
                "https://sw.skku.edu/sw/notice.do",
                None,
            ),
            source(
                "기숙사_서울",
                SourceKind::DormTable,
                "https://dorm.skku.edu/dorm_seoul/notice/notice_all.jsp",
                Some("78"),
            ),
            source(
                "기숙사_수원",
                SourceKind::DormTable,
                "https://dorm.skku.edu/dorm_suwon/notice/notice_all.jsp",
                Some("16"),
            ),
            source(
                "학교_대표공지",
                SourceKind::PortalAnchor,
                "https://www.skku.edu/skku/campus/skk_comm/notice01.do",
                None,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_config_has_five_sources() {
        let config = Config::default();
        assert_eq!(config.sources.len(), 5);
        assert_eq!(config.ingest.top_n, 6);
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_board_names() {
        let mut config = Config::default();
        let dup = config.sources[0].clone();
        config.sources.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_overlap_not_smaller_than_chunk() {
        let mut config = Config::default();
        config.ingest.chunk_overlap = config.ingest.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_all_disabled() {
        let mut config = Config::default();
        for source in &mut config.sources {
            source.enabled = false;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let toml = r#"
            [crawler]
            request_delay_ms = 0

            [[sources]]
            board_name = "테스트"
            kind = "board_list"
            url = "https://example.com/notice.do"
            max_pages = 1
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].delay_ms, 2000);
        assert!(config.sources[0].enabled);
        assert_eq!(config.paths.crawled_data_file, "crawled_data.json");
    }
}
