// src/services/sources/mod.rs

//! Notice board adapters.
//!
//! Each adapter knows how to build listing URLs for its board, turn a listing
//! page into [`ListingRow`]s and pull the body out of a detail page. Parsing is
//! pure so adapters can be tested against saved HTML without a network.

mod board_list;
mod dorm;
mod portal;

pub use board_list::BoardListSource;
pub use dorm::DormTableSource;
pub use portal::PortalSource;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, FetchedBody, ListingRow, NoticeStub, SourceConfig, SourceKind};
use crate::services::session::BrowsingSession;

/// A single notice board.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Board configuration this source was built from.
    fn config(&self) -> &SourceConfig;

    /// Listing URL of the zero-based page index.
    fn list_url(&self, page_index: usize) -> Result<String>;

    /// Parse one listing page, newest row first.
    fn parse_listing(&self, html: &str) -> Vec<ListingRow>;

    /// Extract body text and metadata from a detail page.
    fn parse_detail(&self, html: &str) -> FetchedBody;

    fn board_name(&self) -> &str {
        &self.config().board_name
    }

    fn max_pages(&self) -> usize {
        self.config().max_pages
    }

    /// Wait applied by the session after each navigation.
    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config().delay_ms)
    }

    /// Load and parse a listing page.
    async fn list_page(
        &self,
        session: &mut dyn BrowsingSession,
        page_index: usize,
    ) -> Result<Vec<ListingRow>> {
        let url = self.list_url(page_index)?;
        let html = session.page_source(&url).await?;
        Ok(self.parse_listing(&html))
    }

    /// Load a detail page and extract its body.
    async fn fetch_body(
        &self,
        session: &mut dyn BrowsingSession,
        stub: &NoticeStub,
    ) -> Result<FetchedBody> {
        let html = session.page_source(&stub.link).await?;
        Ok(self.parse_detail(&html))
    }
}

/// Ordered set of sources for a run.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn NoticeSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one source per enabled board in the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for source in config.enabled_sources() {
            registry.register(build_source(source, config.crawler.article_limit)?)?;
        }
        Ok(registry)
    }

    /// Add a source. Board names must be unique.
    pub fn register(&mut self, source: Box<dyn NoticeSource>) -> Result<()> {
        if self.get(source.board_name()).is_some() {
            return Err(AppError::config(format!(
                "Duplicate source: {}",
                source.board_name()
            )));
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn get(&self, board_name: &str) -> Option<&dyn NoticeSource> {
        self.sources
            .iter()
            .find(|s| s.board_name() == board_name)
            .map(|s| s.as_ref())
    }

    /// Keep only the named source.
    pub fn retain(&mut self, board_name: &str) -> Result<()> {
        if self.get(board_name).is_none() {
            return Err(AppError::config(format!("Unknown source: {board_name}")));
        }
        self.sources.retain(|s| s.board_name() == board_name);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NoticeSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|s| s.board_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Build the adapter matching a board's page shape.
pub fn build_source(config: &SourceConfig, article_limit: usize) -> Result<Box<dyn NoticeSource>> {
    Ok(match config.kind {
        SourceKind::BoardList => Box::new(BoardListSource::new(config.clone(), article_limit)?),
        SourceKind::DormTable => Box::new(DormTableSource::new(config.clone(), article_limit)?),
        SourceKind::PortalAnchor => Box::new(PortalSource::new(config.clone(), article_limit)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_default_config() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "소프트웨어학과",
                "소프트웨어융합대학",
                "기숙사_서울",
                "기숙사_수원",
                "학교_대표공지"
            ]
        );
    }

    #[test]
    fn test_registry_skips_disabled_sources() {
        let mut config = Config::default();
        config.sources[1].enabled = false;
        let registry = SourceRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.get("소프트웨어융합대학").is_none());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let config = Config::default();
        let mut registry = SourceRegistry::new();
        registry
            .register(build_source(&config.sources[0], 10).unwrap())
            .unwrap();
        assert!(
            registry
                .register(build_source(&config.sources[0], 10).unwrap())
                .is_err()
        );
    }

    #[test]
    fn test_retain_single_source() {
        let mut registry = SourceRegistry::from_config(&Config::default()).unwrap();
        registry.retain("기숙사_수원").unwrap();
        assert_eq!(registry.names(), vec!["기숙사_수원"]);
        assert!(registry.retain("없는게시판").is_err());
    }
}
