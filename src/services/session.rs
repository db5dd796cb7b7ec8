// src/services/session.rs

//! Browsing sessions used to load listing and detail pages.
//!
//! A session is acquired once per source and released exactly once when the
//! source's crawl finishes, whether it succeeded or not. Every navigation waits
//! for the source's settle delay before the page source is returned.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::http::{create_async_client, fetch_text};

/// A live page-loading session.
#[async_trait]
pub trait BrowsingSession: Send {
    /// Navigate to `url`, wait for the page to settle and return its source.
    async fn page_source(&mut self, url: &str) -> Result<String>;

    /// Release the session. Navigation fails afterwards.
    async fn close(&mut self) -> Result<()>;
}

/// Starts sessions. One launcher serves every source of a run.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, settle: Duration) -> Result<Box<dyn BrowsingSession>>;
}

/// Launches [`HttpSession`]s sharing one connection pool.
pub struct HttpLauncher {
    client: reqwest::Client,
}

impl HttpLauncher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn launch(&self, settle: Duration) -> Result<Box<dyn BrowsingSession>> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            settle,
            closed: false,
        }))
    }
}

/// Session backed by plain HTTP requests.
pub struct HttpSession {
    client: reqwest::Client,
    settle: Duration,
    closed: bool,
}

#[async_trait]
impl BrowsingSession for HttpSession {
    async fn page_source(&mut self, url: &str) -> Result<String> {
        if self.closed {
            return Err(AppError::session("navigation on a closed session"));
        }
        let html = fetch_text(&self.client, url).await?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(html)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Counters recorded by a [`FixtureLauncher`].
#[derive(Debug, Default, Clone)]
pub struct FixtureLog {
    pub launched: usize,
    pub closed: usize,
    pub visited: Vec<String>,
}

/// Serves saved pages by URL for offline runs and tests.
///
/// Unknown URLs fail with [`AppError::Crawl`]. Setting `fail_launch` makes
/// every launch fail.
#[derive(Clone, Default)]
pub struct FixtureLauncher {
    pages: Arc<HashMap<String, String>>,
    log: Arc<Mutex<FixtureLog>>,
    fail_launch: bool,
}

impl FixtureLauncher {
    pub fn new(pages: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().collect()),
            log: Arc::default(),
            fail_launch: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    /// Snapshot of launches, closes and visited URLs so far.
    pub fn log(&self) -> FixtureLog {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionLauncher for FixtureLauncher {
    async fn launch(&self, _settle: Duration) -> Result<Box<dyn BrowsingSession>> {
        if self.fail_launch {
            return Err(AppError::session("fixture launcher configured to fail"));
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .launched += 1;
        Ok(Box::new(FixtureSession {
            pages: Arc::clone(&self.pages),
            log: Arc::clone(&self.log),
            closed: false,
        }))
    }
}

struct FixtureSession {
    pages: Arc<HashMap<String, String>>,
    log: Arc<Mutex<FixtureLog>>,
    closed: bool,
}

#[async_trait]
impl BrowsingSession for FixtureSession {
    async fn page_source(&mut self, url: &str) -> Result<String> {
        if self.closed {
            return Err(AppError::session("navigation on a closed session"));
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .visited
            .push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::crawl(url, "no fixture for URL"))
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .closed += 1;
        }
        Ok(())
    }
}
