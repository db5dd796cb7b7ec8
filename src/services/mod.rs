//! Service layer for the ingest pipeline.
//!
//! This module contains the network-facing pieces:
//! - Page loading sessions (`BrowsingSession`, `SessionLauncher`)
//! - Notice board adapters (`NoticeSource`, `SourceRegistry`)
//! - HTML and identifier helpers shared by the adapters

pub mod html;
pub mod marker;
pub mod session;
pub mod sources;

pub use session::{BrowsingSession, FixtureLauncher, HttpLauncher, SessionLauncher};
pub use sources::{NoticeSource, SourceRegistry};
