// src/pipeline/watermark.rs

//! Watermark sets and the per-page scan.
//!
//! A board's watermark is the set of post identifiers already ingested from
//! it. Listings are newest first, so the first non-pinned row whose identifier
//! is in the watermark means everything below it was seen on an earlier run.
//!
//! ## Scan rules, per row in listing order
//!
//! 1. Malformed rows are skipped and not counted.
//! 2. Pinned rows never stop the scan. They are accepted once, the first time
//!    their key is neither in the watermark nor seen earlier in this run.
//! 3. A non-pinned row already in the watermark stops the crawl. Rows accepted
//!    earlier on the same page are kept.
//! 4. A non-pinned row seen earlier in this run (listing shifted between page
//!    loads) is skipped.
//! 5. Anything else is accepted.
//!
//! A page with no parsed rows means the board is exhausted.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{ListingRow, NoticeStub};

/// Identifiers already ingested from one board.
///
/// Stored as a sorted JSON list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatermarkSet(BTreeSet<String>);

impl WatermarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Add an identifier. Returns true if it was new.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for WatermarkSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Watermarks of every board, keyed by board name.
///
/// Serialized as `{ "board name": ["id", ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatermarkStore(BTreeMap<String, WatermarkSet>);

impl WatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watermark of a board; boards never crawled have none.
    pub fn get(&self, board_name: &str) -> Option<&WatermarkSet> {
        self.0.get(board_name)
    }

    /// Union `ids` into a board's watermark. Returns true if the set grew.
    ///
    /// No entry is created for a board when `ids` is empty.
    pub fn extend<I, S>(&mut self, board_name: &str, ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids = ids.into_iter().peekable();
        if ids.peek().is_none() {
            return false;
        }
        let set = self.0.entry(board_name.to_string()).or_default();
        let mut grew = false;
        for id in ids {
            grew |= set.insert(id);
        }
        grew
    }

    /// Boards and their watermark sizes.
    pub fn summary(&self) -> Vec<(&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.len())).collect()
    }

    /// Total identifiers across boards.
    pub fn total(&self) -> usize {
        self.0.values().map(WatermarkSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What the crawl should do after a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Keep the accepted rows and load the next page
    Continue(Vec<NoticeStub>),
    /// A watermark hit; keep the accepted rows and stop
    StopWatermark(Vec<NoticeStub>),
    /// The page had no parsed rows
    StopExhausted,
}

impl ScanOutcome {
    /// Accepted rows, if any.
    pub fn accepted(&self) -> &[NoticeStub] {
        match self {
            Self::Continue(rows) | Self::StopWatermark(rows) => rows,
            Self::StopExhausted => &[],
        }
    }
}

/// Row counts of scanned pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Parsed rows looked at (malformed rows and rows after a stop excluded)
    pub total: usize,
    /// Rows accepted as new
    pub new: usize,
    pub skipped_pinned: usize,
    pub skipped_duplicate: usize,
    pub malformed: usize,
    /// Pages where numeric identifiers went up instead of down
    pub out_of_order_pages: usize,
}

impl ScanStats {
    pub fn absorb(&mut self, other: &ScanStats) {
        self.total += other.total;
        self.new += other.new;
        self.skipped_pinned += other.skipped_pinned;
        self.skipped_duplicate += other.skipped_duplicate;
        self.malformed += other.malformed;
        self.out_of_order_pages += other.out_of_order_pages;
    }
}

/// Result of scanning one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScan {
    pub outcome: ScanOutcome,
    pub stats: ScanStats,
}

/// Apply the watermark rules to one page of rows.
///
/// `seen` carries identifiers accepted or passed over earlier in this run and
/// is updated in place.
pub fn scan_page(
    rows: Vec<ListingRow>,
    watermark: Option<&WatermarkSet>,
    seen: &mut HashSet<String>,
) -> PageScan {
    let mut stats = ScanStats::default();
    let mut accepted = Vec::new();
    let mut last_number: Option<u64> = None;
    let mut out_of_order = false;
    let in_watermark = |id: &str| watermark.is_some_and(|w| w.contains(id));

    for row in rows {
        let stub = match row {
            ListingRow::Parsed(stub) => stub,
            ListingRow::Malformed { reason } => {
                log::debug!("Skipping malformed row: {reason}");
                stats.malformed += 1;
                continue;
            }
        };
        stats.total += 1;
        let id = stub.post_identifier.as_str();

        if stub.is_pinned {
            if in_watermark(id) || seen.contains(id) {
                stats.skipped_pinned += 1;
            } else {
                seen.insert(id.to_string());
                accepted.push(stub);
            }
            continue;
        }

        if let Ok(number) = id.parse::<u64>() {
            if last_number.is_some_and(|last| number > last) {
                out_of_order = true;
            }
            last_number = Some(number);
        }

        if in_watermark(id) {
            stats.new = accepted.len();
            stats.out_of_order_pages = usize::from(out_of_order);
            return PageScan {
                outcome: ScanOutcome::StopWatermark(accepted),
                stats,
            };
        }

        if !seen.insert(id.to_string()) {
            stats.skipped_duplicate += 1;
            continue;
        }
        accepted.push(stub);
    }

    if out_of_order {
        log::warn!("Listing is not newest-first; watermark stop may be early");
    }
    stats.new = accepted.len();
    stats.out_of_order_pages = usize::from(out_of_order);

    let outcome = if stats.total == 0 {
        ScanOutcome::StopExhausted
    } else {
        ScanOutcome::Continue(accepted)
    };
    PageScan { outcome, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, pinned: bool) -> ListingRow {
        ListingRow::Parsed(NoticeStub {
            post_identifier: id.to_string(),
            title: format!("title {id}"),
            date_raw: None,
            link: format!("https://example.com/{id}"),
            is_pinned: pinned,
            category: None,
            author: None,
        })
    }

    fn ids(outcome: &ScanOutcome) -> Vec<&str> {
        outcome
            .accepted()
            .iter()
            .map(|s| s.post_identifier.as_str())
            .collect()
    }

    #[test]
    fn test_accepts_all_without_watermark() {
        let mut seen = HashSet::new();
        let scan = scan_page(
            vec![row("NOTICE_a_", true), row("5", false), row("4", false)],
            None,
            &mut seen,
        );
        assert!(matches!(scan.outcome, ScanOutcome::Continue(_)));
        assert_eq!(ids(&scan.outcome), vec!["NOTICE_a_", "5", "4"]);
        assert_eq!(scan.stats.total, 3);
    }

    #[test]
    fn test_stops_at_watermark_keeping_earlier_rows() {
        let watermark: WatermarkSet = ["3"].into_iter().collect();
        let mut seen = HashSet::new();
        let scan = scan_page(
            vec![row("5", false), row("4", false), row("3", false), row("2", false)],
            Some(&watermark),
            &mut seen,
        );
        assert!(matches!(scan.outcome, ScanOutcome::StopWatermark(_)));
        assert_eq!(ids(&scan.outcome), vec!["5", "4"]);
        assert_eq!(scan.stats.total, 3);
    }

    #[test]
    fn test_pinned_in_watermark_does_not_stop() {
        let watermark: WatermarkSet = ["NOTICE_a_"].into_iter().collect();
        let mut seen = HashSet::new();
        let scan = scan_page(
            vec![row("NOTICE_a_", true), row("9", false)],
            Some(&watermark),
            &mut seen,
        );
        assert!(matches!(scan.outcome, ScanOutcome::Continue(_)));
        assert_eq!(ids(&scan.outcome), vec!["9"]);
        assert_eq!(scan.stats.skipped_pinned, 1);
    }

    #[test]
    fn test_pinned_accepted_once_per_run() {
        let mut seen = HashSet::new();
        let first = scan_page(vec![row("NOTICE_a_", true), row("2", false)], None, &mut seen);
        let second = scan_page(vec![row("NOTICE_a_", true), row("1", false)], None, &mut seen);
        assert_eq!(ids(&first.outcome), vec!["NOTICE_a_", "2"]);
        assert_eq!(ids(&second.outcome), vec!["1"]);
    }

    #[test]
    fn test_within_run_duplicate_skipped_without_stopping() {
        let mut seen = HashSet::new();
        scan_page(vec![row("5", false), row("4", false)], None, &mut seen);
        let shifted = scan_page(vec![row("4", false), row("3", false)], None, &mut seen);
        assert!(matches!(shifted.outcome, ScanOutcome::Continue(_)));
        assert_eq!(ids(&shifted.outcome), vec!["3"]);
        assert_eq!(shifted.stats.skipped_duplicate, 1);
    }

    #[test]
    fn test_empty_and_all_malformed_pages_exhaust() {
        let mut seen = HashSet::new();
        assert_eq!(scan_page(vec![], None, &mut seen).outcome, ScanOutcome::StopExhausted);

        let scan = scan_page(
            vec![ListingRow::malformed("no title"), ListingRow::malformed("no link")],
            None,
            &mut seen,
        );
        assert_eq!(scan.outcome, ScanOutcome::StopExhausted);
        assert_eq!(scan.stats.malformed, 2);
        assert_eq!(scan.stats.total, 0);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let mut seen = HashSet::new();
        let scan = scan_page(
            vec![row("3", false), ListingRow::malformed("x"), row("2", false)],
            None,
            &mut seen,
        );
        assert_eq!(ids(&scan.outcome), vec!["3", "2"]);
        assert_eq!(scan.stats.total, 2);
        assert_eq!(scan.stats.malformed, 1);
    }

    #[test]
    fn test_out_of_order_is_flagged_only() {
        let mut seen = HashSet::new();
        let scan = scan_page(vec![row("3", false), row("7", false)], None, &mut seen);
        assert_eq!(ids(&scan.outcome), vec!["3", "7"]);
        assert_eq!(scan.stats.out_of_order_pages, 1);
    }

    #[test]
    fn test_store_extend_and_serde_shape() {
        let mut store = WatermarkStore::new();
        assert!(!store.extend("empty", Vec::<String>::new()));
        assert!(store.get("empty").is_none());

        assert!(store.extend("기숙사_서울", ["2", "1"]));
        assert!(!store.extend("기숙사_서울", ["1"]));
        assert_eq!(store.total(), 2);

        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"기숙사_서울":["1","2"]}"#);

        let back: WatermarkStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }
}
