//! Notice data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A listing row before its detail page is fetched.
///
/// `post_identifier` is unique only within its source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoticeStub {
    /// Source-local identifier (bare post number, article id, or composite key)
    pub post_identifier: String,

    /// Notice title
    pub title: String,

    /// Date text as shown on the listing, if any
    pub date_raw: Option<String>,

    /// Absolute URL of the detail page
    pub link: String,

    /// Pinned rows recur on every listing page
    pub is_pinned: bool,

    /// Listing category column (dormitory boards)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Author column (department boards)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Result of parsing one listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingRow {
    /// Row parsed into a stub
    Parsed(NoticeStub),
    /// Row lacked a title or link
    Malformed { reason: String },
}

impl ListingRow {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Detail page content extracted by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedBody {
    /// Body text, one text node per line
    pub body: String,

    /// Date found on the detail page (used when the listing has none)
    pub date: Option<String>,

    /// Source-specific fields such as `department`
    pub extra_meta: BTreeMap<String, String>,
}

/// A notice with its body text, tagged with the board it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    #[serde(flatten)]
    pub stub: NoticeStub,

    /// Body text of the detail page
    pub body: String,

    /// Configured board name of the source
    pub board_name: String,

    /// Source-specific metadata
    #[serde(default)]
    pub extra_meta: BTreeMap<String, String>,
}

impl Notice {
    /// Combine a stub with its fetched detail page.
    pub fn from_stub(mut stub: NoticeStub, board_name: &str, fetched: FetchedBody) -> Self {
        if stub.date_raw.as_deref().is_none_or(str::is_empty) {
            stub.date_raw = fetched.date;
        }
        if stub.category.is_none() {
            stub.category = fetched.extra_meta.get("category").cloned();
        }

        Self {
            stub,
            body: fetched.body,
            board_name: board_name.to_string(),
            extra_meta: fetched.extra_meta,
        }
    }

    pub fn post_identifier(&self) -> &str {
        &self.stub.post_identifier
    }

    pub fn title(&self) -> &str {
        &self.stub.title
    }

    /// Date text, `None` when missing or blank.
    pub fn date(&self) -> Option<&str> {
        self.stub
            .date_raw
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// One entry of the latest-notices file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatestNotice {
    pub board_name: String,
    pub title: String,
    /// Empty when the notice had no date
    pub date: String,
    pub post_identifier: String,
    pub link: String,
}

impl From<&Notice> for LatestNotice {
    fn from(notice: &Notice) -> Self {
        Self {
            board_name: notice.board_name.clone(),
            title: notice.stub.title.clone(),
            date: notice.date().unwrap_or("").to_string(),
            post_identifier: notice.stub.post_identifier.clone(),
            link: notice.stub.link.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stub() -> NoticeStub {
        NoticeStub {
            post_identifier: "909".to_string(),
            title: "2025학년도 2학기 수강신청 안내".to_string(),
            date_raw: Some("2025-08-01".to_string()),
            link: "https://cse.skku.edu/cse/notice.do?mode=view&articleNo=909".to_string(),
            is_pinned: false,
            category: None,
            author: Some("학과사무실".to_string()),
        }
    }

    #[test]
    fn test_detail_date_fills_missing_listing_date() {
        let mut stub = sample_stub();
        stub.date_raw = None;
        let fetched = FetchedBody {
            body: "본문".to_string(),
            date: Some("2025-09-10".to_string()),
            extra_meta: BTreeMap::from([("category".to_string(), "학사".to_string())]),
        };

        let notice = Notice::from_stub(stub, "학교_대표공지", fetched);
        assert_eq!(notice.date(), Some("2025-09-10"));
        assert_eq!(notice.stub.category.as_deref(), Some("학사"));
    }

    #[test]
    fn test_listing_date_wins_over_detail_date() {
        let fetched = FetchedBody {
            date: Some("1999-01-01".to_string()),
            ..FetchedBody::default()
        };
        let notice = Notice::from_stub(sample_stub(), "소프트웨어학과", fetched);
        assert_eq!(notice.date(), Some("2025-08-01"));
    }

    #[test]
    fn test_blank_date_is_missing() {
        let mut stub = sample_stub();
        stub.date_raw = Some("  ".to_string());
        let notice = Notice::from_stub(stub, "b", FetchedBody::default());
        assert_eq!(notice.date(), None);
        assert_eq!(LatestNotice::from(&notice).date, "");
    }
}
