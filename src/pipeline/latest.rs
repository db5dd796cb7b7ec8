//! Latest-notices projection across all boards.

use crate::models::{LatestNotice, Notice};

/// Newest `top_n` notices by date, descending.
///
/// Dates are compared as text. Notices without a date sort last; ties keep
/// their input order.
pub fn latest_notices(notices: &[Notice], top_n: usize) -> Vec<LatestNotice> {
    let mut sorted: Vec<&Notice> = notices.iter().collect();
    sorted.sort_by(|a, b| b.date().cmp(&a.date()));
    sorted.into_iter().take(top_n).map(LatestNotice::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetchedBody, NoticeStub};

    fn notice(id: &str, date: Option<&str>) -> Notice {
        Notice::from_stub(
            NoticeStub {
                post_identifier: id.to_string(),
                title: format!("공지 {id}"),
                date_raw: date.map(str::to_string),
                link: format!("https://example.com/{id}"),
                is_pinned: false,
                category: None,
                author: None,
            },
            "소프트웨어학과",
            FetchedBody::default(),
        )
    }

    #[test]
    fn test_sorted_by_date_desc_and_truncated() {
        let notices = vec![
            notice("1", Some("2025-01-01")),
            notice("2", Some("2025-03-01")),
            notice("3", None),
            notice("4", Some("2025-02-01")),
        ];
        let latest = latest_notices(&notices, 3);
        let ids: Vec<_> = latest.iter().map(|n| n.post_identifier.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "1"]);
    }

    #[test]
    fn test_missing_dates_sort_last() {
        let notices = vec![notice("a", None), notice("b", Some("2025-01-01")), notice("c", None)];
        let latest = latest_notices(&notices, 6);
        let ids: Vec<_> = latest.iter().map(|n| n.post_identifier.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(latest[1].date, "");
    }

    #[test]
    fn test_fewer_than_top_n() {
        assert!(latest_notices(&[], 6).is_empty());
        assert_eq!(latest_notices(&[notice("1", None)], 6).len(), 1);
    }
}
