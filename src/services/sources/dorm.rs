//! Dormitory boards rendered as `table tbody tr` rows.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{FetchedBody, ListingRow, NoticeStub, SourceConfig};
use crate::services::html::{first_match_text, inline_text, page_text, parse_selector, parse_selectors};
use crate::services::marker::MarkerRule;
use crate::services::sources::NoticeSource;
use crate::utils::{resolve_url, with_query};

const ROW: &str = "table tbody tr";
const ANCHOR: &str = "a";
const BODY: &[&str] = &["div.fr-view", "div.bbs-view-cont", "div.board_view", "div#viewDetail"];

/// Rows with fewer cells are headers or spacers, not posts.
const MIN_CELLS: usize = 5;

/// Dormitory notice board (`기숙사_서울`, `기숙사_수원`).
///
/// Cells are `[number, category, title, ..., date, views]`. Pinned rows show
/// an icon or nothing in the number cell; only the cell text counts, so an
/// icon-only cell is empty.
pub struct DormTableSource {
    config: SourceConfig,
    board_no: String,
    article_limit: usize,
    base: Url,
    row: Selector,
    anchor: Selector,
    body: Vec<Selector>,
}

impl DormTableSource {
    pub fn new(config: SourceConfig, article_limit: usize) -> Result<Self> {
        let board_no = config.board_no.clone().ok_or_else(|| {
            AppError::config(format!("{} needs board_no", config.board_name))
        })?;
        Ok(Self {
            base: Url::parse(&config.url)?,
            config,
            board_no,
            article_limit,
            row: parse_selector(ROW)?,
            anchor: parse_selector(ANCHOR)?,
            body: parse_selectors(BODY)?,
        })
    }

    fn parse_row(&self, cells: &[ElementRef<'_>]) -> ListingRow {
        let Some(anchor) = cells[2].select(&self.anchor).next() else {
            return ListingRow::malformed("missing title anchor");
        };
        let title = inline_text(anchor);
        if title.is_empty() {
            return ListingRow::malformed("empty title");
        }
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            return ListingRow::malformed("title anchor without href");
        };

        let number = inline_text(cells[0]);
        let category = Some(inline_text(cells[1])).filter(|c| !c.is_empty());
        let date = Some(inline_text(cells[cells.len() - 2])).filter(|d| !d.is_empty());
        let (post_identifier, is_pinned) =
            MarkerRule::DORM_TABLE.derive(Some(number.as_str()), &title, date.as_deref());

        ListingRow::Parsed(NoticeStub {
            post_identifier,
            title,
            date_raw: date,
            link: resolve_url(&self.base, href),
            is_pinned,
            category,
            author: None,
        })
    }
}

impl NoticeSource for DormTableSource {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn list_url(&self, page_index: usize) -> Result<String> {
        with_query(
            &self.config.url,
            &[
                ("board_no", self.board_no.clone()),
                ("mode", "list".to_string()),
                ("pager.offset", (page_index * self.article_limit).to_string()),
            ],
        )
    }

    fn parse_listing(&self, html: &str) -> Vec<ListingRow> {
        let document = Html::parse_document(html);

        document
            .select(&self.row)
            .filter_map(|row| {
                let cells: Vec<ElementRef<'_>> = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "td")
                    .collect();
                (cells.len() >= MIN_CELLS).then(|| self.parse_row(&cells))
            })
            .collect()
    }

    fn parse_detail(&self, html: &str) -> FetchedBody {
        let document = Html::parse_document(html);
        let body = first_match_text(&document, &self.body).unwrap_or_else(|| page_text(&document));
        FetchedBody {
            body,
            ..FetchedBody::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    const LISTING: &str = r#"
        <table>
          <thead><tr><th>번호</th><th>분류</th><th>제목</th><th>작성자</th><th>날짜</th><th>조회</th></tr></thead>
          <tbody>
            <tr><td><img src="/images/noticeImage.png"></td><td>행정</td><td><a href="?mode=view&amp;article_no=55">소방 점검 안내</a></td><td>관리자</td><td>2025.09.01</td><td>120</td></tr>
            <tr><td>1234</td><td>생활</td><td><a href="?mode=view&amp;article_no=1234">세탁실 이용 안내</a></td><td>관리자</td><td>2025.09.03</td><td>40</td></tr>
            <tr><td>1233</td><td>생활</td><td>링크 없음</td><td>관리자</td><td>2025.09.02</td><td>3</td></tr>
            <tr><td colspan="6">등록된 게시물이 없습니다</td></tr>
          </tbody>
        </table>
    "#;

    fn source() -> DormTableSource {
        DormTableSource::new(Config::default().sources[2].clone(), 10).unwrap()
    }

    #[test]
    fn test_requires_board_no() {
        let mut config = Config::default().sources[2].clone();
        config.board_no = None;
        assert!(DormTableSource::new(config, 10).is_err());
    }

    #[test]
    fn test_list_url() {
        assert_eq!(
            source().list_url(1).unwrap(),
            "https://dorm.skku.edu/dorm_seoul/notice/notice_all.jsp?board_no=78&mode=list&pager.offset=10"
        );
    }

    #[test]
    fn test_parse_listing() {
        let rows = source().parse_listing(LISTING);
        assert_eq!(rows.len(), 3);

        let ListingRow::Parsed(pinned) = &rows[0] else {
            panic!("expected parsed row");
        };
        assert!(pinned.is_pinned);
        assert_eq!(pinned.post_identifier, "NOTICE_소방 점검 안내_2025.09.01");
        assert_eq!(pinned.category.as_deref(), Some("행정"));

        let ListingRow::Parsed(regular) = &rows[1] else {
            panic!("expected parsed row");
        };
        assert!(!regular.is_pinned);
        assert_eq!(regular.post_identifier, "1234");
        assert_eq!(regular.date_raw.as_deref(), Some("2025.09.03"));
        assert_eq!(
            regular.link,
            "https://dorm.skku.edu/dorm_seoul/notice/notice_all.jsp?mode=view&article_no=1234"
        );

        assert!(matches!(rows[2], ListingRow::Malformed { .. }));
    }

    #[test]
    fn test_icon_only_number_cell_is_pinned() {
        let html = r#"<table><tbody>
            <tr><td><img src="/images/ico_notice.png" alt="공지"></td><td>행정</td><td><a href="?mode=view&amp;article_no=60">단수 안내</a></td><td>관리자</td><td>2025.09.04</td><td>9</td></tr>
            <tr><td>13</td><td>생활</td><td><a href="?mode=view&amp;article_no=13">분리수거</a></td><td>관리자</td><td>2025.09.05</td><td>2</td></tr>
        </tbody></table>"#;
        let rows = source().parse_listing(html);

        let ListingRow::Parsed(pinned) = &rows[0] else {
            panic!("expected parsed row");
        };
        assert!(pinned.is_pinned);
        assert_eq!(pinned.post_identifier, "NOTICE_단수 안내_2025.09.04");
        assert_ne!(pinned.post_identifier, "공지");

        let ListingRow::Parsed(regular) = &rows[1] else {
            panic!("expected parsed row");
        };
        assert_eq!(regular.post_identifier, "13");
    }

    #[test]
    fn test_parse_detail_selector_priority() {
        let body = source().parse_detail(
            r#"<div id="viewDetail">나중</div><div class="board_view"><p>먼저</p></div>"#,
        );
        assert_eq!(body.body, "먼저");
    }
}
