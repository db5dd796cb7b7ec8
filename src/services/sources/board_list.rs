//! Department boards rendered as `ul.board-list-wrap > li` lists.

use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{FetchedBody, ListingRow, NoticeStub, SourceConfig};
use crate::services::html::{first_match_text, inline_text, page_text, parse_selector, parse_selectors};
use crate::services::marker::MarkerRule;
use crate::services::sources::NoticeSource;
use crate::utils::{resolve_url, with_query};

const ROW: &str = "ul.board-list-wrap > li";
const TITLE: &str = ".board-list-content-title a";
const INFO: &str = ".board-list-content-info ul li";
const BODY: &[&str] = &["div.fr-view", "div.bbs-view-cont", "div.board_view", "div#viewDetail"];

/// Department notice board (`소프트웨어학과`, `소프트웨어융합대학`).
///
/// The info list of each row holds `[number, author, date, ...]`; the number
/// is `공지` for pinned rows and `No. 123` style otherwise.
pub struct BoardListSource {
    config: SourceConfig,
    article_limit: usize,
    base: Url,
    row: Selector,
    title: Selector,
    info: Selector,
    body: Vec<Selector>,
}

impl BoardListSource {
    pub fn new(config: SourceConfig, article_limit: usize) -> Result<Self> {
        Ok(Self {
            base: Url::parse(&config.url)?,
            config,
            article_limit,
            row: parse_selector(ROW)?,
            title: parse_selector(TITLE)?,
            info: parse_selector(INFO)?,
            body: parse_selectors(BODY)?,
        })
    }
}

impl NoticeSource for BoardListSource {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn list_url(&self, page_index: usize) -> Result<String> {
        with_query(
            &self.config.url,
            &[
                ("mode", "list".to_string()),
                ("articleLimit", self.article_limit.to_string()),
                ("article.offset", (page_index * self.article_limit).to_string()),
            ],
        )
    }

    fn parse_listing(&self, html: &str) -> Vec<ListingRow> {
        let document = Html::parse_document(html);

        document
            .select(&self.row)
            .map(|item| {
                let Some(anchor) = item.select(&self.title).next() else {
                    return ListingRow::malformed("missing title anchor");
                };
                let title = inline_text(anchor);
                if title.is_empty() {
                    return ListingRow::malformed("empty title");
                }
                let Some(href) = anchor.value().attr("href").map(str::trim) else {
                    return ListingRow::malformed("title anchor without href");
                };

                let info: Vec<String> = item.select(&self.info).map(inline_text).collect();
                let date = info.get(2).filter(|d| !d.is_empty()).cloned();
                let author = info.get(1).filter(|a| !a.is_empty()).cloned();
                let (post_identifier, is_pinned) = MarkerRule::BOARD_LIST.derive(
                    info.first().map(String::as_str),
                    &title,
                    date.as_deref(),
                );

                ListingRow::Parsed(NoticeStub {
                    post_identifier,
                    title,
                    date_raw: date,
                    link: resolve_url(&self.base, href),
                    is_pinned,
                    category: None,
                    author,
                })
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
        <ul class="board-list-wrap">
          <li>
            <dl>
              <dt class="board-list-content-title"><a href="?mode=view&amp;articleNo=100">  수강신청 일정 안내 </a></dt>
              <dd class="board-list-content-info"><ul><li>공지</li><li>학과사무실</li><li>2025-08-20</li><li>조회수 10</li></ul></dd>
            </dl>
          </li>
          <li>
            <dl>
              <dt class="board-list-content-title"><a href="?mode=view&amp;articleNo=909">캡스톤 발표회</a></dt>
              <dd class="board-list-content-info"><ul><li>No. 909</li><li>홍길동</li><li>2025-09-01</li></ul></dd>
            </dl>
          </li>
          <li><dl><dt class="board-list-content-title">제목만 있음</dt></dl></li>
          <li>
            <dl>
              <dt class="board-list-content-title"><a href="?mode=view&amp;articleNo=907">정보 없음</a></dt>
            </dl>
          </li>
        </ul>
    "#;

    fn source() -> BoardListSource {
        BoardListSource::new(Config::default().sources[0].clone(), 10).unwrap()
    }

    #[test]
    fn test_list_url_offsets() {
        let src = source();
        assert_eq!(
            src.list_url(0).unwrap(),
            "https://cse.skku.edu/cse/notice.do?mode=list&articleLimit=10&article.offset=0"
        );
        assert!(src.list_url(2).unwrap().ends_with("article.offset=20"));
    }

    #[test]
    fn test_parse_listing() {
        let rows = source().parse_listing(LISTING);
        assert_eq!(rows.len(), 4);

        let ListingRow::Parsed(pinned) = &rows[0] else {
            panic!("expected parsed row");
        };
        assert!(pinned.is_pinned);
        assert_eq!(pinned.post_identifier, "NOTICE_수강신청 일정 안내_2025-08-20");
        assert_eq!(pinned.title, "수강신청 일정 안내");
        assert_eq!(
            pinned.link,
            "https://cse.skku.edu/cse/notice.do?mode=view&articleNo=100"
        );

        let ListingRow::Parsed(regular) = &rows[1] else {
            panic!("expected parsed row");
        };
        assert!(!regular.is_pinned);
        assert_eq!(regular.post_identifier, "909");
        assert_eq!(regular.author.as_deref(), Some("홍길동"));
        assert_eq!(regular.date_raw.as_deref(), Some("2025-09-01"));

        assert!(matches!(rows[2], ListingRow::Malformed { .. }));

        let ListingRow::Parsed(no_info) = &rows[3] else {
            panic!("expected parsed row");
        };
        assert_eq!(no_info.post_identifier, "정보 없음_");
        assert_eq!(no_info.date_raw, None);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(source().parse_listing("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_detail() {
        let src = source();
        let body = src.parse_detail(
            r#"<div class="header">메뉴</div><div class="fr-view"><p>첫 줄</p><p></p><p>둘째 줄</p></div>"#,
        );
        assert_eq!(body.body, "첫 줄\n둘째 줄");

        let fallback = src.parse_detail("<body><p>본문</p>\n\n<p>끝</p></body>");
        assert_eq!(fallback.body, "본문\n끝");
    }
}
