//! University portal board listed as `articleNo` anchors.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{FetchedBody, ListingRow, NoticeStub, SourceConfig};
use crate::services::html::{first_match_text, inline_text, page_text, parse_selector, parse_selectors};
use crate::services::sources::NoticeSource;
use crate::utils::{query_param, resolve_url, with_query};

const ANCHOR: &str = "a[href*='articleNo=']";
const BODY: &[&str] = &[
    "div.brd-view-con",
    "div.bbs-view-cont",
    "div.board-view-contents",
    "div.bv_cont",
];

/// Marker line that precedes the body in the page text.
const CONTENT_MARKER: &str = "게시글 내용";
const MODIFIED_MARKER: &str = "최종 수정일";
const DEPARTMENT_HINTS: &[&str] = &["학과", "팀", "대학", "센터"];

static MODIFIED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"최종 수정일\s*:?\s*(\S+)").expect("modified-date pattern is valid")
});

/// University-wide notice board (`학교_대표공지`).
///
/// The listing has no dates; category, date and department are read from
/// the detail page.
pub struct PortalSource {
    config: SourceConfig,
    article_limit: usize,
    base: Url,
    anchor: Selector,
    body: Vec<Selector>,
}

impl PortalSource {
    pub fn new(config: SourceConfig, article_limit: usize) -> Result<Self> {
        Ok(Self {
            base: Url::parse(&config.url)?,
            config,
            article_limit,
            anchor: parse_selector(ANCHOR)?,
            body: parse_selectors(BODY)?,
        })
    }
}

impl NoticeSource for PortalSource {
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
            .select(&self.anchor)
            .map(|anchor| {
                let title = inline_text(anchor);
                if title.is_empty() {
                    return ListingRow::malformed("empty title");
                }
                let href = anchor.value().attr("href").map(str::trim).unwrap_or("");
                if href.is_empty() {
                    return ListingRow::malformed("anchor without href");
                }

                let link = resolve_url(&self.base, href);
                let post_identifier = query_param(&link, "articleNo").unwrap_or_else(|| link.clone());

                ListingRow::Parsed(NoticeStub {
                    post_identifier,
                    title,
                    date_raw: None,
                    link,
                    is_pinned: false,
                    category: None,
                    author: None,
                })
            })
            .collect()
    }

    fn parse_detail(&self, html: &str) -> FetchedBody {
        let document = Html::parse_document(html);
        let full_text = page_text(&document);

        let body = first_match_text(&document, &self.body).unwrap_or_else(|| {
            match full_text.split_once(CONTENT_MARKER) {
                Some((_, after)) => after.trim().to_string(),
                None => full_text.clone(),
            }
        });

        let meta = scan_metadata(&full_text);
        let mut extra_meta = BTreeMap::new();
        if let Some(category) = meta.category {
            extra_meta.insert("category".to_string(), category);
        }
        if let Some(department) = meta.department {
            extra_meta.insert("department".to_string(), department);
        }

        FetchedBody {
            body,
            date: meta.date,
            extra_meta,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DetailMeta {
    category: Option<String>,
    date: Option<String>,
    department: Option<String>,
}

/// Scan page lines for `[category] ... 최종 수정일 : date` and a department.
///
/// The last metadata line wins; the first department-looking line wins.
fn scan_metadata(text: &str) -> DetailMeta {
    let mut meta = DetailMeta::default();

    for line in text.lines() {
        if line.contains('[') && line.contains(']') && line.contains(MODIFIED_MARKER) {
            if let Some((head, _)) = line.split_once(']') {
                let category = head.trim().trim_start_matches('[').trim();
                if !category.is_empty() {
                    meta.category = Some(category.to_string());
                }
            }
            if let Some(caps) = MODIFIED_DATE.captures(line) {
                meta.date = Some(caps[1].replace(':', " ").trim().to_string());
            }
        }

        if meta.department.is_none() && DEPARTMENT_HINTS.iter().any(|hint| line.contains(hint)) {
            meta.department = Some(line.trim().to_string());
        }
    }

    meta
}
