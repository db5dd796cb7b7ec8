//! HTML helpers shared by the source adapters.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{AppError, Result};
use crate::utils::text::normalize_whitespace;

/// Compile a CSS selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Compile a list of selectors, keeping their priority order.
pub fn parse_selectors(list: &[&str]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_selector(s)).collect()
}

/// Inline text of an element with whitespace collapsed.
pub fn inline_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of an element, one trimmed text node per line, blank nodes dropped.
pub fn block_text(element: ElementRef<'_>) -> String {
    text_nodes(element).join("\n")
}

/// Trimmed, non-blank text nodes under `element`, skipping scripts and styles.
pub fn text_nodes(element: ElementRef<'_>) -> Vec<String> {
    element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|e| e.name()))
                    .is_some_and(|name| matches!(name, "script" | "style" | "noscript"));
                if hidden {
                    return None;
                }
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        })
        .collect()
}

/// Body text from the first selector that matches, in priority order.
pub fn first_match_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).next())
        .map(block_text)
}

/// Whole-page text with blank lines removed.
pub fn page_text(document: &Html) -> String {
    block_text(document.root_element())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("a[href*='articleNo=']").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_first_match_respects_priority() {
        let html = Html::parse_document(
            r#"<div class="b">second</div><div class="a"><p>first</p><p> line </p></div>"#,
        );
        let sels = parse_selectors(&["div.a", "div.b"]).unwrap();
        assert_eq!(first_match_text(&html, &sels).as_deref(), Some("first\nline"));

        let none = parse_selectors(&["div.zzz"]).unwrap();
        assert_eq!(first_match_text(&html, &none), None);
    }

    #[test]
    fn test_page_text_skips_scripts_and_blank_lines() {
        let html = Html::parse_document(
            "<html><head><script>var x = 1;</script></head><body><p>가</p>\n\n<p>  </p><p>나</p></body></html>",
        );
        assert_eq!(page_text(&html), "가\n나");
    }

    #[test]
    fn test_inline_text_collapses_whitespace() {
        let html = Html::parse_fragment("<a>  2025 \n <b>공지</b>  </a>");
        let sel = parse_selector("a").unwrap();
        let a = html.select(&sel).next().unwrap();
        assert_eq!(inline_text(a), "2025 공지");
    }
}
