//! Post identifier derivation from listing number cells.
//!
//! Numbered rows use the bare post number. Pinned rows carry a label or no
//! number at all, so they get a composite key built from title and date.

/// How a board marks pinned rows and numbers regular ones.
#[derive(Debug, Clone, Copy)]
pub struct MarkerRule {
    /// Exact cell values that mark a pinned row
    pub pinned_labels: &'static [&'static str],
    /// An empty number cell marks a pinned row
    pub pinned_when_empty: bool,
    /// Substring of the cell text that marks a pinned row
    pub pinned_contains: Option<&'static str>,
    /// Prefix stripped from regular post numbers
    pub number_prefix: Option<&'static str>,
}

impl MarkerRule {
    /// `공지` label, `No.` prefixed numbers.
    pub const BOARD_LIST: Self = Self {
        pinned_labels: &["공지"],
        pinned_when_empty: false,
        pinned_contains: None,
        number_prefix: Some("No."),
    };

    /// An empty number cell (icon only) or `Image` text marks a pinned row.
    pub const DORM_TABLE: Self = Self {
        pinned_labels: &[],
        pinned_when_empty: true,
        pinned_contains: Some("Image"),
        number_prefix: None,
    };

    /// Derive `(post_identifier, is_pinned)` for a row.
    ///
    /// `marker` is the raw number cell, `None` when the row has no such cell.
    pub fn derive(&self, marker: Option<&str>, title: &str, date: Option<&str>) -> (String, bool) {
        let marker = marker.map(str::trim);

        if let Some(m) = marker {
            let pinned = self.pinned_labels.contains(&m)
                || (self.pinned_when_empty && m.is_empty())
                || self.pinned_contains.is_some_and(|needle| m.contains(needle));
            if pinned {
                return (pinned_key(title, date), true);
            }
        }

        match marker.filter(|m| !m.is_empty()) {
            Some(m) => {
                let number = self
                    .number_prefix
                    .and_then(|prefix| m.strip_prefix(prefix))
                    .map(str::trim)
                    .unwrap_or(m);
                (number.to_string(), false)
            }
            None => (fallback_key(title, date), false),
        }
    }
}

/// Composite key of a pinned row.
pub fn pinned_key(title: &str, date: Option<&str>) -> String {
    format!("NOTICE_{}_{}", title, date.unwrap_or(""))
}

/// Key for a regular row without a number cell.
pub fn fallback_key(title: &str, date: Option<&str>) -> String {
    format!("{}_{}", title, date.unwrap_or(""))
}
