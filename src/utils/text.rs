//! Text normalization shared by sources and document assembly.

/// Remove characters that cannot be encoded cleanly.
///
/// Decoding with [`clean_bytes`] already drops invalid sequences as U+FFFD;
/// those replacement characters and NUL bytes are removed here.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\u{FFFD}' && *c != '\0')
        .collect()
}

/// Decode bytes as UTF-8, dropping invalid sequences.
pub fn clean_bytes(bytes: &[u8]) -> String {
    clean_text(&String::from_utf8_lossy(bytes))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
