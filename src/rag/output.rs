//! Parsing of JSON replies from the language model.

use serde_json::Value;

use crate::error::{AppError, Result};

/// Strip wrappers models put around JSON.
///
/// Removes code fences and a leading `json` tag, straightens smart quotes,
/// drops a BOM and keeps the outermost `{...}` or `[...]` span.
pub fn clean_model_output(raw: &str) -> String {
    let mut text = raw.replace('\u{FEFF}', "").trim().to_string();

    if text.starts_with("```") {
        text = text.trim_start_matches('`').to_string();
        if let Some(rest) = text.strip_prefix("json") {
            text = rest.to_string();
        }
        text = text.trim_end().trim_end_matches('`').to_string();
    }

    let text = text
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    outermost_json(&text).unwrap_or(text.trim()).to_string()
}

/// Span from the first opening bracket to its matching last closing one.
fn outermost_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into a JSON array.
///
/// A lone object is wrapped in an array. Anything that is not an object or
/// array after cleaning is an [`AppError::ModelOutput`].
pub fn parse_model_json(raw: &str) -> Result<Value> {
    let cleaned = clean_model_output(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| AppError::model_output(format!("{e}: {}", preview(&cleaned))))?;

    match value {
        Value::Array(_) => Ok(value),
        Value::Object(_) => Ok(Value::Array(vec![value])),
        other => Err(AppError::model_output(format!(
            "expected an object or array, got {other}"
        ))),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
