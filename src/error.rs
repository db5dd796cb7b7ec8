// src/error.rs

//! Unified error handling for the ingest pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Browsing session could not be started or failed mid-run
    #[error("Session error: {0}")]
    Session(String),

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },

    /// PDF text extraction failed
    #[error("PDF error for {file}: {message}")]
    Pdf { file: String, message: String },

    /// Language model returned output that is not the expected JSON
    #[error("Model output could not be parsed: {0}")]
    ModelOutput(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a session error.
    pub fn session(message: impl fmt::Display) -> Self {
        Self::Session(message.to_string())
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a PDF extraction error.
    pub fn pdf(file: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pdf {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Create a model-output error.
    pub fn model_output(message: impl Into<String>) -> Self {
        Self::ModelOutput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_error_display() {
        let err = AppError::crawl("기숙사_서울", "listing fetch failed");
        assert_eq!(
            err.to_string(),
            "Crawl error for 기숙사_서울: listing fetch failed"
        );
    }

    #[test]
    fn test_model_output_is_distinct() {
        let err = AppError::model_output("not json");
        assert!(matches!(err, AppError::ModelOutput(_)));
    }
}
