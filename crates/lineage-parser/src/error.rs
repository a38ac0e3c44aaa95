//! Error types for section decoding
//!
//! These never escape [`ContextParser::parse`](crate::ContextParser::parse);
//! they are logged and the affected section degrades to an empty list.

use thiserror::Error;

/// Errors that can occur while decoding one context section
#[derive(Error, Debug)]
pub enum ParserError {
    /// Section body is not valid JSON (truncated or malformed)
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Section body decoded but is not a list of records
    #[error("Expected a JSON array of records, found {0}")]
    NotAnArray(&'static str),

    /// Section body is empty
    #[error("Section is empty")]
    Empty,
}

impl From<serde_json::Error> for ParserError {
    fn from(e: serde_json::Error) -> Self {
        ParserError::JsonParse(e.to_string())
    }
}
