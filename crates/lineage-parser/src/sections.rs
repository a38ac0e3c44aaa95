//! Section framing for the raw context blob
//!
//! Splits the blob on `-----<Name>-----` header lines and decodes each body
//! independently, so one malformed section cannot take the others down.

use crate::error::ParserError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*([^\r\n-][^\r\n]*?)[ \t]*-{3,}[ \t]*\r?$")
        .unwrap_or_else(|e| panic!("section header pattern is invalid: {}", e))
});

/// Which records a section holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Entities,
    Relationships,
    Chunks,
}

impl SectionKind {
    /// Classify a header name; `None` for sections the parser does not read
    pub(crate) fn classify(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("relationships") {
            Some(SectionKind::Relationships)
        } else if name.contains("entities") {
            Some(SectionKind::Entities)
        } else if name.contains("chunks") || name.contains("sources") {
            Some(SectionKind::Chunks)
        } else {
            None
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Entities => "entities",
            SectionKind::Relationships => "relationships",
            SectionKind::Chunks => "chunks",
        }
    }
}

/// Decoded record lists, one result per section kind
///
/// A kind with no section in the blob decodes to an empty list.
#[derive(Debug)]
pub(crate) struct DecodedSections {
    pub entities: Result<Vec<Value>, ParserError>,
    pub relationships: Result<Vec<Value>, ParserError>,
    pub chunks: Result<Vec<Value>, ParserError>,
}

impl Default for DecodedSections {
    fn default() -> Self {
        Self {
            entities: Ok(Vec::new()),
            relationships: Ok(Vec::new()),
            chunks: Ok(Vec::new()),
        }
    }
}

impl DecodedSections {
    fn slot(&mut self, kind: SectionKind) -> &mut Result<Vec<Value>, ParserError> {
        match kind {
            SectionKind::Entities => &mut self.entities,
            SectionKind::Relationships => &mut self.relationships,
            SectionKind::Chunks => &mut self.chunks,
        }
    }

    /// Merge a decoded body into its slot; repeated sections append
    fn merge(&mut self, kind: SectionKind, decoded: Result<Vec<Value>, ParserError>) {
        let slot = self.slot(kind);
        let previous = std::mem::replace(slot, Ok(Vec::new()));
        *slot = match (previous, decoded) {
            (Ok(mut existing), Ok(records)) => {
                existing.extend(records);
                Ok(existing)
            }
            (Ok(existing), Err(e)) if existing.is_empty() => Err(e),
            (Ok(existing), Err(_)) => Ok(existing),
            (Err(_), Ok(records)) => Ok(records),
            (Err(e), Err(_)) => Err(e),
        };
    }
}

/// Split the raw context into sections and decode each body
pub(crate) fn decode_sections(raw: &str) -> DecodedSections {
    if let Some(decoded) = decode_object_form(raw) {
        return decoded;
    }

    let mut decoded = DecodedSections::default();
    let headers: Vec<_> = SECTION_HEADER.captures_iter(raw).collect();

    for (idx, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body_end = headers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        let body = &raw[whole.end()..body_end];

        match SectionKind::classify(name.as_str()) {
            Some(kind) => {
                debug!("Decoding {} section '{}'", kind.as_str(), name.as_str().trim());
                decoded.merge(kind, decode_records(body));
            }
            None => debug!("Ignoring unrecognised section '{}'", name.as_str().trim()),
        }
    }

    decoded
}

/// Decode one section body into a list of raw records
pub(crate) fn decode_records(body: &str) -> Result<Vec<Value>, ParserError> {
    let json = strip_code_fence(body);
    if json.is_empty() {
        return Err(ParserError::Empty);
    }
    as_record_list(serde_json::from_str(json)?)
}

/// Remove a surrounding Markdown code fence, if any
fn strip_code_fence(body: &str) -> &str {
    let mut text = body.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => "",
        };
        text = text.trim_end();
        if let Some(stripped) = text.strip_suffix("```") {
            text = stripped;
        }
    }
    text.trim()
}

fn as_record_list(value: Value) -> Result<Vec<Value>, ParserError> {
    match value {
        Value::Array(records) => Ok(records),
        other => Err(ParserError::NotAnArray(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Alternate framing: a single JSON object keyed by section name
///
/// Returns `None` unless the whole blob is a JSON object, so framed text and
/// garbage both fall through to header scanning.
fn decode_object_form(raw: &str) -> Option<DecodedSections> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return None;
    };

    debug!("Decoding context in JSON object form ({} keys)", map.len());
    let mut decoded = DecodedSections::default();
    for (key, value) in map {
        match SectionKind::classify(&key) {
            Some(kind) => decoded.merge(kind, as_record_list(value)),
            None => debug!("Ignoring unrecognised context key '{}'", key),
        }
    }
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_header_names() {
        assert_eq!(SectionKind::classify("Entities(KG)"), Some(SectionKind::Entities));
        assert_eq!(
            SectionKind::classify("Relationships(KG)"),
            Some(SectionKind::Relationships)
        );
        assert_eq!(
            SectionKind::classify("Document Chunks(DC)"),
            Some(SectionKind::Chunks)
        );
        assert_eq!(SectionKind::classify("Sources"), Some(SectionKind::Chunks));
        assert_eq!(SectionKind::classify("Summary"), None);
    }

    #[test]
    fn test_decode_three_sections() {
        let raw = "-----Entities(KG)-----\n[{\"id\": \"1\"}]\n\
                   -----Relationships(KG)-----\n[]\n\
                   ---------Document Chunks(DC)---------\n\
                   [{\"content\": \"a\"}, {\"content\": \"b\"}]\n";
        let decoded = decode_sections(raw);
        assert_eq!(decoded.entities.unwrap().len(), 1);
        assert!(decoded.relationships.unwrap().is_empty());
        assert_eq!(decoded.chunks.unwrap().len(), 2);
    }

    #[test]
    fn test_fenced_body() {
        let body = "\n```json\n[{\"id\": 1}]\n```\n";
        assert_eq!(decode_records(body).unwrap().len(), 1);
    }

    #[test]
    fn test_truncated_section_fails_alone() {
        let raw = "-----Entities-----\n[{\"id\": \"1\", \"entity\": \"Ap\n\
                   -----Document Chunks-----\n[{\"content\": \"ok\"}]\n";
        let decoded = decode_sections(raw);
        assert!(matches!(decoded.entities, Err(ParserError::JsonParse(_))));
        assert_eq!(decoded.chunks.unwrap().len(), 1);
    }

    #[test]
    fn test_non_array_body() {
        assert!(matches!(
            decode_records("{\"id\": 1}"),
            Err(ParserError::NotAnArray("object"))
        ));
        assert!(matches!(decode_records("  "), Err(ParserError::Empty)));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let decoded = decode_sections("no framing at all");
        assert!(decoded.entities.unwrap().is_empty());
        assert!(decoded.relationships.unwrap().is_empty());
        assert!(decoded.chunks.unwrap().is_empty());
    }

    #[test]
    fn test_object_form() {
        let raw =
            r#"{"entities": [{"id": "1"}], "chunks": [{"content": "x"}], "notes": "ignored"}"#;
        let decoded = decode_sections(raw);
        assert_eq!(decoded.entities.unwrap().len(), 1);
        assert_eq!(decoded.chunks.unwrap().len(), 1);
        assert!(decoded.relationships.unwrap().is_empty());
    }

    #[test]
    fn test_repeated_sections_append() {
        let raw = "-----Document Chunks-----\n[{\"content\": \"a\"}]\n\
                   -----Sources-----\n[{\"content\": \"b\"}]\n";
        assert_eq!(decode_sections(raw).chunks.unwrap().len(), 2);
    }
}
