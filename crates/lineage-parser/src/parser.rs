//! The Context Parser

use crate::config::ParserConfig;
use crate::error::ParserError;
use crate::provenance::{ProvenanceResolver, RawChunk};
use crate::records::{decode_chunks, decode_entities, decode_relationships};
use crate::sections::{decode_sections, SectionKind};
use lineage_domain::{Chunk, ParsedContext};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Parses raw retrieval context into a [`ParsedContext`]
pub struct ContextParser {
    config: ParserConfig,
    resolver: ProvenanceResolver,
}

impl Default for ContextParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl ContextParser {
    /// Create a parser with the default provenance strategies
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            resolver: ProvenanceResolver::default(),
        }
    }

    /// Replace the provenance resolver
    pub fn with_resolver(mut self, resolver: ProvenanceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Get the parser configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the raw context; malformed input degrades, it never fails
    pub fn parse(&self, raw_context: &str) -> ParsedContext {
        let sections = decode_sections(raw_context);
        let limit = self.config.max_records_per_section;

        let entities =
            decode_entities(&records_or_empty(SectionKind::Entities, sections.entities), limit);
        let relationships = decode_relationships(
            &records_or_empty(SectionKind::Relationships, sections.relationships),
            limit,
        );
        let chunks: Vec<Chunk> =
            decode_chunks(&records_or_empty(SectionKind::Chunks, sections.chunks), limit)
                .into_iter()
                .map(|raw| self.resolve_chunk(raw))
                .collect();

        let context = ParsedContext {
            entities,
            relationships,
            chunks,
        };

        let resolved = context.resolved_chunk_count();
        info!(
            "Parsed context: {} entities, {} relationships, {} chunks ({} with resolved lineage)",
            context.entities.len(),
            context.relationships.len(),
            context.chunks.len(),
            resolved
        );
        if !context.chunks.is_empty() && resolved == 0 {
            warn!(
                "Upstream returned {} chunks without resolvable lineage; all sources are unknown",
                context.chunks.len()
            );
        }

        context
    }

    fn resolve_chunk(&self, raw: RawChunk) -> Chunk {
        let resolution = self.resolver.resolve(&raw);

        let content = match (&resolution.marker, self.config.strip_markers) {
            (Some(marker), true) => tidy_whitespace(&raw.content.replacen(marker.as_str(), " ", 1)),
            _ => raw.content,
        };

        Chunk {
            reference_id: raw.reference_id,
            content,
            provenance: resolution.provenance,
            date: raw.date.or(resolution.date),
            file_path: raw.file_path,
        }
    }
}

/// Parse with the default configuration
pub fn parse(raw_context: &str) -> ParsedContext {
    ContextParser::default().parse(raw_context)
}

fn records_or_empty(kind: SectionKind, decoded: Result<Vec<Value>, ParserError>) -> Vec<Value> {
    match decoded {
        Ok(records) => records,
        Err(ParserError::Empty) => {
            debug!("The {} section is empty", kind.as_str());
            Vec::new()
        }
        Err(e) => {
            warn!("Failed to decode {} section: {}", kind.as_str(), e);
            Vec::new()
        }
    }
}

/// Collapse runs of spaces left behind by marker removal, keep line breaks
fn tidy_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lineage_domain::{ProvenanceTier, SourceType};

    const SAMPLE: &str = r#"-----Entities(KG)-----
```json
[{"id": "1", "entity": "Apple Inc", "type": "ORGANIZATION"},
 {"id": "2", "entity": "iPhone", "type": "PRODUCT"}]
```
-----Relationships(KG)-----
```json
[{"entity1": "1", "entity2": "2", "description": "OFFERS", "weight": 0.9}]
```
-----Document Chunks(DC)-----
```json
[{"id": 1,
  "content": "[EMAIL | subject: Q2 Update | from: cfo@apple.com | date: 2024-07-01] iPhone revenue grew 8% in Q2.",
  "file_path": "inbox/q2.eml"},
 {"id": 2, "content": "Services revenue reached $24.2B.", "file_path": "filing:AAPL 10-Q.pdf"},
 {"id": 3, "content": "Analysts remain upbeat."}]
```"#;

    #[test]
    fn test_parse_sample_context() {
        let context = ContextParser::default().parse(SAMPLE);
        assert_eq!(context.entities.len(), 2);
        assert_eq!(context.relationships.len(), 1);
        assert_eq!(context.chunks.len(), 3);

        let email = &context.chunks[0];
        assert_eq!(email.provenance.tier, ProvenanceTier::InlineMarker);
        assert_eq!(email.label(), "Q2 Update");
        assert_eq!(email.content, "iPhone revenue grew 8% in Q2.");
        assert_eq!(email.date, NaiveDate::from_ymd_opt(2024, 7, 1));

        let filing = &context.chunks[1];
        assert_eq!(filing.source_type(), SourceType::Filing);
        assert_eq!(filing.label(), "AAPL 10-Q");

        let unknown = &context.chunks[2];
        assert_eq!(unknown.provenance.tier, ProvenanceTier::UnknownDefault);
        assert_eq!(unknown.label(), "Chunk 3");
    }

    #[test]
    fn test_markers_kept_when_stripping_disabled() {
        let parser = ContextParser::new(ParserConfig {
            strip_markers: false,
            ..Default::default()
        });
        let context = parser.parse(SAMPLE);
        assert!(context.chunks[0].content.starts_with("[EMAIL"));
        assert_eq!(context.chunks[0].provenance.tier, ProvenanceTier::InlineMarker);
    }

    #[test]
    fn test_record_limit_applies_per_section() {
        let parser = ContextParser::new(ParserConfig {
            max_records_per_section: 2,
            ..Default::default()
        });
        let context = parser.parse(SAMPLE);
        assert_eq!(context.entities.len(), 2);
        assert_eq!(context.relationships.len(), 1);
        let ids: Vec<&str> = context.chunks.iter().map(|c| c.reference_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_record_date_wins_over_marker_date() {
        let raw = r#"-----Chunks-----
[{"id": 1, "content": "[DOC | title: Memo | date: 2024-01-01] text", "date": "2024-02-02"}]"#;
        let context = parse(raw);
        assert_eq!(context.chunks[0].date, NaiveDate::from_ymd_opt(2024, 2, 2));
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(parse("").is_empty());
        assert!(parse("not a context").is_empty());
        assert!(parse("-----Entities-----\n[{\"id\"").is_empty());
    }

    #[test]
    fn test_tidy_whitespace() {
        assert_eq!(tidy_whitespace("  a   b \n c  "), "a b\nc");
    }
}
