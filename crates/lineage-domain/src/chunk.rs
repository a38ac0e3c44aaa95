//! Retrieved text chunks and the parsed context container

use crate::provenance::Provenance;
use crate::source::SourceType;
use crate::{Entity, Relationship};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A unit of retrieved text with resolved provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Reference id used by citations
    pub reference_id: String,

    /// Passage text (inline provenance markers removed)
    pub content: String,

    /// Resolved provenance
    pub provenance: Provenance,

    /// Evidence date, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Raw path or identifier string reported upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        reference_id: impl Into<String>,
        content: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            content: content.into(),
            provenance,
            date: None,
            file_path: None,
        }
    }

    /// Attach an evidence date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Source type of the chunk
    pub fn source_type(&self) -> SourceType {
        self.provenance.source_type()
    }

    /// Confidence assigned by the provenance tier
    pub fn confidence(&self) -> f64 {
        self.provenance.confidence
    }

    /// Human-readable source label
    pub fn label(&self) -> &str {
        self.provenance.details.label()
    }
}

/// Typed view of one query's retrieved context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedContext {
    /// Graph entities
    pub entities: Vec<Entity>,

    /// Graph relationships
    pub relationships: Vec<Relationship>,

    /// Text chunks with resolved provenance
    pub chunks: Vec<Chunk>,
}

impl ParsedContext {
    /// Whether the context holds no evidence at all
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty() && self.chunks.is_empty()
    }

    /// Look up an entity by id
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Look up a chunk by reference id
    pub fn chunk(&self, reference_id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.reference_id == reference_id)
    }

    /// Number of chunks whose provenance resolved above the default tier
    pub fn resolved_chunk_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.provenance.tier.is_resolved())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceDetails;

    #[test]
    fn test_chunk_accessors() {
        let chunk = Chunk::new(
            "3",
            "Revenue grew 8%.",
            Provenance::path_derived(SourceDetails::labelled(
                SourceType::Email,
                "Quarterly Update",
            )),
        );
        assert_eq!(chunk.source_type(), SourceType::Email);
        assert_eq!(chunk.label(), "Quarterly Update");
        assert_eq!(chunk.confidence(), 0.70);
    }

    #[test]
    fn test_resolved_chunk_count() {
        let context = ParsedContext {
            chunks: vec![
                Chunk::new("1", "a", Provenance::unknown("Chunk 1")),
                Chunk::new(
                    "2",
                    "b",
                    Provenance::path_derived(SourceDetails::labelled(SourceType::Document, "b")),
                ),
            ],
            ..Default::default()
        };
        assert_eq!(context.resolved_chunk_count(), 1);
        assert!(context.chunk("2").is_some());
        assert!(context.chunk("9").is_none());
    }
}
