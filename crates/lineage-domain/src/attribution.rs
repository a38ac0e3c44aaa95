//! Lineage reconstructed for a generated answer

use crate::source::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sentence of the generated answer plus its supporting chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedSentence {
    /// Sentence text as shown to the reader
    pub text: String,

    /// Supporting chunk reference ids, strongest match first
    pub matched_chunk_ids: Vec<String>,

    /// Sentence confidence in [0, 1]
    pub confidence: f64,

    /// Matched chunks counted per source type
    pub source_type_counts: BTreeMap<SourceType, usize>,
}

impl AttributedSentence {
    /// A sentence with no supporting evidence
    pub fn unattributed(text: impl Into<String>, floor_confidence: f64) -> Self {
        Self {
            text: text.into(),
            matched_chunk_ids: Vec::new(),
            confidence: floor_confidence,
            source_type_counts: BTreeMap::new(),
        }
    }

    /// Whether at least one chunk supports this sentence
    pub fn is_attributed(&self) -> bool {
        !self.matched_chunk_ids.is_empty()
    }
}

/// One reasoning edge annotated with corroborating evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedPath {
    /// Label of the source entity (or `Unknown(<id>)`)
    pub source_label: String,

    /// Relationship description
    pub relation_label: String,

    /// Label of the target entity (or `Unknown(<id>)`)
    pub target_label: String,

    /// Chunks from the sentence attribution that mention either endpoint
    pub supporting_chunk_ids: Vec<String>,

    /// Step confidence used by the multi-hop decay formula
    pub confidence: f64,
}

impl AttributedPath {
    /// Render as `source -[relation]-> target`
    pub fn render(&self) -> String {
        format!(
            "{} -[{}]-> {}",
            self.source_label, self.relation_label, self.target_label
        )
    }
}
