//! Evidence patterns and formula classification

use crate::numeric::{find_conflict, ConflictReport};
use lineage_domain::{AttributedPath, AttributedSentence, Chunk, ParsedContext, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One source contributing to the aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSource {
    /// Chunk reference id
    pub reference_id: String,
    /// Source type of the chunk
    pub source_type: SourceType,
    /// Tier-assigned confidence
    pub confidence: f64,
    /// Passage text, scanned for numeric claims
    pub content: String,
}

impl EvidenceSource {
    /// Create an evidence source
    pub fn new(
        reference_id: impl Into<String>,
        source_type: SourceType,
        confidence: f64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            source_type,
            confidence,
            content: content.into(),
        }
    }
}

impl From<&Chunk> for EvidenceSource {
    fn from(chunk: &Chunk) -> Self {
        Self::new(
            chunk.reference_id.clone(),
            chunk.source_type(),
            chunk.confidence(),
            chunk.content.clone(),
        )
    }
}

/// One step of a reasoning chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// Rendered edge, `source -[relation]-> target`
    pub label: String,
    /// Step confidence
    pub confidence: f64,
}

impl From<&AttributedPath> for PathStep {
    fn from(path: &AttributedPath) -> Self {
        Self {
            label: path.render(),
            confidence: path.confidence,
        }
    }
}

/// Which formula applies to an evidence pattern
#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// Multi-hop query with at least one reasoning step
    MultiHop,
    /// Nothing to score
    NoEvidence,
    /// Multi-hop query without reasoning steps; scored by fallback
    Unclassifiable,
    /// Exactly one source
    SingleSource,
    /// Sources disagree on a numeric claim
    Conflicting(ConflictReport),
    /// Several agreeing sources
    Agreeing,
}

/// Everything the synthesizer scores for one answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidencePattern {
    /// Evidence sources in context order
    pub sources: Vec<EvidenceSource>,
    /// Reasoning steps in chain order
    pub steps: Vec<PathStep>,
    /// Whether the query needs multi-hop reasoning
    pub is_multi_hop: bool,
}

impl EvidencePattern {
    /// Create an evidence pattern
    pub fn new(sources: Vec<EvidenceSource>, steps: Vec<PathStep>, is_multi_hop: bool) -> Self {
        Self {
            sources,
            steps,
            is_multi_hop,
        }
    }

    /// Build the pattern from attribution results
    ///
    /// Sources are the chunks cited by any sentence. When no sentence cites a
    /// chunk, every chunk in the context counts as evidence.
    pub fn from_attribution(
        sentences: &[AttributedSentence],
        paths: &[AttributedPath],
        context: &ParsedContext,
        is_multi_hop: bool,
    ) -> Self {
        let cited: HashSet<&str> = sentences
            .iter()
            .flat_map(|s| s.matched_chunk_ids.iter().map(String::as_str))
            .collect();

        let sources: Vec<EvidenceSource> = if cited.is_empty() {
            context.chunks.iter().map(EvidenceSource::from).collect()
        } else {
            context
                .chunks
                .iter()
                .filter(|c| cited.contains(c.reference_id.as_str()))
                .map(EvidenceSource::from)
                .collect()
        };

        Self::new(sources, paths.iter().map(PathStep::from).collect(), is_multi_hop)
    }

    /// Classify the pattern; the order of checks fixes formula precedence
    pub fn classify(&self, conflict_tolerance: f64) -> PatternKind {
        if self.is_multi_hop && !self.steps.is_empty() {
            return PatternKind::MultiHop;
        }
        if self.sources.is_empty() {
            return PatternKind::NoEvidence;
        }
        if self.is_multi_hop {
            return PatternKind::Unclassifiable;
        }
        if self.sources.len() == 1 {
            return PatternKind::SingleSource;
        }
        match find_conflict(&self.sources, conflict_tolerance) {
            Some(report) => PatternKind::Conflicting(report),
            None => PatternKind::Agreeing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_domain::{Provenance, SourceDetails};

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk::new(
            id,
            content,
            Provenance::path_derived(SourceDetails::labelled(SourceType::Document, id)),
        )
    }

    fn step(confidence: f64) -> PathStep {
        PathStep {
            label: "A -[R]-> B".to_string(),
            confidence,
        }
    }

    #[test]
    fn test_classification_order() {
        let one = vec![EvidenceSource::new("1", SourceType::Filing, 0.9, "x")];
        let two = vec![
            EvidenceSource::new("1", SourceType::Filing, 0.9, "x"),
            EvidenceSource::new("2", SourceType::Email, 0.6, "y"),
        ];

        let kind = |sources, steps, multi_hop| {
            EvidencePattern::new(sources, steps, multi_hop).classify(0.05)
        };

        assert_eq!(kind(vec![], vec![step(0.5)], true), PatternKind::MultiHop);
        assert_eq!(kind(vec![], vec![], true), PatternKind::NoEvidence);
        assert_eq!(kind(two.clone(), vec![], true), PatternKind::Unclassifiable);
        assert_eq!(kind(one, vec![step(0.5)], false), PatternKind::SingleSource);
        assert_eq!(kind(two, vec![], false), PatternKind::Agreeing);
    }

    #[test]
    fn test_from_attribution_uses_cited_chunks() {
        let context = ParsedContext {
            chunks: vec![chunk("1", "a"), chunk("2", "b"), chunk("3", "c")],
            ..Default::default()
        };
        let mut sentence = AttributedSentence::unattributed("s", 0.3);
        sentence.matched_chunk_ids = vec!["3".to_string(), "1".to_string()];

        let pattern = EvidencePattern::from_attribution(&[sentence], &[], &context, false);
        let ids: Vec<&str> = pattern.sources.iter().map(|s| s.reference_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_from_attribution_falls_back_to_all_chunks() {
        let context = ParsedContext {
            chunks: vec![chunk("1", "a"), chunk("2", "b")],
            ..Default::default()
        };
        let sentence = AttributedSentence::unattributed("s", 0.3);
        let pattern = EvidencePattern::from_attribution(&[sentence], &[], &context, false);
        assert_eq!(pattern.sources.len(), 2);
    }
}
