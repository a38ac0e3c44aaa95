//! Graph path attribution for multi-hop answers

use crate::config::PathAttributorConfig;
use crate::references::{
    CapitalizedPhraseExtractor, ReferenceExtractor, ReferencesSectionExtractor,
};
use lineage_domain::{AttributedPath, AttributedSentence, ParsedContext, Relationship};
use std::collections::HashSet;
use tracing::{debug, info};

/// An endpoint resolved against the entity table
struct Endpoint {
    /// Display label, `Unknown(<id>)` when unresolved
    label: String,
    /// Text used for matching: the label, or the raw id when unresolved
    match_text: String,
}

impl Endpoint {
    fn resolve(id: &str, context: &ParsedContext) -> Self {
        let entity = context
            .entity(id)
            .or_else(|| context.entities.iter().find(|e| e.label == id));
        match entity {
            Some(entity) => Self {
                label: entity.label.clone(),
                match_text: entity.label.clone(),
            },
            None => Self {
                label: format!("Unknown({})", id),
                match_text: id.to_string(),
            },
        }
    }
}

/// Maps reasoning chains onto the entities an answer names
pub struct PathAttributor {
    config: PathAttributorConfig,
    extractors: Vec<Box<dyn ReferenceExtractor>>,
}

impl Default for PathAttributor {
    fn default() -> Self {
        Self::new(PathAttributorConfig::default())
    }
}

impl PathAttributor {
    /// Create an attributor with the default reference extractors
    pub fn new(config: PathAttributorConfig) -> Self {
        Self {
            config,
            extractors: vec![
                Box::new(ReferencesSectionExtractor),
                Box::new(CapitalizedPhraseExtractor::new()),
            ],
        }
    }

    /// Replace the reference extractors
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn ReferenceExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Get the attributor configuration
    pub fn config(&self) -> &PathAttributorConfig {
        &self.config
    }

    /// Reference entities from the first extractor that finds any
    pub fn reference_entities(&self, answer: &str) -> Vec<String> {
        for extractor in &self.extractors {
            let entities = extractor.extract(answer);
            if !entities.is_empty() {
                debug!(
                    "Extractor '{}' found {} reference entities",
                    extractor.name(),
                    entities.len()
                );
                return entities;
            }
        }
        Vec::new()
    }

    /// Attribute reasoning paths; at most five are returned
    pub fn attribute_paths(
        &self,
        answer: &str,
        causal_paths: &[Vec<Relationship>],
        context: &ParsedContext,
        sentences: &[AttributedSentence],
    ) -> Vec<AttributedPath> {
        let references = self.reference_entities(answer);
        if references.is_empty() {
            info!("No reference entities in answer; skipping path attribution");
            return Vec::new();
        }

        let candidates = candidate_relationships(causal_paths, context);
        let cited = cited_chunk_ids(sentences);

        let paths: Vec<AttributedPath> = candidates
            .into_iter()
            .filter_map(|rel| {
                let source = Endpoint::resolve(&rel.source_id, context);
                let target = Endpoint::resolve(&rel.target_id, context);
                let relevant = references.iter().any(|r| {
                    self.labels_match(&source.match_text, r)
                        || self.labels_match(&target.match_text, r)
                });
                relevant.then(|| self.build_path(rel, source, target, &cited, context))
            })
            .take(self.config.effective_max_paths())
            .collect();

        info!(
            "Attributed {} reasoning paths from {} reference entities",
            paths.len(),
            references.len()
        );
        paths
    }

    /// Case-insensitive substring match in either direction
    fn labels_match(&self, label: &str, reference: &str) -> bool {
        let label = label.trim().to_lowercase();
        let reference = reference.trim().to_lowercase();
        let min = self.config.min_match_len;
        if label.chars().count() < min || reference.chars().count() < min {
            return false;
        }
        label.contains(&reference) || reference.contains(&label)
    }

    fn build_path(
        &self,
        rel: &Relationship,
        source: Endpoint,
        target: Endpoint,
        cited: &[&str],
        context: &ParsedContext,
    ) -> AttributedPath {
        let needles = [source.match_text.to_lowercase(), target.match_text.to_lowercase()];
        let supporting: Vec<_> = cited
            .iter()
            .filter_map(|id| context.chunk(id))
            .filter(|chunk| {
                let content = chunk.content.to_lowercase();
                needles.iter().any(|n| !n.is_empty() && content.contains(n.as_str()))
            })
            .collect();

        let confidence = supporting
            .iter()
            .map(|c| c.confidence())
            .reduce(f64::max)
            .or_else(|| rel.weight.filter(|w| *w > 0.0 && *w <= 1.0))
            .unwrap_or(self.config.default_step_confidence);

        AttributedPath {
            source_label: source.label,
            relation_label: rel.relation_label().to_string(),
            target_label: target.label,
            supporting_chunk_ids: supporting.iter().map(|c| c.reference_id.clone()).collect(),
            confidence,
        }
    }
}

/// Flattened chains in order, or all context relationships; duplicates removed
fn candidate_relationships<'a>(
    causal_paths: &'a [Vec<Relationship>],
    context: &'a ParsedContext,
) -> Vec<&'a Relationship> {
    let all: Vec<&Relationship> = if causal_paths.iter().all(|chain| chain.is_empty()) {
        context.relationships.iter().collect()
    } else {
        causal_paths.iter().flatten().collect()
    };

    let mut unique: Vec<&Relationship> = Vec::with_capacity(all.len());
    for rel in all {
        if !unique.iter().any(|seen| seen.same_edge(rel)) {
            unique.push(rel);
        }
    }
    unique
}

/// Chunk ids cited by any sentence, in order of first citation
fn cited_chunk_ids(sentences: &[AttributedSentence]) -> Vec<&str> {
    let mut seen = HashSet::new();
    sentences
        .iter()
        .flat_map(|s| s.matched_chunk_ids.iter().map(String::as_str))
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_domain::{Chunk, Entity, Provenance, SourceDetails, SourceType};

    fn context() -> ParsedContext {
        ParsedContext {
            entities: vec![
                Entity::new("1", "Apple Inc", "ORGANIZATION"),
                Entity::new("2", "iPhone", "PRODUCT"),
                Entity::new("3", "Foxconn", "ORGANIZATION"),
            ],
            relationships: vec![
                Relationship::new("1", "2", "OFFERS"),
                Relationship::new("3", "2", "ASSEMBLES").with_weight(0.8),
                Relationship::new("9", "3", "SUPPLIES"),
            ],
            chunks: vec![Chunk::new(
                "c1",
                "Apple Inc sells the iPhone worldwide.",
                Provenance::inline_marker(SourceDetails::labelled(SourceType::Filing, "10-K")),
            )],
        }
    }

    fn cited(ids: &[&str]) -> Vec<AttributedSentence> {
        let mut sentence = AttributedSentence::unattributed("s", 0.3);
        sentence.matched_chunk_ids = ids.iter().map(|s| s.to_string()).collect();
        vec![sentence]
    }

    #[test]
    fn test_paths_filtered_by_reference_entities() {
        let answer = "Apple relies on partners.\n\n### References\n- [KG] Apple Inc\n";
        let paths =
            PathAttributor::default().attribute_paths(answer, &[], &context(), &cited(&["c1"]));

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].render(), "Apple Inc -[OFFERS]-> iPhone");
        assert_eq!(paths[0].supporting_chunk_ids, vec!["c1".to_string()]);
        assert_eq!(paths[0].confidence, 0.90);
    }

    #[test]
    fn test_step_confidence_falls_back_to_weight_then_default() {
        let answer = "### References\n- [KG] Foxconn";
        let paths = PathAttributor::default().attribute_paths(answer, &[], &context(), &[]);

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].render(), "Foxconn -[ASSEMBLES]-> iPhone");
        assert_eq!(paths[0].confidence, 0.8);
        assert_eq!(paths[1].render(), "Unknown(9) -[SUPPLIES]-> Foxconn");
        assert_eq!(paths[1].confidence, 0.5);
    }

    #[test]
    fn test_causal_chains_take_precedence_and_dedupe() {
        let chain = vec![
            Relationship::new("1", "2", "OFFERS"),
            Relationship::new("1", "2", "OFFERS"),
        ];
        let answer = "### References\n- [KG] iPhone";
        let paths = PathAttributor::default().attribute_paths(answer, &[chain], &context(), &[]);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_short_references_do_not_match() {
        let answer = "### References\n- [KG] Ap";
        assert!(PathAttributor::default()
            .attribute_paths(answer, &[], &context(), &[])
            .is_empty());
    }

    #[test]
    fn test_endpoint_resolved_by_label() {
        let mut context = context();
        context.relationships = vec![Relationship::new("Apple Inc", "Foxconn", "CONTRACTS")];
        let answer = "### References\n- [KG] Foxconn";
        let paths = PathAttributor::default().attribute_paths(answer, &[], &context, &[]);
        assert_eq!(paths[0].render(), "Apple Inc -[CONTRACTS]-> Foxconn");
    }

    #[test]
    fn test_capitalized_fallback_when_no_references_section() {
        let paths = PathAttributor::default().attribute_paths(
            "Foxconn assembles most units.",
            &[],
            &context(),
            &[],
        );
        assert_eq!(paths.len(), 2);
    }

    struct FixedExtractor(&'static str);

    impl ReferenceExtractor for FixedExtractor {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _answer: &str) -> Vec<String> {
            vec![self.0.to_string()]
        }
    }

    #[test]
    fn test_custom_extractor_replaces_defaults() {
        let attributor =
            PathAttributor::default().with_extractors(vec![Box::new(FixedExtractor("iPhone"))]);
        assert_eq!(attributor.reference_entities("Foxconn assembles units."), vec!["iPhone"]);

        let paths = attributor.attribute_paths("Foxconn assembles units.", &[], &context(), &[]);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.render().ends_with("-> iPhone")));
    }
}
