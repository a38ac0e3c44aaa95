//! Sentence-level attribution by lexical overlap

use crate::config::SentenceAttributorConfig;
use crate::text::{
    prose_units, split_answer, split_sentences, strip_citation_markers, strip_markdown, tokenize,
    word_set,
};
use lineage_confidence::SourceWeights;
use lineage_domain::{clamp_confidence, AttributedSentence, ParsedContext, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Maps each answer sentence to the chunks that support it
#[derive(Debug, Clone)]
pub struct SentenceAttributor {
    config: SentenceAttributorConfig,
    weights: SourceWeights,
    stop_words: HashSet<String>,
    abbreviations: HashSet<String>,
}

impl Default for SentenceAttributor {
    fn default() -> Self {
        Self::new(SentenceAttributorConfig::default(), SourceWeights::default())
    }
}

impl SentenceAttributor {
    /// Create an attributor; `weights` score sentences with several matches
    pub fn new(config: SentenceAttributorConfig, weights: SourceWeights) -> Self {
        let stop_words = word_set(&config.stop_words);
        let abbreviations = word_set(&config.abbreviations);
        Self {
            config,
            weights,
            stop_words,
            abbreviations,
        }
    }

    /// Get the attributor configuration
    pub fn config(&self) -> &SentenceAttributorConfig {
        &self.config
    }

    /// Split the answer body (References section excluded) into sentences
    ///
    /// Hard-wrapped prose lines are rejoined first; list items and headings
    /// stay separate units.
    pub fn sentences(&self, answer: &str) -> Vec<String> {
        prose_units(&split_answer(answer).body)
            .into_iter()
            .map(|unit| strip_citation_markers(&strip_markdown(&unit)))
            .filter(|line| !line.is_empty())
            .flat_map(|line| split_sentences(&line, &self.abbreviations))
            .collect()
    }

    /// Attribute every sentence of the answer
    pub fn attribute(&self, answer: &str, context: &ParsedContext) -> Vec<AttributedSentence> {
        let chunk_tokens: Vec<BTreeSet<String>> = context
            .chunks
            .iter()
            .map(|chunk| tokenize(&chunk.content, &self.stop_words))
            .collect();

        let sentences: Vec<AttributedSentence> = self
            .sentences(answer)
            .into_iter()
            .map(|text| self.attribute_sentence(text, context, &chunk_tokens))
            .collect();

        info!(
            "Attributed {}/{} sentences against {} chunks",
            sentences.iter().filter(|s| s.is_attributed()).count(),
            sentences.len(),
            context.chunks.len()
        );
        sentences
    }

    fn attribute_sentence(
        &self,
        text: String,
        context: &ParsedContext,
        chunk_tokens: &[BTreeSet<String>],
    ) -> AttributedSentence {
        let tokens = tokenize(&text, &self.stop_words);
        if tokens.is_empty() {
            return AttributedSentence::unattributed(text, self.config.floor_confidence);
        }

        let mut matches: Vec<(usize, f64)> = chunk_tokens
            .iter()
            .enumerate()
            .filter_map(|(idx, chunk)| {
                let shared = tokens.intersection(chunk).count();
                let score = shared as f64 / tokens.len() as f64;
                (shared >= self.config.min_shared_tokens && score >= self.config.min_overlap)
                    .then_some((idx, score))
            })
            .collect();

        // Stable sort keeps chunk order among equal scores
        matches.sort_by(|a, b| b.1.total_cmp(&a.1));
        matches.truncate(self.config.max_chunks_per_sentence);

        if matches.is_empty() {
            debug!("No supporting chunk for sentence '{}'", text);
            return AttributedSentence::unattributed(text, self.config.floor_confidence);
        }

        let matched: Vec<_> = matches.iter().map(|(idx, _)| &context.chunks[*idx]).collect();
        let confidence = match matched.as_slice() {
            [only] => only.confidence(),
            several => self
                .weights
                .weighted_average(several.iter().map(|c| (c.source_type(), c.confidence())))
                .unwrap_or(self.config.floor_confidence),
        };

        let mut source_type_counts = BTreeMap::new();
        for chunk in &matched {
            *source_type_counts.entry(chunk.source_type()).or_insert(0) += 1;
        }

        AttributedSentence {
            text,
            matched_chunk_ids: matched.iter().map(|c| c.reference_id.clone()).collect(),
            confidence: clamp_confidence(confidence),
            source_type_counts,
        }
    }
}

/// Coverage summary of a sentence attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionStatistics {
    /// Number of sentences
    pub total_sentences: usize,
    /// Sentences with at least one supporting chunk
    pub attributed_sentences: usize,
    /// `attributed / total × 100`, 0 without sentences
    pub coverage_percentage: f64,
    /// Mean sentence confidence, 0 without sentences
    pub average_confidence: f64,
    /// Matched chunks per source type, summed over sentences
    pub source_type_distribution: BTreeMap<SourceType, usize>,
}

/// Summarise a sentence attribution
pub fn get_attribution_statistics(sentences: &[AttributedSentence]) -> AttributionStatistics {
    let total = sentences.len();
    let attributed = sentences.iter().filter(|s| s.is_attributed()).count();

    let (coverage_percentage, average_confidence) = if total == 0 {
        (0.0, 0.0)
    } else {
        (
            attributed as f64 / total as f64 * 100.0,
            sentences.iter().map(|s| s.confidence).sum::<f64>() / total as f64,
        )
    };

    let mut source_type_distribution = BTreeMap::new();
    for sentence in sentences {
        for (source_type, count) in &sentence.source_type_counts {
            *source_type_distribution.entry(*source_type).or_insert(0) += count;
        }
    }

    AttributionStatistics {
        total_sentences: total,
        attributed_sentences: attributed,
        coverage_percentage,
        average_confidence,
        source_type_distribution,
    }
}
