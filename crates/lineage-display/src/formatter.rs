//! The Display Formatter

use crate::cards::{
    AnswerCard, ConflictEntry, ConflictsCard, DisplaySentence, QualityBadge, ReasoningCard,
    ReasoningStep, ReliabilityCard, ReliabilityLevel, SourceEntry, SourceGroup, SourcesCard,
    StructuredDisplay, TemporalCard,
};
use crate::config::DisplayConfig;
use chrono::{NaiveDate, Utc};
use lineage_attribution::get_attribution_statistics;
use lineage_confidence::ConfidenceResult;
use lineage_domain::{
    AttributedPath, AttributedSentence, Chunk, ConfidenceType, QueryClassification, SourceType,
    TemporalIntent,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Explanation shown when no confidence was computed
pub const CONFIDENCE_NOT_AVAILABLE: &str = "Confidence not available for this answer";

/// Builds the tiered display payload
#[derive(Debug, Clone)]
pub struct DisplayFormatter {
    config: DisplayConfig,
    reference_date: NaiveDate,
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}

impl DisplayFormatter {
    /// Create a formatter computing ages against today's UTC date
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            reference_date: Utc::now().date_naive(),
        }
    }

    /// Compute ages against a fixed date
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    /// Get the formatter configuration
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Build the display payload; missing pieces degrade, nothing fails
    pub fn format(
        &self,
        sentences: &[AttributedSentence],
        paths: &[AttributedPath],
        confidence: Option<&ConfidenceResult>,
        chunks: &[Chunk],
        classification: &QueryClassification,
    ) -> StructuredDisplay {
        let mut index = SourceIndex::build(chunks);
        index.number_citations(sentences);

        let answer = self.answer_card(sentences, &index);
        let reliability = self.reliability_card(confidence);
        let temporal = classification
            .temporal_intent
            .is_time_sensitive()
            .then(|| self.temporal_card(classification.temporal_intent, &index));
        let conflicts = confidence.and_then(|result| conflicts_card(result, &index));
        let reasoning = (!paths.is_empty()).then(|| reasoning_card(paths, &index));
        let statistics = self
            .config
            .include_statistics
            .then(|| get_attribution_statistics(sentences));
        let sources = self.sources_card(&index);

        info!(
            "Formatted display: {} sentences, {} sources{}{}{}",
            answer.sentences.len(),
            sources.total,
            if temporal.is_some() { ", temporal" } else { "" },
            if conflicts.is_some() { ", conflicts" } else { "" },
            if reasoning.is_some() { ", reasoning" } else { "" }
        );

        StructuredDisplay {
            answer,
            reliability,
            sources,
            temporal,
            conflicts,
            reasoning,
            statistics,
        }
    }

    /// Qualitative level for a confidence
    pub fn level(&self, confidence: f64) -> ReliabilityLevel {
        if confidence >= self.config.high_threshold {
            ReliabilityLevel::High
        } else if confidence >= self.config.medium_threshold {
            ReliabilityLevel::Medium
        } else {
            ReliabilityLevel::Low
        }
    }

    fn answer_card(&self, sentences: &[AttributedSentence], index: &SourceIndex<'_>) -> AnswerCard {
        let sentences: Vec<DisplaySentence> = sentences
            .iter()
            .map(|sentence| {
                let citations = index.citations_for(&sentence.matched_chunk_ids);
                DisplaySentence {
                    rendered: render_with_citations(&sentence.text, &citations),
                    text: sentence.text.clone(),
                    citations,
                    confidence: sentence.confidence,
                }
            })
            .collect();

        let text = sentences
            .iter()
            .map(|s| s.rendered.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        AnswerCard { sentences, text }
    }

    fn reliability_card(&self, confidence: Option<&ConfidenceResult>) -> ReliabilityCard {
        match confidence {
            Some(result) => ReliabilityCard {
                confidence: Some(result.confidence),
                level: Some(self.level(result.confidence)),
                confidence_type: Some(result.confidence_type),
                explanation: result.explanation.clone(),
                breakdown: result.breakdown.clone(),
                fallback: result.fallback,
            },
            None => ReliabilityCard {
                confidence: None,
                level: None,
                confidence_type: None,
                explanation: CONFIDENCE_NOT_AVAILABLE.to_string(),
                breakdown: Vec::new(),
                fallback: false,
            },
        }
    }

    fn sources_card(&self, index: &SourceIndex<'_>) -> SourcesCard {
        let mut groups: Vec<SourceGroup> = Vec::new();
        for source in &index.sources {
            let entry = self.source_entry(source);
            match groups.iter().position(|g| g.source_type == source.source_type) {
                Some(idx) => groups[idx].entries.push(entry),
                None => groups.push(SourceGroup {
                    source_type: source.source_type,
                    badge: entry.badge,
                    entries: vec![entry],
                }),
            }
        }

        groups.sort_by_key(|g| (g.badge, type_rank(g.source_type)));
        for group in &mut groups {
            // Cited entries in citation order, then uncited in context order
            group.entries.sort_by_key(|e| e.citation.unwrap_or(usize::MAX));
        }

        SourcesCard {
            total: index.sources.len(),
            groups,
        }
    }

    fn source_entry(&self, source: &IndexedSource<'_>) -> SourceEntry {
        let age_days = source.date.map(|d| (self.reference_date - d).num_days());
        SourceEntry {
            citation: source.citation,
            label: source.label.to_string(),
            reference_ids: source.chunks.iter().map(|c| c.reference_id.clone()).collect(),
            confidence: source.confidence,
            tier: source.tier,
            badge: QualityBadge::for_source_type(source.source_type),
            date: source.date,
            age: age_days.map(describe_age),
            age_days,
        }
    }

    fn temporal_card(&self, intent: TemporalIntent, index: &SourceIndex<'_>) -> TemporalCard {
        let cited: Vec<&IndexedSource<'_>> =
            index.sources.iter().filter(|s| s.citation.is_some()).collect();
        let evidence: Vec<&IndexedSource<'_>> = if cited.is_empty() {
            index.sources.iter().collect()
        } else {
            cited
        };

        let dates: Vec<NaiveDate> = evidence.iter().filter_map(|s| s.date).collect();
        let oldest = dates.iter().min().copied();
        let newest = dates.iter().max().copied();
        let spread_days = oldest.zip(newest).map(|(o, n)| (n - o).num_days());

        let note = match newest {
            None if !evidence.is_empty() => {
                Some("No dated evidence; recency cannot be assessed".to_string())
            }
            Some(newest) if intent == TemporalIntent::Current => {
                let age = (self.reference_date - newest).num_days();
                (age > self.config.stale_after_days).then(|| {
                    format!(
                        "Newest evidence is {} days old; the answer may not reflect current \
                         conditions",
                        age
                    )
                })
            }
            _ => None,
        };

        TemporalCard {
            intent,
            oldest,
            newest,
            spread_days,
            undated_sources: evidence.len() - dates.len(),
            note,
        }
    }
}

fn conflicts_card(result: &ConfidenceResult, index: &SourceIndex<'_>) -> Option<ConflictsCard> {
    if result.confidence_type != ConfidenceType::ConflictPenalized {
        return None;
    }
    let report = result.conflict.as_ref()?;

    let values = report
        .values
        .iter()
        .map(|value| {
            let source = index.source_for(&value.reference_id);
            ConflictEntry {
                value: value.clone(),
                label: source
                    .map(|s| s.label.to_string())
                    .unwrap_or_else(|| format!("Chunk {}", value.reference_id)),
                citation: source.and_then(|s| s.citation),
            }
        })
        .collect();

    Some(ConflictsCard {
        subject: report.subject.clone(),
        unit: report.unit,
        values,
        divergence: report.divergence,
        coefficient_of_variation: report.coefficient_of_variation,
    })
}

fn reasoning_card(paths: &[AttributedPath], index: &SourceIndex<'_>) -> ReasoningCard {
    let steps = paths
        .iter()
        .enumerate()
        .map(|(i, path)| ReasoningStep {
            step: i + 1,
            rendered: path.render(),
            confidence: path.confidence,
            citations: index.citations_for(&path.supporting_chunk_ids),
        })
        .collect();

    ReasoningCard {
        steps,
        chain_confidence: paths.iter().map(|p| p.confidence).product(),
    }
}

/// Position of a source type in display order
fn type_rank(source_type: SourceType) -> usize {
    SourceType::ALL
        .iter()
        .position(|t| *t == source_type)
        .unwrap_or(SourceType::ALL.len())
}

/// Insert `[n]` markers before the sentence's closing punctuation
fn render_with_citations(text: &str, citations: &[usize]) -> String {
    if citations.is_empty() {
        return text.to_string();
    }
    let markers: String = citations.iter().map(|n| format!("[{}]", n)).collect();
    match text.char_indices().last() {
        Some((idx, c)) if matches!(c, '.' | '!' | '?') => {
            format!("{} {}{}", text[..idx].trim_end(), markers, c)
        }
        _ => format!("{} {}", text, markers),
    }
}

/// Human-readable age of evidence
pub(crate) fn describe_age(days: i64) -> String {
    match days {
        d if d < 0 => "dated in the future".to_string(),
        0 => "from today".to_string(),
        1 => "1 day old".to_string(),
        d if d < 60 => format!("{} days old", d),
        d if d < 730 => format!("{} months old", d / 30),
        d => format!("{} years old", d / 365),
    }
}

/// A deduplicated source: chunks sharing a source type and label
struct IndexedSource<'a> {
    source_type: SourceType,
    label: &'a str,
    chunks: Vec<&'a Chunk>,
    confidence: f64,
    tier: lineage_domain::ProvenanceTier,
    date: Option<NaiveDate>,
    citation: Option<usize>,
}

/// Sources and the chunk-to-source lookup
struct SourceIndex<'a> {
    sources: Vec<IndexedSource<'a>>,
    by_chunk: HashMap<&'a str, usize>,
}

impl<'a> SourceIndex<'a> {
    fn build(chunks: &'a [Chunk]) -> Self {
        let mut sources: Vec<IndexedSource<'a>> = Vec::new();
        let mut by_key: HashMap<(SourceType, String), usize> = HashMap::new();
        let mut by_chunk = HashMap::new();

        for chunk in chunks {
            if by_chunk.contains_key(chunk.reference_id.as_str()) {
                debug!("Duplicate chunk reference {} ignored", chunk.reference_id);
                continue;
            }
            let key = (chunk.source_type(), chunk.label().trim().to_lowercase());
            let idx = *by_key.entry(key).or_insert_with(|| {
                sources.push(IndexedSource {
                    source_type: chunk.source_type(),
                    label: chunk.label(),
                    chunks: Vec::new(),
                    confidence: chunk.confidence(),
                    tier: chunk.provenance.tier,
                    date: chunk.date,
                    citation: None,
                });
                sources.len() - 1
            });

            let source = &mut sources[idx];
            source.confidence = source.confidence.max(chunk.confidence());
            source.tier = source.tier.min(chunk.provenance.tier);
            source.date = source.date.max(chunk.date);
            source.chunks.push(chunk);
            by_chunk.insert(chunk.reference_id.as_str(), idx);
        }

        Self { sources, by_chunk }
    }

    /// Number sources by first citation across sentences
    fn number_citations(&mut self, sentences: &[AttributedSentence]) {
        let mut next = 1;
        for id in sentences.iter().flat_map(|s| s.matched_chunk_ids.iter()) {
            let Some(&idx) = self.by_chunk.get(id.as_str()) else {
                debug!("Cited chunk {} is not in the chunk table; no citation shown", id);
                continue;
            };
            if self.sources[idx].citation.is_none() {
                self.sources[idx].citation = Some(next);
                next += 1;
            }
        }
    }

    fn source_for(&self, reference_id: &str) -> Option<&IndexedSource<'a>> {
        self.by_chunk.get(reference_id).map(|&idx| &self.sources[idx])
    }

    /// Distinct citation numbers for chunk ids, in first-seen order
    fn citations_for(&self, chunk_ids: &[String]) -> Vec<usize> {
        let mut citations = Vec::new();
        for id in chunk_ids {
            if let Some(n) = self.source_for(id).and_then(|s| s.citation) {
                if !citations.contains(&n) {
                    citations.push(n);
                }
            }
        }
        citations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_domain::{Provenance, ProvenanceTier, SourceDetails};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sentence(text: &str, ids: &[&str]) -> AttributedSentence {
        let mut sentence = AttributedSentence::unattributed(text, 0.3);
        sentence.matched_chunk_ids = ids.iter().map(|s| s.to_string()).collect();
        if !ids.is_empty() {
            sentence.confidence = 0.8;
        }
        sentence
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new(
                "e1",
                "mail",
                Provenance::inline_marker(SourceDetails::labelled(SourceType::Email, "Q2 Update")),
            )
            .with_date(date(2024, 7, 1)),
            Chunk::new(
                "f1",
                "filing",
                Provenance::inline_marker(SourceDetails::labelled(
                    SourceType::Filing,
                    "Apple 10-Q",
                )),
            )
            .with_date(date(2024, 8, 2)),
            Chunk::new(
                "f2",
                "filing again",
                Provenance::path_derived(SourceDetails::labelled(SourceType::Filing, "Apple 10-Q")),
            ),
            Chunk::new("u1", "unknown", Provenance::unknown("Chunk u1")),
        ]
    }

    fn formatter() -> DisplayFormatter {
        DisplayFormatter::default().with_reference_date(date(2024, 10, 1))
    }

    #[test]
    fn test_citations_numbered_by_first_use() {
        let sentences = vec![
            sentence("Revenue grew.", &["e1"]),
            sentence("Filings confirm it.", &["f2", "f1", "e1"]),
        ];
        let display =
            formatter().format(&sentences, &[], None, &chunks(), &QueryClassification::default());

        assert_eq!(display.answer.sentences[0].rendered, "Revenue grew [1].");
        assert_eq!(display.answer.sentences[1].citations, vec![2, 1]);
        assert_eq!(display.answer.text, "Revenue grew [1]. Filings confirm it [2][1].");
    }

    #[test]
    fn test_sources_deduplicated_and_grouped_by_badge() {
        let sentences = vec![sentence("Revenue grew.", &["e1", "f1"])];
        let display =
            formatter().format(&sentences, &[], None, &chunks(), &QueryClassification::default());

        let order: Vec<QualityBadge> = display.sources.groups.iter().map(|g| g.badge).collect();
        assert_eq!(
            order,
            vec![QualityBadge::Regulatory, QualityBadge::Informal, QualityBadge::Unverified]
        );
        assert_eq!(display.sources.total, 3);

        let filing = &display.sources.groups[0].entries[0];
        assert_eq!(filing.reference_ids, vec!["f1", "f2"]);
        assert_eq!(filing.tier, ProvenanceTier::InlineMarker);
        assert_eq!(filing.citation, Some(2));
        assert_eq!(filing.age_days, Some(60));
        assert_eq!(filing.age.as_deref(), Some("2 months old"));

        let unknown = &display.sources.groups[2].entries[0];
        assert_eq!(unknown.citation, None);
    }

    #[test]
    fn test_missing_chunk_gets_no_marker() {
        let sentences = vec![sentence("Revenue grew.", &["missing", "e1"])];
        let display =
            formatter().format(&sentences, &[], None, &chunks(), &QueryClassification::default());
        assert_eq!(display.answer.sentences[0].citations, vec![1]);
    }

    #[test]
    fn test_missing_confidence_degrades() {
        let display = formatter().format(&[], &[], None, &[], &QueryClassification::default());
        assert_eq!(display.reliability.confidence, None);
        assert_eq!(display.reliability.explanation, CONFIDENCE_NOT_AVAILABLE);
        assert!(display.temporal.is_none());
        assert!(display.conflicts.is_none());
        assert!(display.reasoning.is_none());
        assert_eq!(display.sources.total, 0);
    }

    #[test]
    fn test_temporal_card_for_current_intent() {
        let sentences = vec![sentence("Revenue grew.", &["e1"])];
        let classification = QueryClassification::new(TemporalIntent::Current, false);
        let display = formatter().format(&sentences, &[], None, &chunks(), &classification);

        let temporal = display.temporal.unwrap();
        assert_eq!(temporal.newest, Some(date(2024, 7, 1)));
        assert_eq!(temporal.spread_days, Some(0));
        assert!(temporal.note.unwrap().contains("92 days old"));
    }

    #[test]
    fn test_temporal_card_hidden_for_historical_intent() {
        let classification = QueryClassification::new(TemporalIntent::Historical, false);
        let display = formatter().format(&[], &[], None, &chunks(), &classification);
        assert!(display.temporal.is_none());
    }

    #[test]
    fn test_levels() {
        let formatter = formatter();
        assert_eq!(formatter.level(0.8), ReliabilityLevel::High);
        assert_eq!(formatter.level(0.5), ReliabilityLevel::Medium);
        assert_eq!(formatter.level(0.49), ReliabilityLevel::Low);
    }

    #[test]
    fn test_describe_age() {
        assert_eq!(describe_age(0), "from today");
        assert_eq!(describe_age(45), "45 days old");
        assert_eq!(describe_age(400), "13 months old");
        assert_eq!(describe_age(800), "2 years old");
        assert_eq!(describe_age(-3), "dated in the future");
    }

    #[test]
    fn test_render_without_terminal_punctuation() {
        assert_eq!(render_with_citations("Revenue grew", &[3]), "Revenue grew [3]");
        assert_eq!(render_with_citations("Revenue grew", &[]), "Revenue grew");
    }
}
