//! The Confidence Synthesizer

use crate::config::SynthesizerConfig;
use crate::evidence::{EvidencePattern, EvidenceSource, PatternKind};
use crate::numeric::ConflictReport;
use lineage_domain::{clamp_confidence, ConfidenceType, SourceType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const NO_EVIDENCE_EXPLANATION: &str = "No evidence was retrieved for this answer; confidence is 0";

/// One scored input to the aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    /// Chunk reference id, or the rendered reasoning step
    pub reference: String,
    /// Source type, for source entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Input confidence
    pub confidence: f64,
    /// Weight applied, when the formula weights its inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl BreakdownEntry {
    fn source(source: &EvidenceSource, weight: Option<f64>) -> Self {
        Self {
            reference: source.reference_id.clone(),
            source_type: Some(source.source_type),
            confidence: source.confidence,
            weight,
        }
    }
}

/// Aggregate confidence for one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// Aggregate confidence in [0, 1]
    pub confidence: f64,
    /// Formula that produced it
    pub confidence_type: ConfidenceType,
    /// Which formula applied and why
    pub explanation: String,
    /// Per-source or per-step inputs
    pub breakdown: Vec<BreakdownEntry>,
    /// The conflict that triggered the penalty, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictReport>,
    /// Whether the pattern could not be classified and a fallback scored it
    #[serde(default)]
    pub fallback: bool,
}

/// Confidence Synthesizer
#[derive(Debug, Clone, Default)]
pub struct ConfidenceSynthesizer {
    config: SynthesizerConfig,
}

impl ConfidenceSynthesizer {
    /// Create a synthesizer with the given configuration
    pub fn new(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    /// Get the synthesizer configuration
    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Weighted average over a subset of sources
    ///
    /// Used by the sentence attributor for sentences with several matches.
    /// Returns 0 for an empty subset.
    pub fn weighted_confidence<I>(&self, sources: I) -> f64
    where
        I: IntoIterator<Item = (SourceType, f64)>,
    {
        clamp_confidence(self.config.weights.weighted_average(sources).unwrap_or(0.0))
    }

    /// Score an evidence pattern
    pub fn synthesize(&self, pattern: &EvidencePattern) -> ConfidenceResult {
        let kind = pattern.classify(self.config.conflict_tolerance);
        let result = match kind {
            PatternKind::MultiHop => self.multi_hop(pattern),
            PatternKind::NoEvidence => ConfidenceResult {
                confidence: 0.0,
                confidence_type: ConfidenceType::NoEvidence,
                explanation: NO_EVIDENCE_EXPLANATION.to_string(),
                breakdown: Vec::new(),
                conflict: None,
                fallback: false,
            },
            PatternKind::Unclassifiable => self.fallback(pattern),
            PatternKind::SingleSource => self.single_source(&pattern.sources[0]),
            PatternKind::Conflicting(report) => self.conflict_penalized(pattern, report),
            PatternKind::Agreeing => self.weighted_average(pattern),
        };

        info!(
            "Confidence formula selected: {} ({:.3}, {} inputs{})",
            result.confidence_type.as_str(),
            result.confidence,
            result.breakdown.len(),
            if result.fallback { ", fallback" } else { "" }
        );
        result
    }

    fn multi_hop(&self, pattern: &EvidencePattern) -> ConfidenceResult {
        let confidence = pattern
            .steps
            .iter()
            .map(|step| clamp_confidence(step.confidence))
            .product::<f64>();

        ConfidenceResult {
            confidence: clamp_confidence(confidence),
            confidence_type: ConfidenceType::MultiHopDecay,
            explanation: format!(
                "Multi-hop reasoning over {} step(s): confidence decays as the product of \
                 step confidences",
                pattern.steps.len()
            ),
            breakdown: pattern
                .steps
                .iter()
                .map(|step| BreakdownEntry {
                    reference: step.label.clone(),
                    source_type: None,
                    confidence: step.confidence,
                    weight: None,
                })
                .collect(),
            conflict: None,
            fallback: false,
        }
    }

    fn single_source(&self, source: &EvidenceSource) -> ConfidenceResult {
        ConfidenceResult {
            confidence: clamp_confidence(source.confidence),
            confidence_type: ConfidenceType::SingleSource,
            explanation: format!(
                "Single {} source (chunk {}); its confidence is used as-is",
                source.source_type, source.reference_id
            ),
            breakdown: vec![BreakdownEntry::source(source, None)],
            conflict: None,
            fallback: false,
        }
    }

    fn fallback(&self, pattern: &EvidencePattern) -> ConfidenceResult {
        // First source wins ties, keeping the choice deterministic
        let strongest = pattern
            .sources
            .iter()
            .reduce(|best, s| if s.confidence > best.confidence { s } else { best });

        let Some(strongest) = strongest else {
            return ConfidenceResult {
                confidence: 0.0,
                confidence_type: ConfidenceType::NoEvidence,
                explanation: NO_EVIDENCE_EXPLANATION.to_string(),
                breakdown: Vec::new(),
                conflict: None,
                fallback: true,
            };
        };

        debug!(
            "Multi-hop query without reasoning steps; falling back to chunk {}",
            strongest.reference_id
        );
        let mut result = self.single_source(strongest);
        result.explanation = format!(
            "Multi-hop query but no reasoning path was available; fell back to the strongest \
             single source ({} chunk {})",
            strongest.source_type, strongest.reference_id
        );
        result.fallback = true;
        result
    }

    fn conflict_penalized(
        &self,
        pattern: &EvidencePattern,
        report: ConflictReport,
    ) -> ConfidenceResult {
        // One confidence per conflicting source, even if it contributed several values
        let mut conflicting: Vec<(&str, f64)> = Vec::new();
        for value in &report.values {
            if !conflicting.iter().any(|(id, _)| *id == value.reference_id) {
                conflicting.push((value.reference_id.as_str(), value.confidence));
            }
        }
        let source_count = conflicting.len();
        let mean = conflicting.iter().map(|(_, c)| c).sum::<f64>() / source_count.max(1) as f64;
        let penalty = report.coefficient_of_variation.min(1.0);
        let confidence = clamp_confidence(mean * (1.0 - penalty));

        let values = report
            .values
            .iter()
            .map(|v| format!("{} in chunk {}", v.raw, v.reference_id))
            .collect::<Vec<_>>()
            .join(" vs ");

        ConfidenceResult {
            confidence,
            confidence_type: ConfidenceType::ConflictPenalized,
            explanation: format!(
                "Sources disagree on '{}' ({}); mean confidence {:.2} of the {} conflicting \
                 sources penalised by coefficient of variation {:.3}",
                report.subject, values, mean, source_count, report.coefficient_of_variation
            ),
            breakdown: pattern
                .sources
                .iter()
                .map(|s| BreakdownEntry::source(s, None))
                .collect(),
            conflict: Some(report),
            fallback: false,
        }
    }

    fn weighted_average(&self, pattern: &EvidencePattern) -> ConfidenceResult {
        let weights = &self.config.weights;
        let confidence = weights
            .weighted_average(pattern.sources.iter().map(|s| (s.source_type, s.confidence)))
            .unwrap_or(0.0);

        ConfidenceResult {
            confidence: clamp_confidence(confidence),
            confidence_type: ConfidenceType::WeightedAverage,
            explanation: format!(
                "{} agreeing sources combined by source-quality weighted average",
                pattern.sources.len()
            ),
            breakdown: pattern
                .sources
                .iter()
                .map(|s| BreakdownEntry::source(s, Some(weights.weight(s.source_type))))
                .collect(),
            conflict: None,
            fallback: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::PathStep;

    fn synthesize(
        sources: Vec<EvidenceSource>,
        steps: Vec<PathStep>,
        multi_hop: bool,
    ) -> ConfidenceResult {
        let pattern = EvidencePattern::new(sources, steps, multi_hop);
        ConfidenceSynthesizer::default().synthesize(&pattern)
    }

    fn step(confidence: f64) -> PathStep {
        PathStep {
            label: "Apple -[OFFERS]-> iPhone".to_string(),
            confidence,
        }
    }

    #[test]
    fn test_single_filing_keeps_raw_confidence() {
        let result = synthesize(
            vec![EvidenceSource::new("1", SourceType::Filing, 0.95, "Net sales were $85.8B.")],
            vec![],
            false,
        );
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.confidence_type, ConfidenceType::SingleSource);
        assert!(!result.fallback);
    }

    #[test]
    fn test_conflicting_margins_penalised() {
        let result = synthesize(
            vec![
                EvidenceSource::new("1", SourceType::Filing, 0.9, "Gross margin was 62% in Q2."),
                EvidenceSource::new("2", SourceType::Api, 0.8, "Gross margin: 58% for Q2."),
            ],
            vec![],
            false,
        );
        assert_eq!(result.confidence_type, ConfidenceType::ConflictPenalized);
        assert!(result.confidence < 0.85);
        let expected = 0.85 * (1.0 - 2.0 / 60.0);
        assert!((result.confidence - expected).abs() < 1e-9);
        assert!(result.conflict.is_some());
        assert!(result.explanation.contains("62%"));
    }

    #[test]
    fn test_conflict_mean_uses_only_conflicting_sources() {
        let result = synthesize(
            vec![
                EvidenceSource::new("1", SourceType::Filing, 0.9, "Gross margin was 62% in Q2."),
                EvidenceSource::new("2", SourceType::Api, 0.8, "Gross margin: 58% for Q2."),
                EvidenceSource::new("3", SourceType::Email, 0.6, "Hiring slowed across teams."),
            ],
            vec![],
            false,
        );
        assert_eq!(result.confidence_type, ConfidenceType::ConflictPenalized);
        let expected = 0.85 * (1.0 - 2.0 / 60.0);
        assert!((result.confidence - expected).abs() < 1e-9);
        assert!(result.explanation.contains("of the 2 conflicting sources"));
    }

    #[test]
    fn test_weighted_average_of_agreeing_sources() {
        let result = synthesize(
            vec![
                EvidenceSource::new("1", SourceType::Filing, 0.9, "Revenue grew."),
                EvidenceSource::new("2", SourceType::Email, 0.6, "Revenue grew strongly."),
            ],
            vec![],
            false,
        );
        assert_eq!(result.confidence_type, ConfidenceType::WeightedAverage);
        assert!((result.confidence - 0.7875).abs() < 1e-12);
        assert_eq!(result.breakdown[1].weight, Some(0.6));
    }

    #[test]
    fn test_multi_hop_decay() {
        let result = synthesize(
            vec![EvidenceSource::new("1", SourceType::Filing, 0.9, "x")],
            vec![step(0.9), step(0.8), step(0.5)],
            true,
        );
        assert_eq!(result.confidence_type, ConfidenceType::MultiHopDecay);
        assert!((result.confidence - 0.36).abs() < 1e-12);
        assert_eq!(result.breakdown.len(), 3);
    }

    #[test]
    fn test_multi_hop_without_steps_falls_back() {
        let result = synthesize(
            vec![
                EvidenceSource::new("1", SourceType::Email, 0.7, "x"),
                EvidenceSource::new("2", SourceType::Filing, 0.9, "y"),
                EvidenceSource::new("3", SourceType::Api, 0.9, "z"),
            ],
            vec![],
            true,
        );
        assert!(result.fallback);
        assert_eq!(result.confidence_type, ConfidenceType::SingleSource);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.breakdown[0].reference, "2");
        assert!(result.explanation.contains("fell back"));
    }

    #[test]
    fn test_no_evidence() {
        let result = synthesize(vec![], vec![], false);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.confidence_type, ConfidenceType::NoEvidence);
        assert!(result.explanation.starts_with("No evidence"));
    }

    #[test]
    fn test_weighted_confidence_subset() {
        let synthesizer = ConfidenceSynthesizer::default();
        let value =
            synthesizer.weighted_confidence([(SourceType::Api, 0.85), (SourceType::Api, 0.7)]);
        assert!((value - 0.775).abs() < 1e-12);
    }
}
