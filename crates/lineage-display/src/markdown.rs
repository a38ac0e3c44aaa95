//! Markdown rendering of the display payload

use crate::cards::{
    ConflictsCard, ReasoningCard, ReliabilityCard, SourcesCard, StructuredDisplay, TemporalCard,
};
use lineage_attribution::AttributionStatistics;
use std::fmt::Write;
use tabled::{builder::Builder, settings::Style};

impl StructuredDisplay {
    /// Render every present card as Markdown
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str("## Answer\n\n");
        if self.answer.text.is_empty() {
            out.push_str("_No answer text._\n");
        } else {
            let _ = writeln!(out, "{}", self.answer.text);
        }

        render_reliability(&mut out, &self.reliability);
        render_sources(&mut out, &self.sources);
        if let Some(temporal) = &self.temporal {
            render_temporal(&mut out, temporal);
        }
        if let Some(conflicts) = &self.conflicts {
            render_conflicts(&mut out, conflicts);
        }
        if let Some(reasoning) = &self.reasoning {
            render_reasoning(&mut out, reasoning);
        }
        if let Some(statistics) = &self.statistics {
            render_statistics(&mut out, statistics);
        }

        out
    }
}

fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

fn citation_markers(citations: &[usize]) -> String {
    citations.iter().map(|n| format!("[{}]", n)).collect()
}

fn render_reliability(out: &mut String, card: &ReliabilityCard) {
    out.push_str("\n## Reliability\n\n");
    match (card.confidence, card.level, card.confidence_type) {
        (Some(confidence), Some(level), Some(confidence_type)) => {
            let _ = writeln!(
                out,
                "**Confidence:** {} ({}, {}{})\n",
                percent(confidence),
                level,
                confidence_type.as_str(),
                if card.fallback { ", fallback" } else { "" }
            );
        }
        _ => out.push_str("**Confidence:** n/a\n\n"),
    }
    let _ = writeln!(out, "{}", card.explanation);

    if !card.breakdown.is_empty() {
        out.push('\n');
        for entry in &card.breakdown {
            let source_type = entry.source_type.map(|t| t.as_str()).unwrap_or("step");
            match entry.weight {
                Some(weight) => {
                    let _ = writeln!(
                        out,
                        "- {} ({}): {:.2}, weight {:.2}",
                        entry.reference, source_type, entry.confidence, weight
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "- {} ({}): {:.2}",
                        entry.reference, source_type, entry.confidence
                    );
                }
            }
        }
    }
}

fn render_sources(out: &mut String, card: &SourcesCard) {
    out.push_str("\n## Sources\n\n");
    if card.groups.is_empty() {
        out.push_str("_No sources were retrieved._\n");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["#", "Source", "Type", "Badge", "Confidence", "Tier", "Age"]);
    for group in &card.groups {
        for entry in &group.entries {
            let citation = entry.citation.map(|n| format!("[{}]", n)).unwrap_or_default();
            let age = match (&entry.date, &entry.age) {
                (Some(date), Some(age)) => format!("{} ({})", date, age),
                _ => "undated".to_string(),
            };
            builder.push_record([
                citation,
                entry.label.clone(),
                group.source_type.to_string(),
                group.badge.as_str().to_string(),
                format!("{:.2}", entry.confidence),
                entry.tier.as_str().to_string(),
                age,
            ]);
        }
    }

    let mut table = builder.build();
    table.with(Style::markdown());
    let _ = writeln!(out, "{}", table);
}

fn render_temporal(out: &mut String, card: &TemporalCard) {
    out.push_str("\n## Temporal Context\n\n");
    let _ = writeln!(out, "- Intent: {}", card.intent.as_str());
    match (card.oldest, card.newest) {
        (Some(oldest), Some(newest)) => {
            let _ = writeln!(out, "- Evidence dated {} to {}", oldest, newest);
        }
        _ => out.push_str("- No dated evidence\n"),
    }
    if let Some(spread) = card.spread_days {
        let _ = writeln!(out, "- Spread: {} days", spread);
    }
    if card.undated_sources > 0 {
        let _ = writeln!(out, "- Undated sources: {}", card.undated_sources);
    }
    if let Some(note) = &card.note {
        let _ = writeln!(out, "\n> {}", note);
    }
}

fn render_conflicts(out: &mut String, card: &ConflictsCard) {
    out.push_str("\n## Conflicts\n\n");
    let _ = writeln!(
        out,
        "Sources disagree on **{}** ({}); divergence {}, coefficient of variation {:.3}.\n",
        card.subject,
        card.unit.as_str(),
        percent(card.divergence),
        card.coefficient_of_variation
    );
    for entry in &card.values {
        let marker = entry.citation.map(|n| format!(" [{}]", n)).unwrap_or_default();
        let _ = writeln!(
            out,
            "- {}{}: {} (confidence {:.2})",
            entry.label, marker, entry.value.raw, entry.value.confidence
        );
    }
}

fn render_reasoning(out: &mut String, card: &ReasoningCard) {
    out.push_str("\n## Reasoning Path\n\n");
    for step in &card.steps {
        let markers = citation_markers(&step.citations);
        let _ = writeln!(
            out,
            "{}. {} ({:.2}){}",
            step.step,
            step.rendered,
            step.confidence,
            if markers.is_empty() { String::new() } else { format!(" {}", markers) }
        );
    }
    let _ = writeln!(out, "\nChain confidence: {:.2}", card.chain_confidence);
}

fn render_statistics(out: &mut String, stats: &AttributionStatistics) {
    out.push_str("\n## Attribution Statistics\n\n");
    let _ = writeln!(
        out,
        "{}/{} sentences attributed ({:.1}%), average confidence {:.2}",
        stats.attributed_sentences,
        stats.total_sentences,
        stats.coverage_percentage,
        stats.average_confidence
    );
    if !stats.source_type_distribution.is_empty() {
        let distribution = stats
            .source_type_distribution
            .iter()
            .map(|(source_type, count)| format!("{} {}", source_type, count))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Matched chunks by type: {}", distribution);
    }
}

#[cfg(test)]
mod tests {
    use crate::cards::*;
    use crate::formatter::DisplayFormatter;
    use chrono::NaiveDate;
    use lineage_domain::{AttributedPath, AttributedSentence, QueryClassification};

    fn display_with_path() -> StructuredDisplay {
        let path = AttributedPath {
            source_label: "Apple Inc".to_string(),
            relation_label: "OFFERS".to_string(),
            target_label: "iPhone".to_string(),
            supporting_chunk_ids: Vec::new(),
            confidence: 0.5,
        };
        DisplayFormatter::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap())
            .format(
                &[AttributedSentence::unattributed("Apple sells phones.", 0.3)],
                &[path],
                None,
                &[],
                &QueryClassification::default(),
            )
    }

    #[test]
    fn test_markdown_sections() {
        let markdown = display_with_path().to_markdown();
        assert!(markdown.starts_with("## Answer\n\nApple sells phones."));
        assert!(markdown.contains("## Reliability"));
        assert!(markdown.contains("**Confidence:** n/a"));
        assert!(markdown.contains("_No sources were retrieved._"));
        assert!(markdown.contains("1. Apple Inc -[OFFERS]-> iPhone (0.50)"));
        assert!(markdown.contains("0/1 sentences attributed (0.0%)"));
        assert!(!markdown.contains("## Temporal Context"));
        assert!(!markdown.contains("## Conflicts"));
    }
}
