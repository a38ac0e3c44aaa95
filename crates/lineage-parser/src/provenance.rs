//! Provenance resolution strategies
//!
//! Each tier is a [`ProvenanceStrategy`]. The [`ProvenanceResolver`] runs its
//! strategies in order, accepts the first result that honours the label
//! contract, and otherwise falls back to the unknown default. Supporting a new
//! marker format means adding a strategy, not editing the resolver.

use crate::dates::parse_date_str;
use chrono::NaiveDate;
use lineage_domain::{Provenance, SourceDetails, SourceType};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static INLINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*(EMAIL|MAIL|API|FILING|DOCUMENT|DOC)\s*\|([^\]]*)\]")
        .unwrap_or_else(|e| panic!("inline marker pattern is invalid: {}", e))
});

/// File extensions stripped when deriving a label from a path
const KNOWN_EXTENSIONS: &[&str] = &[
    ".eml", ".msg", ".pdf", ".txt", ".md", ".json", ".csv", ".html", ".htm", ".docx", ".xlsx",
];

/// A chunk record as decoded, before provenance is resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    /// Reference id used by citations
    pub reference_id: String,
    /// Passage text, possibly carrying an inline marker
    pub content: String,
    /// Path or identifier reported upstream
    pub file_path: Option<String>,
    /// Date from the record itself
    pub date: Option<NaiveDate>,
}

impl RawChunk {
    /// Create a raw chunk with no path or date
    pub fn new(reference_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            reference_id: reference_id.into(),
            content: content.into(),
            file_path: None,
            date: None,
        }
    }

    /// Attach a path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

/// Output of a strategy that recognised a chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Resolved provenance
    pub provenance: Provenance,
    /// Exact marker text found in the content, for stripping
    pub marker: Option<String>,
    /// Date carried by the marker, if it had one
    pub date: Option<NaiveDate>,
}

impl Resolution {
    fn from_provenance(provenance: Provenance) -> Self {
        Self {
            provenance,
            marker: None,
            date: None,
        }
    }
}

/// One provenance tier
pub trait ProvenanceStrategy: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Try to resolve the chunk; `None` passes it to the next tier
    fn resolve(&self, chunk: &RawChunk) -> Option<Resolution>;
}

/// Tier 1: bracketed inline markers written by the ingestion pipeline
///
/// `[EMAIL | subject: Q2 Update | from: cfo@acme.com | date: 2024-07-01]`
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineMarkerStrategy;

impl ProvenanceStrategy for InlineMarkerStrategy {
    fn name(&self) -> &'static str {
        "inline_marker"
    }

    fn resolve(&self, chunk: &RawChunk) -> Option<Resolution> {
        let caps = INLINE_MARKER.captures(&chunk.content)?;
        let marker = caps.get(0)?.as_str().to_string();
        let keyword = caps.get(1)?.as_str();
        let source_type = SourceType::parse(keyword)?;
        let fields = MarkerFields::parse(caps.get(2).map(|m| m.as_str()).unwrap_or(""));

        let details = fields.details(source_type, || fallback_label(chunk));
        let date = fields.get(&["date"]).and_then(parse_date_str);

        Some(Resolution {
            provenance: Provenance::inline_marker(details),
            marker: Some(marker),
            date,
        })
    }
}

/// Key/value pairs from a marker payload, keys lowercased
struct MarkerFields(Vec<(String, String)>);

impl MarkerFields {
    fn parse(payload: &str) -> Self {
        let pairs = payload
            .split('|')
            .filter_map(|pair| pair.split_once(':'))
            .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .collect();
        Self(pairs)
    }

    fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| {
            self.0
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        })
    }

    fn owned(&self, keys: &[&str]) -> Option<String> {
        self.get(keys).map(str::to_string)
    }

    /// Build the typed payload, synthesizing a label when the marker has none
    fn details(&self, source_type: SourceType, fallback: impl FnOnce() -> String) -> SourceDetails {
        match source_type {
            SourceType::Email => {
                let sender = self.owned(&["from", "sender"]);
                let label = self
                    .owned(&["subject"])
                    .or_else(|| sender.as_ref().map(|s| format!("Email from {}", s)))
                    .unwrap_or_else(fallback);
                SourceDetails::Email {
                    label,
                    sender,
                    raw_date: self.owned(&["date"]),
                }
            }
            SourceType::Api => {
                let provider = self.owned(&["provider"]);
                let symbol = self.owned(&["symbol", "ticker"]);
                let label = join_present(&[provider.as_deref(), symbol.as_deref()])
                    .unwrap_or_else(fallback);
                SourceDetails::Api {
                    label,
                    provider,
                    symbol,
                }
            }
            SourceType::Filing => {
                let form = self.owned(&["form", "type"]);
                let company = self.owned(&["company"]);
                let label = self
                    .owned(&["title"])
                    .or_else(|| join_present(&[company.as_deref(), form.as_deref()]))
                    .unwrap_or_else(fallback);
                SourceDetails::Filing {
                    label,
                    form,
                    company,
                }
            }
            SourceType::Document => {
                let title = self.owned(&["title"]);
                let label = title.clone().unwrap_or_else(fallback);
                SourceDetails::Document { label, title }
            }
            SourceType::Unknown => SourceDetails::Unknown { label: fallback() },
        }
    }
}

fn join_present(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts.iter().flatten().copied().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Tier 2: structured `<type>:<details>` paths
///
/// `email:Quarterly Update.eml`, `filing:AAPL-10-K-2023.pdf`, `api:FMP/AAPL`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPrefixStrategy;

impl ProvenanceStrategy for PathPrefixStrategy {
    fn name(&self) -> &'static str {
        "path_prefix"
    }

    fn resolve(&self, chunk: &RawChunk) -> Option<Resolution> {
        let path = chunk.file_path.as_deref()?;
        let (prefix, rest) = path.split_once(':')?;
        let source_type = SourceType::parse(prefix).filter(|t| *t != SourceType::Unknown)?;
        let rest = rest.trim();
        if rest.is_empty() {
            return None;
        }

        let details = match source_type {
            SourceType::Api => api_details(rest),
            other => SourceDetails::labelled(other, path_stem(rest)),
        };
        Some(Resolution::from_provenance(Provenance::path_derived(details)))
    }
}

/// `FMP/AAPL` or `FMP:AAPL` → provider and symbol
fn api_details(rest: &str) -> SourceDetails {
    let rest = strip_extension(rest);
    match rest.split_once(['/', ':']) {
        Some((provider, symbol)) if !provider.trim().is_empty() && !symbol.trim().is_empty() => {
            let provider = provider.trim().to_string();
            let symbol = symbol.trim().to_string();
            SourceDetails::Api {
                label: format!("{} {}", provider, symbol),
                provider: Some(provider),
                symbol: Some(symbol),
            }
        }
        _ => SourceDetails::labelled(SourceType::Api, rest.trim_matches(['/', ':']).trim()),
    }
}

/// Final path component with a known extension stripped
fn path_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    strip_extension(name).trim()
}

fn strip_extension(name: &str) -> &str {
    KNOWN_EXTENSIONS
        .iter()
        .find_map(|ext| {
            let split = name.len().checked_sub(ext.len())?;
            let (stem, tail) = (name.get(..split)?, name.get(split..)?);
            tail.eq_ignore_ascii_case(ext).then_some(stem)
        })
        .unwrap_or(name)
}

/// Remove every inline source marker such as `[EMAIL | subject: ... | date: ...]`
///
/// Runs of spaces left behind collapse to one; line breaks are kept.
pub fn strip_inline_markers(text: &str) -> String {
    if !INLINE_MARKER.is_match(text) {
        return text.to_string();
    }
    INLINE_MARKER
        .replace_all(text, " ")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Label used when a tier's own data has no human-readable name
///
/// The file stem of the chunk's path, else `Chunk <reference_id>`.
pub fn fallback_label(chunk: &RawChunk) -> String {
    chunk
        .file_path
        .as_deref()
        .map(path_stem)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Chunk {}", chunk.reference_id))
}

/// Ordered list of provenance strategies plus the universal default
pub struct ProvenanceResolver {
    strategies: Vec<Box<dyn ProvenanceStrategy>>,
}

impl Default for ProvenanceResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(InlineMarkerStrategy),
            Box::new(PathPrefixStrategy),
        ])
    }
}

impl ProvenanceResolver {
    /// Create a resolver running `strategies` in order
    pub fn new(strategies: Vec<Box<dyn ProvenanceStrategy>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy after the existing ones
    pub fn with_strategy(mut self, strategy: Box<dyn ProvenanceStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Strategy names, in the order they run
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve a chunk; always succeeds
    pub fn resolve(&self, chunk: &RawChunk) -> Resolution {
        for strategy in &self.strategies {
            let Some(resolution) = strategy.resolve(chunk) else {
                continue;
            };

            let provenance = &resolution.provenance;
            if !provenance.details.has_label() {
                warn!(
                    "Strategy '{}' resolved chunk {} without a label; falling through",
                    strategy.name(),
                    chunk.reference_id
                );
                continue;
            }
            if !(0.0..=1.0).contains(&provenance.confidence) {
                warn!(
                    "Strategy '{}' assigned out-of-range confidence {} to chunk {}; \
                     falling through",
                    strategy.name(),
                    provenance.confidence,
                    chunk.reference_id
                );
                continue;
            }

            debug!(
                "Chunk {} resolved by '{}' as {}",
                chunk.reference_id,
                strategy.name(),
                provenance.source_type()
            );
            return resolution;
        }

        Resolution::from_provenance(Provenance::unknown(fallback_label(chunk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_domain::ProvenanceTier;

    fn raw(content: &str) -> RawChunk {
        RawChunk::new("1", content)
    }

    #[test]
    fn test_strip_inline_markers() {
        let text = "[EMAIL | subject: Q2 Update | from: cfo@apple.com | date: 2024-07-01] \
                    iPhone revenue grew 8% in Q2 [1].\nSee [API | name: Stocks] for more.";
        assert_eq!(
            strip_inline_markers(text),
            "iPhone revenue grew 8% in Q2 [1].\nSee for more."
        );
        assert_eq!(strip_inline_markers("See [Appendix] [1]"), "See [Appendix] [1]");
    }

    #[test]
    fn test_email_marker() {
        let chunk = raw(
            "[EMAIL | subject: Q2 Update | from: cfo@acme.com | date: 2024-07-01] Revenue grew.",
        );
        let resolution = InlineMarkerStrategy.resolve(&chunk).unwrap();

        assert_eq!(resolution.provenance.confidence, 0.90);
        assert_eq!(resolution.provenance.details.label(), "Q2 Update");
        assert_eq!(resolution.date, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(
            resolution.marker.as_deref(),
            Some("[EMAIL | subject: Q2 Update | from: cfo@acme.com | date: 2024-07-01]")
        );
        match resolution.provenance.details {
            SourceDetails::Email { sender, .. } => {
                assert_eq!(sender.as_deref(), Some("cfo@acme.com"))
            }
            other => panic!("Expected Email, got {:?}", other),
        }
    }

    #[test]
    fn test_api_marker_confidence_and_label() {
        let chunk = raw("[api | provider: FMP | ticker: AAPL] Price 190.");
        let resolution = InlineMarkerStrategy.resolve(&chunk).unwrap();
        assert_eq!(resolution.provenance.confidence, 0.85);
        assert_eq!(resolution.provenance.details.label(), "FMP AAPL");
    }

    #[test]
    fn test_filing_marker_label_synthesis() {
        let chunk = raw("[FILING | form: 10-K | company: Apple Inc] Net sales.");
        let resolution = InlineMarkerStrategy.resolve(&chunk).unwrap();
        assert_eq!(resolution.provenance.details.label(), "Apple Inc 10-K");
    }

    #[test]
    fn test_marker_without_label_fields_uses_fallback() {
        let chunk = raw("[DOC | date: 2024-01-01] text").with_path("notes/board-minutes.pdf");
        let resolution = InlineMarkerStrategy.resolve(&chunk).unwrap();
        assert_eq!(resolution.provenance.details.label(), "board-minutes");

        let chunk = raw("[MAIL | date: 2024-01-01] text");
        let resolution = InlineMarkerStrategy.resolve(&chunk).unwrap();
        assert_eq!(resolution.provenance.details.label(), "Chunk 1");
    }

    #[test]
    fn test_unbracketed_text_is_not_a_marker() {
        assert!(InlineMarkerStrategy.resolve(&raw("EMAIL subject: x")).is_none());
        assert!(InlineMarkerStrategy.resolve(&raw("[NOTE | subject: x]")).is_none());
    }

    #[test]
    fn test_path_prefix_strips_directories_and_extension() {
        let chunk = raw("text").with_path("email:inbox/Quarterly Update.eml");
        let resolution = PathPrefixStrategy.resolve(&chunk).unwrap();
        assert_eq!(resolution.provenance.confidence, 0.70);
        assert_eq!(resolution.provenance.source_type(), SourceType::Email);
        assert_eq!(resolution.provenance.details.label(), "Quarterly Update");
    }

    #[test]
    fn test_api_path_splits_provider_and_symbol() {
        for path in ["api:FMP/AAPL", "api:FMP:AAPL"] {
            let chunk = raw("text").with_path(path);
            let resolution = PathPrefixStrategy.resolve(&chunk).unwrap();
            match resolution.provenance.details {
                SourceDetails::Api {
                    label,
                    provider,
                    symbol,
                } => {
                    assert_eq!(label, "FMP AAPL");
                    assert_eq!(provider.as_deref(), Some("FMP"));
                    assert_eq!(symbol.as_deref(), Some("AAPL"));
                }
                other => panic!("Expected Api, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unrecognised_prefix_falls_through() {
        for path in ["C:\\reports\\q2.pdf", "notes.txt", "unknown:thing", "email:"] {
            let chunk = raw("text").with_path(path);
            assert!(PathPrefixStrategy.resolve(&chunk).is_none(), "{}", path);
        }
    }

    #[test]
    fn test_resolver_default_tier() {
        let resolver = ProvenanceResolver::default();
        let resolution = resolver.resolve(&raw("plain text").with_path("reports/q2.pdf"));
        assert_eq!(resolution.provenance.tier, ProvenanceTier::UnknownDefault);
        assert_eq!(resolution.provenance.confidence, 0.30);
        assert_eq!(resolution.provenance.details.label(), "q2");
    }

    #[test]
    fn test_inline_marker_wins_over_path() {
        let resolver = ProvenanceResolver::default();
        let chunk = raw("[FILING | title: 2023 10-K] text").with_path("email:Other.eml");
        let resolution = resolver.resolve(&chunk);
        assert_eq!(resolution.provenance.tier, ProvenanceTier::InlineMarker);
        assert_eq!(resolution.provenance.source_type(), SourceType::Filing);
    }

    struct BlankLabelStrategy;

    impl ProvenanceStrategy for BlankLabelStrategy {
        fn name(&self) -> &'static str {
            "blank_label"
        }

        fn resolve(&self, _chunk: &RawChunk) -> Option<Resolution> {
            Some(Resolution::from_provenance(Provenance::path_derived(
                SourceDetails::labelled(SourceType::Document, "  "),
            )))
        }
    }

    #[test]
    fn test_resolver_rejects_blank_label() {
        let resolver = ProvenanceResolver::new(vec![Box::new(BlankLabelStrategy)])
            .with_strategy(Box::new(PathPrefixStrategy));
        assert_eq!(resolver.strategy_names(), vec!["blank_label", "path_prefix"]);

        let resolution = resolver.resolve(&raw("text").with_path("document:Board Deck.pdf"));
        assert_eq!(resolution.provenance.tier, ProvenanceTier::PathDerived);
        assert_eq!(resolution.provenance.details.label(), "Board Deck");

        let resolution = resolver.resolve(&raw("text"));
        assert_eq!(resolution.provenance.tier, ProvenanceTier::UnknownDefault);
        assert_eq!(resolution.provenance.details.label(), "Chunk 1");
    }
}
