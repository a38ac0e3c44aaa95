//! Display payload: always-shown and conditional cards

use chrono::NaiveDate;
use lineage_attribution::AttributionStatistics;
use lineage_confidence::{BreakdownEntry, ConflictingValue, NumericUnit};
use lineage_domain::{ConfidenceType, ProvenanceTier, SourceType, TemporalIntent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative reliability level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityLevel {
    /// At or above the high threshold
    High,
    /// At or above the medium threshold
    Medium,
    /// Below the medium threshold
    Low,
}

impl ReliabilityLevel {
    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReliabilityLevel::High => "high",
            ReliabilityLevel::Medium => "medium",
            ReliabilityLevel::Low => "low",
        }
    }
}

impl fmt::Display for ReliabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source quality badge, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityBadge {
    /// Regulatory filing
    Regulatory,
    /// Aggregated market or financial data
    AggregatedData,
    /// Mail or free-form documents
    Informal,
    /// Provenance unknown
    Unverified,
}

impl QualityBadge {
    /// Badge for a source type
    pub fn for_source_type(source_type: SourceType) -> Self {
        match source_type {
            SourceType::Filing => QualityBadge::Regulatory,
            SourceType::Api => QualityBadge::AggregatedData,
            SourceType::Email | SourceType::Document => QualityBadge::Informal,
            SourceType::Unknown => QualityBadge::Unverified,
        }
    }

    /// Get the badge name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityBadge::Regulatory => "regulatory",
            QualityBadge::AggregatedData => "aggregated-data",
            QualityBadge::Informal => "informal",
            QualityBadge::Unverified => "unverified",
        }
    }
}

/// One answer sentence with its citation numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySentence {
    /// Sentence text without markers
    pub text: String,
    /// Citation numbers of the supporting sources
    pub citations: Vec<usize>,
    /// Text with inline `[n]` markers
    pub rendered: String,
    /// Sentence confidence
    pub confidence: f64,
}

/// The answer with inline citations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCard {
    /// Sentences in answer order
    pub sentences: Vec<DisplaySentence>,
    /// Rendered sentences joined with spaces
    pub text: String,
}

/// Aggregate confidence and how it was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityCard {
    /// Aggregate confidence, when scored
    pub confidence: Option<f64>,
    /// Qualitative level, when scored
    pub level: Option<ReliabilityLevel>,
    /// Formula used, when scored
    pub confidence_type: Option<ConfidenceType>,
    /// Which formula applied and why, or why nothing is shown
    pub explanation: String,
    /// Inputs to the formula
    pub breakdown: Vec<BreakdownEntry>,
    /// Whether a fallback formula scored the answer
    pub fallback: bool,
}

/// One deduplicated source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Citation number, when any sentence cites this source
    pub citation: Option<usize>,
    /// Human-readable label
    pub label: String,
    /// Chunk reference ids merged into this entry
    pub reference_ids: Vec<String>,
    /// Highest chunk confidence
    pub confidence: f64,
    /// Strongest provenance tier among the chunks
    pub tier: ProvenanceTier,
    /// Quality badge
    pub badge: QualityBadge,
    /// Newest evidence date
    pub date: Option<NaiveDate>,
    /// Days between the evidence date and the reference date
    pub age_days: Option<i64>,
    /// Human-readable age (e.g. "3 months old")
    pub age: Option<String>,
}

/// Sources of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGroup {
    /// Source type of the group
    pub source_type: SourceType,
    /// Badge shared by the group
    pub badge: QualityBadge,
    /// Entries, cited ones first in citation order
    pub entries: Vec<SourceEntry>,
}

/// Sources grouped by type in badge order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesCard {
    /// Groups, strongest badge first
    pub groups: Vec<SourceGroup>,
    /// Number of deduplicated sources
    pub total: usize,
}

/// Evidence recency, shown for current and trend questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalCard {
    /// Temporal intent of the question
    pub intent: TemporalIntent,
    /// Oldest evidence date
    pub oldest: Option<NaiveDate>,
    /// Newest evidence date
    pub newest: Option<NaiveDate>,
    /// Days between oldest and newest
    pub spread_days: Option<i64>,
    /// Number of sources without a date
    pub undated_sources: usize,
    /// Recency warning, if any
    pub note: Option<String>,
}

/// One side of a conflict with its citation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictEntry {
    /// The conflicting value
    #[serde(flatten)]
    pub value: ConflictingValue,
    /// Source label
    pub label: String,
    /// Citation number of the source
    pub citation: Option<usize>,
}

/// Numeric disagreement between sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictsCard {
    /// Words describing the disputed quantity
    pub subject: String,
    /// Unit of the values
    pub unit: NumericUnit,
    /// Values in source order
    pub values: Vec<ConflictEntry>,
    /// Relative divergence
    pub divergence: f64,
    /// Coefficient of variation used by the penalty
    pub coefficient_of_variation: f64,
}

/// One reasoning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// 1-based step number
    pub step: usize,
    /// `source -[relation]-> target`
    pub rendered: String,
    /// Step confidence
    pub confidence: f64,
    /// Citation numbers of corroborating sources
    pub citations: Vec<usize>,
}

/// Reasoning chain behind a multi-hop answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningCard {
    /// Steps in chain order
    pub steps: Vec<ReasoningStep>,
    /// Product of step confidences
    pub chain_confidence: f64,
}

/// Tiered explanation of one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDisplay {
    /// Answer with citations
    pub answer: AnswerCard,
    /// Aggregate reliability
    pub reliability: ReliabilityCard,
    /// Cited and retrieved sources
    pub sources: SourcesCard,
    /// Evidence recency (current and trend questions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalCard>,
    /// Numeric conflicts (only when the conflict penalty applied)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ConflictsCard>,
    /// Reasoning path (only when paths were attributed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningCard>,
    /// Sentence attribution statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<AttributionStatistics>,
}

impl StructuredDisplay {
    /// Serialize the payload as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
