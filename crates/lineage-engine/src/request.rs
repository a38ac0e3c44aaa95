//! Request and report types

use chrono::NaiveDate;
use lineage_confidence::ConfidenceResult;
use lineage_display::StructuredDisplay;
use lineage_domain::{
    AttributedPath, AttributedSentence, ParsedContext, QueryClassification, Relationship,
};
use serde::{Deserialize, Serialize};

/// Everything needed to explain one answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionRequest {
    /// Raw context the answer was generated from; `None` is rejected
    #[serde(default)]
    pub raw_context: Option<String>,

    /// Generated answer text
    #[serde(default)]
    pub answer: String,

    /// Classification of the question
    #[serde(default)]
    pub classification: QueryClassification,

    /// Reasoning chains reported by the retrieval engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causal_paths: Vec<Vec<Relationship>>,

    /// Date evidence ages are computed against (defaults to today, UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

impl AttributionRequest {
    /// Create a request for an answer and its raw context
    pub fn new(raw_context: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            raw_context: Some(raw_context.into()),
            answer: answer.into(),
            ..Default::default()
        }
    }

    /// Set the query classification
    pub fn with_classification(mut self, classification: QueryClassification) -> Self {
        self.classification = classification;
        self
    }

    /// Set the causal chains
    pub fn with_causal_paths(mut self, causal_paths: Vec<Vec<Relationship>>) -> Self {
        self.causal_paths = causal_paths;
        self
    }

    /// Fix the reference date for evidence ages
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = Some(reference_date);
        self
    }

    /// Decode a request from JSON
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse request JSON: {}", e))
    }
}

/// Intermediate and final results of one attribution run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionReport {
    /// Parsed context
    pub context: ParsedContext,

    /// Per-sentence attribution
    pub sentences: Vec<AttributedSentence>,

    /// Attributed reasoning paths (empty unless the question is multi-hop)
    pub paths: Vec<AttributedPath>,

    /// Aggregate confidence
    pub confidence: ConfidenceResult,

    /// Display payload
    pub display: StructuredDisplay,
}
