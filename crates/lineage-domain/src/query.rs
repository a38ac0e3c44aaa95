//! Query classification supplied by the external query classifier

use serde::{Deserialize, Serialize};

/// Temporal intent of the user's question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalIntent {
    /// Asks about the present state ("what is the current ...")
    Current,

    /// Asks about change over time
    Trend,

    /// Asks about a fixed past period
    Historical,

    /// No temporal aspect
    #[default]
    #[serde(rename = "none")]
    Unspecified,
}

impl TemporalIntent {
    /// Get the intent name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalIntent::Current => "current",
            TemporalIntent::Trend => "trend",
            TemporalIntent::Historical => "historical",
            TemporalIntent::Unspecified => "none",
        }
    }

    /// Whether evidence age matters for this intent
    pub fn is_time_sensitive(&self) -> bool {
        matches!(self, TemporalIntent::Current | TemporalIntent::Trend)
    }
}

/// Classification of the query that produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryClassification {
    /// Temporal intent
    #[serde(default)]
    pub temporal_intent: TemporalIntent,

    /// Whether the query needs multi-hop / causal reasoning
    #[serde(default)]
    pub is_multi_hop: bool,
}

impl QueryClassification {
    /// Create a classification
    pub fn new(temporal_intent: TemporalIntent, is_multi_hop: bool) -> Self {
        Self {
            temporal_intent,
            is_multi_hop,
        }
    }
}
