//! Confidence types shared between the synthesizer and the display layer

use serde::{Deserialize, Serialize};

/// Label identifying which scoring formula produced an aggregate confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceType {
    /// Raw confidence of the only source
    SingleSource,

    /// Source-quality weighted average across agreeing sources
    WeightedAverage,

    /// Mean confidence penalised by the spread of conflicting numeric values
    ConflictPenalized,

    /// Product of step confidences along a reasoning chain
    MultiHopDecay,

    /// Nothing to score
    NoEvidence,
}

impl ConfidenceType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceType::SingleSource => "single_source",
            ConfidenceType::WeightedAverage => "weighted_average",
            ConfidenceType::ConflictPenalized => "conflict_penalized",
            ConfidenceType::MultiHopDecay => "multi_hop_decay",
            ConfidenceType::NoEvidence => "no_evidence",
        }
    }
}

/// Clamp a confidence into [0, 1], mapping non-finite values to 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: clamped confidence always lands in [0, 1]
        #[test]
        fn test_clamp_range(value in proptest::num::f64::ANY) {
            let clamped = clamp_confidence(value);
            prop_assert!((0.0..=1.0).contains(&clamped));
        }
    }
}
