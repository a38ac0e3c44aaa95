//! Lineage Confidence Synthesizer
//!
//! Aggregates per-chunk confidences into one score for an answer and records
//! which formula produced it.
//!
//! # Formula Selection
//!
//! [`EvidencePattern::classify`] picks exactly one formula, in this order:
//!
//! 1. Multi-hop query with reasoning steps: product of step confidences
//! 2. No evidence: 0
//! 3. Multi-hop query without steps: single-source fallback, flagged
//! 4. One source: its raw confidence
//! 5. Conflicting numeric claims: mean confidence × (1 − min(cv, 1))
//! 6. Otherwise: source-quality weighted average
//!
//! # Example Usage
//!
//! ```
//! use lineage_confidence::{ConfidenceSynthesizer, EvidencePattern, EvidenceSource};
//! use lineage_domain::{ConfidenceType, SourceType};
//!
//! let pattern = EvidencePattern::new(
//!     vec![EvidenceSource::new("1", SourceType::Filing, 0.95, "Net sales were $85.8B.")],
//!     vec![],
//!     false,
//! );
//! let result = ConfidenceSynthesizer::default().synthesize(&pattern);
//! assert_eq!(result.confidence, 0.95);
//! assert_eq!(result.confidence_type, ConfidenceType::SingleSource);
//! ```

#![warn(missing_docs)]

mod config;
mod evidence;
mod numeric;
mod synthesizer;

pub use config::{SourceWeights, SynthesizerConfig};
pub use evidence::{EvidencePattern, EvidenceSource, PathStep, PatternKind};
pub use numeric::{
    extract_claims, find_conflict, ConflictReport, ConflictingValue, NumericClaim, NumericUnit,
};
pub use synthesizer::{BreakdownEntry, ConfidenceResult, ConfidenceSynthesizer};
