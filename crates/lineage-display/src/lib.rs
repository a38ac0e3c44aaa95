//! Lineage Display
//!
//! Turns attribution and confidence results into a tiered, auditable payload.
//! The Answer, Reliability and Sources cards are always present; Temporal
//! Context, Conflicts and Reasoning Path appear only when the question or the
//! evidence calls for them.
//!
//! # Example Usage
//!
//! ```
//! use lineage_display::DisplayFormatter;
//! use lineage_domain::{AttributedSentence, QueryClassification};
//!
//! let sentences = vec![AttributedSentence::unattributed("Revenue grew.", 0.3)];
//! let classification = QueryClassification::default();
//! let display = DisplayFormatter::default().format(&sentences, &[], None, &[], &classification);
//!
//! assert_eq!(display.answer.text, "Revenue grew.");
//! assert!(display.reliability.confidence.is_none());
//! assert!(display.to_markdown().contains("## Sources"));
//! ```

#![warn(missing_docs)]

mod cards;
mod config;
mod formatter;
mod markdown;

pub use cards::{
    AnswerCard, ConflictEntry, ConflictsCard, DisplaySentence, QualityBadge, ReasoningCard,
    ReasoningStep, ReliabilityCard, ReliabilityLevel, SourceEntry, SourceGroup, SourcesCard,
    StructuredDisplay, TemporalCard,
};
pub use config::DisplayConfig;
pub use formatter::{DisplayFormatter, CONFIDENCE_NOT_AVAILABLE};
