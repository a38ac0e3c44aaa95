//! Lineage Domain Layer
//!
//! Core data model shared by every stage of the attribution pipeline. The
//! crate holds no behaviour beyond constructors and small accessors; parsing,
//! scoring and formatting live in the component crates.
//!
//! ## Key Concepts
//!
//! - **Entity / Relationship**: the knowledge-graph slice the answer was built from
//! - **Chunk**: a retrieved passage with resolved provenance and confidence
//! - **SourceDetails**: per-source-type payload that always carries a display label
//! - **AttributedSentence / AttributedPath**: the lineage reconstructed for an answer
//! - **ConfidenceType**: which scoring formula produced an aggregate confidence
//!
//! Every object is created fresh for a single request and discarded after the
//! response is formatted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribution;
pub mod chunk;
pub mod confidence;
pub mod entity;
pub mod provenance;
pub mod query;
pub mod relationship;
pub mod source;

// Re-exports for convenience
pub use attribution::{AttributedPath, AttributedSentence};
pub use chunk::{Chunk, ParsedContext};
pub use confidence::{clamp_confidence, ConfidenceType};
pub use entity::Entity;
pub use provenance::{Provenance, ProvenanceTier};
pub use query::{QueryClassification, TemporalIntent};
pub use relationship::Relationship;
pub use source::{SourceDetails, SourceType};
