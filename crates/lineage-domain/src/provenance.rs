//! Provenance tracking for retrieved chunks
//!
//! Provenance is resolved through a strict three-tier fallback. Each tier
//! assigns a fixed confidence, so a chunk's confidence always tells the reader
//! how its lineage was established.

use crate::source::{SourceDetails, SourceType};
use serde::{Deserialize, Serialize};

/// Confidence for an inline marker on mail, filing or document text
pub const INLINE_MARKER_CONFIDENCE: f64 = 0.90;

/// Confidence for an inline marker on API-derived text
pub const INLINE_API_CONFIDENCE: f64 = 0.85;

/// Confidence for provenance derived from a `<type>:<details>` path
pub const PATH_DERIVED_CONFIDENCE: f64 = 0.70;

/// Confidence when no provenance could be resolved
pub const UNKNOWN_CONFIDENCE: f64 = 0.30;

/// Tier that resolved a chunk's provenance
///
/// Tiers are attempted in order and the first match wins:
/// - InlineMarker: explicit machine-written marker in the chunk text
/// - PathDerived: structured `<type>:<details>` path string
/// - UnknownDefault: universal fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceTier {
    /// Tier 1: inline marker
    InlineMarker,

    /// Tier 2: path-derived
    PathDerived,

    /// Tier 3: unknown default
    UnknownDefault,
}

impl ProvenanceTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvenanceTier::InlineMarker => "inline_marker",
            ProvenanceTier::PathDerived => "path_derived",
            ProvenanceTier::UnknownDefault => "unknown_default",
        }
    }

    /// Confidence values a chunk resolved by this tier may carry
    pub fn allowed_confidences(&self) -> &'static [f64] {
        match self {
            ProvenanceTier::InlineMarker => &[INLINE_MARKER_CONFIDENCE, INLINE_API_CONFIDENCE],
            ProvenanceTier::PathDerived => &[PATH_DERIVED_CONFIDENCE],
            ProvenanceTier::UnknownDefault => &[UNKNOWN_CONFIDENCE],
        }
    }

    /// Whether this tier resolved real lineage (anything above the default)
    pub fn is_resolved(&self) -> bool {
        *self != ProvenanceTier::UnknownDefault
    }
}

/// Resolved provenance of a single chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Source-type specific payload (always carries a label)
    pub details: SourceDetails,

    /// Confidence assigned by the resolving tier, in [0, 1]
    pub confidence: f64,

    /// Tier that resolved this provenance
    pub tier: ProvenanceTier,
}

impl Provenance {
    /// Provenance from an inline marker; confidence follows the marker shape
    pub fn inline_marker(details: SourceDetails) -> Self {
        let confidence = match details.source_type() {
            SourceType::Api => INLINE_API_CONFIDENCE,
            _ => INLINE_MARKER_CONFIDENCE,
        };
        Self {
            details,
            confidence,
            tier: ProvenanceTier::InlineMarker,
        }
    }

    /// Provenance derived from a structured path
    pub fn path_derived(details: SourceDetails) -> Self {
        Self {
            details,
            confidence: PATH_DERIVED_CONFIDENCE,
            tier: ProvenanceTier::PathDerived,
        }
    }

    /// The universal fallback
    pub fn unknown(label: impl Into<String>) -> Self {
        Self {
            details: SourceDetails::Unknown { label: label.into() },
            confidence: UNKNOWN_CONFIDENCE,
            tier: ProvenanceTier::UnknownDefault,
        }
    }

    /// Source type of the payload
    pub fn source_type(&self) -> SourceType {
        self.details.source_type()
    }
}
