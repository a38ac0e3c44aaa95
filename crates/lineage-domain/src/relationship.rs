//! Relationship module - directed edges between graph entities

use serde::{Deserialize, Serialize};

/// A directed edge between two entity ids
///
/// Many-to-many; no uniqueness constraint is enforced. Multi-hop reasoning
/// chains are sequences of relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Source entity id
    pub source_id: String,

    /// Target entity id
    pub target_id: String,

    /// Free-text description of the edge (e.g. "OFFERS", "HAS_METRIC")
    pub description: String,

    /// Optional edge weight as reported upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Optional keyword summary of the edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            description: description.into(),
            weight: None,
            keywords: None,
        }
    }

    /// Attach an edge weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Label used when rendering the edge: keywords when the description is empty
    pub fn relation_label(&self) -> &str {
        let description = self.description.trim();
        if description.is_empty() {
            self.keywords.as_deref().map(str::trim).unwrap_or("")
        } else {
            description
        }
    }

    /// Whether two relationships describe the same edge
    pub fn same_edge(&self, other: &Relationship) -> bool {
        self.source_id == other.source_id
            && self.target_id == other.target_id
            && self.description == other.description
    }
}
