//! Graph entities referenced by the retrieval engine

use serde::{Deserialize, Serialize};

/// A named concept from the knowledge graph
///
/// Immutable once parsed. Identity is the `id`, which is unique within one
/// parsed context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier used by relationships to refer to this entity
    pub id: String,

    /// Human-readable name
    pub label: String,

    /// Entity type as reported upstream (e.g. "ORGANIZATION")
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity {
    /// Create a new entity
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            entity_type: entity_type.into(),
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serializes_type_key() {
        let entity = Entity::new("e1", "Apple Inc", "ORGANIZATION");
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "ORGANIZATION");
        assert!(json.get("description").is_none());
    }
}
