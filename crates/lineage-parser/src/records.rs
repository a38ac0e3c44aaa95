//! Record decoding for entities, relationships and chunks
//!
//! Upstream writers disagree on key names, so each field accepts a list of
//! aliases and the first present key wins. Records missing a required field
//! are skipped with a warning; the rest of the section still decodes.

use crate::dates::parse_date_value;
use crate::provenance::RawChunk;
use lineage_domain::{Entity, Relationship};
use serde_json::{Map, Value};
use tracing::warn;

const ENTITY_ID_KEYS: &[&str] = &["id", "entity_id"];
const ENTITY_LABEL_KEYS: &[&str] = &["entity", "entity_name", "label", "name"];
const ENTITY_TYPE_KEYS: &[&str] = &["type", "entity_type"];

const REL_SOURCE_KEYS: &[&str] = &["source_id", "src_id", "entity1", "source"];
const REL_TARGET_KEYS: &[&str] = &["target_id", "tgt_id", "entity2", "target"];

const CHUNK_ID_KEYS: &[&str] = &["reference_id", "id", "chunk_id"];
const CHUNK_PATH_KEYS: &[&str] = &["file_path", "source", "path"];
const CHUNK_DATE_KEYS: &[&str] = &["date", "created_at", "timestamp"];

/// Entity type used when a record carries none
pub(crate) const DEFAULT_ENTITY_TYPE: &str = "UNKNOWN";

/// Decode entity records
pub(crate) fn decode_entities(records: &[Value], limit: usize) -> Vec<Entity> {
    decode_each(records, limit, "entity", |obj, _| {
        let label = first_text(obj, ENTITY_LABEL_KEYS).ok_or("Missing entity label")?;
        let id = first_text(obj, ENTITY_ID_KEYS).unwrap_or_else(|| label.clone());
        let entity_type = first_text(obj, ENTITY_TYPE_KEYS)
            .unwrap_or_else(|| DEFAULT_ENTITY_TYPE.to_string());

        let mut entity = Entity::new(id, label, entity_type);
        if let Some(description) = first_text(obj, &["description"]) {
            entity = entity.with_description(description);
        }
        Ok(entity)
    })
}

/// Decode relationship records
pub(crate) fn decode_relationships(records: &[Value], limit: usize) -> Vec<Relationship> {
    decode_each(records, limit, "relationship", |obj, _| {
        let source = first_text(obj, REL_SOURCE_KEYS).ok_or("Missing relationship source")?;
        let target = first_text(obj, REL_TARGET_KEYS).ok_or("Missing relationship target")?;
        let description = first_text(obj, &["description"]).unwrap_or_default();

        let mut relationship = Relationship::new(source, target, description);
        relationship.weight = obj.get("weight").and_then(as_number);
        relationship.keywords = first_text(obj, &["keywords"]);
        Ok(relationship)
    })
}

/// Decode chunk records; ids fall back to the 1-based position
pub(crate) fn decode_chunks(records: &[Value], limit: usize) -> Vec<RawChunk> {
    decode_each(records, limit, "chunk", |obj, idx| {
        let content = obj
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or("Missing or invalid 'content'")?
            .to_string();
        let reference_id = first_text(obj, CHUNK_ID_KEYS).unwrap_or_else(|| (idx + 1).to_string());
        let file_path = first_text(obj, CHUNK_PATH_KEYS);
        let date = CHUNK_DATE_KEYS
            .iter()
            .find_map(|key| obj.get(*key))
            .and_then(parse_date_value);

        Ok(RawChunk {
            reference_id,
            content,
            file_path,
            date,
        })
    })
}

fn decode_each<T>(
    records: &[Value],
    limit: usize,
    kind: &str,
    decode: impl Fn(&Map<String, Value>, usize) -> Result<T, &'static str>,
) -> Vec<T> {
    if records.len() > limit {
        warn!(
            "Section holds {} {} records; only the first {} are read",
            records.len(),
            kind,
            limit
        );
    }

    let mut decoded = Vec::new();
    for (idx, record) in records.iter().take(limit).enumerate() {
        let Some(obj) = record.as_object() else {
            warn!("Skipping {} record {}: not a JSON object", kind, idx);
            continue;
        };
        match decode(obj, idx) {
            Ok(item) => decoded.push(item),
            Err(e) => warn!("Skipping {} record {}: {}", kind, idx, e),
        }
    }
    decoded
}

/// First present, non-blank text value among `keys`
///
/// Numbers are accepted and rendered as text (ids are often numeric).
/// Surrounding quotes left over from graph extraction are trimmed.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match obj.get(*key)? {
            Value::String(s) => s.trim().trim_matches('"').trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|w| w.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_entity_key_aliases() {
        let records = vec![
            json!({"id": 7, "entity_name": "Apple Inc", "entity_type": "ORGANIZATION"}),
            json!({"entity": "\"iPhone\""}),
        ];
        let entities = decode_entities(&records, 100);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].id, "7");
        assert_eq!(entities[0].label, "Apple Inc");
        assert_eq!(entities[1].id, "iPhone");
        assert_eq!(entities[1].entity_type, DEFAULT_ENTITY_TYPE);
    }

    #[test]
    fn test_entity_without_label_is_skipped() {
        let records = vec![json!({"id": "1"}), json!("bare string"), json!({"name": "Ok"})];
        let entities = decode_entities(&records, 100);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].label, "Ok");
    }

    #[test]
    fn test_relationship_weight_forms() {
        let records = vec![
            json!({"entity1": "A", "entity2": "B", "description": "OWNS", "weight": "0.8"}),
            json!({"src_id": "A", "tgt_id": "C", "weight": 2, "keywords": "supply"}),
            json!({"source": "A"}),
        ];
        let relationships = decode_relationships(&records, 100);
        assert_eq!(relationships.len(), 2);
        assert_eq!(relationships[0].weight, Some(0.8));
        assert_eq!(relationships[1].weight, Some(2.0));
        assert_eq!(relationships[1].description, "");
        assert_eq!(relationships[1].keywords.as_deref(), Some("supply"));
    }

    #[test]
    fn test_chunk_id_falls_back_to_position() {
        let records = vec![
            json!({"content": "first"}),
            json!({"content": "second", "chunk_id": "c-9", "created_at": "2024-01-05"}),
            json!({"id": 3}),
        ];
        let chunks = decode_chunks(&records, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].reference_id, "1");
        assert_eq!(chunks[1].reference_id, "c-9");
        assert_eq!(chunks[1].date, NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_record_limit() {
        let records: Vec<Value> = (0..10).map(|i| json!({"content": format!("c{}", i)})).collect();
        assert_eq!(decode_chunks(&records, 4).len(), 4);
    }
}
