//! Total conversion of raw store entities into normalized records.
//!
//! Queries project every node and relationship into a map of the shape
//! `{properties, labels | type, identity, elementId}` (see [`project_node`]
//! and [`project_relationship`]). Nothing about that shape is trusted when
//! it comes back: each field is read on its own, and a field that is
//! absent or has the wrong type falls back to its default and is recorded
//! in [`MissingFields`]. One malformed entity never aborts a batch.

use serde_json::{Map, Value};

use crate::types::{EntityId, Layer, NormalizedNode};

pub const PROPERTIES_KEY: &str = "properties";
pub const LABELS_KEY: &str = "labels";
pub const TYPE_KEY: &str = "type";
pub const IDENTITY_KEY: &str = "identity";
pub const ELEMENT_ID_KEY: &str = "elementId";

/// Cypher expression projecting a node expression into the raw entity shape.
/// A null node stays null.
pub fn project_node(expr: &str) -> String {
    format!(
        "CASE WHEN {expr} IS NULL THEN NULL ELSE {{\
         {PROPERTIES_KEY}: properties({expr}), {LABELS_KEY}: labels({expr}), \
         {IDENTITY_KEY}: id({expr}), {ELEMENT_ID_KEY}: elementId({expr})}} END"
    )
}

/// Cypher expression projecting a relationship expression into the raw entity shape.
pub fn project_relationship(expr: &str) -> String {
    format!(
        "CASE WHEN {expr} IS NULL THEN NULL ELSE {{\
         {PROPERTIES_KEY}: properties({expr}), {TYPE_KEY}: type({expr}), \
         {IDENTITY_KEY}: id({expr}), {ELEMENT_ID_KEY}: elementId({expr})}} END"
    )
}

/// Which fields of a raw entity had to be defaulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingFields {
    pub properties: bool,
    pub labels: bool,
    pub identity: bool,
    pub element_id: bool,
    pub canonical_id: bool,
}

impl MissingFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.properties, "properties"),
            (self.labels, "labels"),
            (self.identity, "identity"),
            (self.element_id, "element_id"),
            (self.canonical_id, "canonical_id"),
        ]
        .into_iter()
        .filter_map(|(missing, name)| missing.then_some(name))
        .collect()
    }
}

/// A raw entity after field-by-field extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEntity {
    pub properties: Map<String, Value>,
    pub labels: Vec<String>,
    /// Relationship type, for relationships.
    pub rel_type: Option<String>,
    pub identity: Option<EntityId>,
    pub element_id: Option<String>,
    pub canonical_id: Option<EntityId>,
    pub layer: Option<Layer>,
    pub missing: MissingFields,
}

impl NormalizedEntity {
    /// Promote to a node. Entities without any usable id are dropped.
    pub fn into_node(self) -> Option<NormalizedNode> {
        let id = self.canonical_id?;
        Some(NormalizedNode {
            id,
            properties: self.properties,
            labels: self.labels,
            element_id: self.element_id,
            identity: self.identity,
            layer: self.layer,
        })
    }
}

/// Normalize one raw entity. Never fails.
pub fn normalize(raw: &Value) -> NormalizedEntity {
    let mut missing = MissingFields::default();

    let properties = match raw.get(PROPERTIES_KEY) {
        Some(Value::Object(map)) => map.clone(),
        _ => {
            missing.properties = true;
            Map::new()
        }
    };

    let rel_type = raw
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);

    let labels = match raw.get(LABELS_KEY) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => {
            missing.labels = rel_type.is_none();
            Vec::new()
        }
    };

    let identity = raw.get(IDENTITY_KEY).and_then(EntityId::from_value);
    missing.identity = identity.is_none();

    let element_id = raw
        .get(ELEMENT_ID_KEY)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    missing.element_id = element_id.is_none();

    let canonical_id = canonicalize_id(&properties, element_id.as_deref(), identity.as_ref());
    missing.canonical_id = canonical_id.is_none();

    let layer = derive_layer(&labels);

    NormalizedEntity {
        properties,
        labels,
        rel_type,
        identity,
        element_id,
        canonical_id,
        layer,
        missing,
    }
}

/// Resolve the canonical id: property `id` → element id → numeric identity
/// → property `ip` → property `name`. First usable value wins.
pub fn canonicalize_id(
    properties: &Map<String, Value>,
    element_id: Option<&str>,
    identity: Option<&EntityId>,
) -> Option<EntityId> {
    let prop = |key: &str| properties.get(key).and_then(EntityId::from_value);

    prop("id")
        .or_else(|| element_id.filter(|s| !s.is_empty()).map(EntityId::from))
        .or_else(|| identity.cloned())
        .or_else(|| prop("ip"))
        .or_else(|| prop("name"))
}

/// First layer, in label order, whose lower-cased label is a layer token.
pub fn derive_layer<S: AsRef<str>>(labels: &[S]) -> Option<Layer> {
    labels
        .iter()
        .find_map(|label| Layer::from_token(&label.as_ref().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_node_shape() {
        let raw = json!({
            "properties": {"id": "sw-01", "ip": "10.0.0.1"},
            "labels": ["Device", "Physical"],
            "identity": 12,
            "elementId": "4:db:12"
        });

        let entity = normalize(&raw);
        assert!(entity.missing.is_empty());
        assert_eq!(entity.canonical_id, Some(EntityId::from("sw-01")));
        assert_eq!(entity.identity, Some(EntityId::Int(12)));
        assert_eq!(entity.layer, Some(Layer::Physical));
    }

    #[test]
    fn test_ip_fallback_when_no_ids() {
        let raw = json!({"properties": {"ip": "10.0.0.1"}, "labels": []});
        let entity = normalize(&raw);
        assert_eq!(entity.canonical_id, Some(EntityId::from("10.0.0.1")));
        assert!(entity.missing.identity);
        assert!(entity.missing.element_id);
        assert!(!entity.missing.canonical_id);
    }

    #[test]
    fn test_canonical_id_precedence() {
        let mut props = Map::new();
        props.insert("ip".to_string(), json!("10.0.0.9"));
        props.insert("name".to_string(), json!("edge-router"));

        let identity = EntityId::Int(3);
        assert_eq!(
            canonicalize_id(&props, Some("4:db:3"), Some(&identity)),
            Some(EntityId::from("4:db:3"))
        );
        assert_eq!(canonicalize_id(&props, None, Some(&identity)), Some(identity.clone()));
        assert_eq!(canonicalize_id(&props, None, None), Some(EntityId::from("10.0.0.9")));

        props.remove("ip");
        assert_eq!(canonicalize_id(&props, None, None), Some(EntityId::from("edge-router")));

        props.insert("id".to_string(), json!(77));
        assert_eq!(
            canonicalize_id(&props, Some("4:db:3"), Some(&identity)),
            Some(EntityId::Int(77))
        );
    }

    #[test]
    fn test_identity_zero_is_a_valid_id() {
        let raw = json!({"properties": {}, "labels": ["Device"], "identity": 0});
        assert_eq!(normalize(&raw).canonical_id, Some(EntityId::Int(0)));
    }

    #[test]
    fn test_layer_precedence_follows_label_order() {
        assert_eq!(derive_layer(&["Logical", "Persona"]), Some(Layer::Logical));
        assert_eq!(derive_layer(&["PERSONA", "physical"]), Some(Layer::Persona));
        assert_eq!(derive_layer(&["Device"]), None);
        assert_eq!(derive_layer::<&str>(&[]), None);
    }

    #[test]
    fn test_malformed_entity_degrades_field_by_field() {
        let raw = json!({
            "properties": "not-a-map",
            "labels": ["Device", 42, "Persona"],
            "identity": {"nested": true},
            "elementId": 9
        });

        let entity = normalize(&raw);
        assert!(entity.missing.properties);
        assert!(entity.missing.identity);
        assert!(entity.missing.element_id);
        assert!(entity.missing.canonical_id);
        assert_eq!(entity.labels, vec!["Device", "Persona"]);
        assert_eq!(entity.layer, Some(Layer::Persona));
        assert!(entity.into_node().is_none());
    }

    #[test]
    fn test_non_object_input_is_total() {
        for raw in [Value::Null, json!(5), json!("x"), json!([])] {
            let entity = normalize(&raw);
            assert!(entity.properties.is_empty());
            assert_eq!(
                entity.missing.names(),
                vec!["properties", "labels", "identity", "element_id", "canonical_id"]
            );
        }
    }

    #[test]
    fn test_relationship_shape_does_not_flag_labels() {
        let raw = json!({
            "properties": {"weight": 2},
            "type": "CONNECTED",
            "identity": 5,
            "elementId": "5:db:5"
        });
        let entity = normalize(&raw);
        assert_eq!(entity.rel_type.as_deref(), Some("CONNECTED"));
        assert!(!entity.missing.labels);
    }

    #[test]
    fn test_projection_is_null_safe() {
        let cypher = project_node("n");
        assert!(cypher.starts_with("CASE WHEN n IS NULL THEN NULL ELSE {"));
        assert!(cypher.contains("elementId: elementId(n)"));
        assert!(project_relationship("r").contains("type: type(r)"));
    }
}
