//! Core data model for the normalized topology graph.
//!
//! Everything here is request-scoped: built while a query result is
//! consumed, serialized into the response, then dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Identity ──────────────────────────────────────────────────────

/// A store identity or canonical id. The store hands back integers for
/// legacy numeric ids and opaque strings for everything else.
///
/// Ordering puts every integer before every string and compares integers
/// numerically, so `min`/`max` over two ids is stable in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Interpret a scalar JSON value as an id.
    ///
    /// Null, empty strings, and collections are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(
                n.as_i64()
                    .map(Self::Int)
                    .unwrap_or_else(|| Self::Str(n.to_string())),
            ),
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            Value::Bool(b) => Some(Self::Str(b.to_string())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

// ── Layer ─────────────────────────────────────────────────────────

/// Presentation layer of a node, derived from its labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Physical,
    Logical,
    Persona,
}

impl Layer {
    /// Match precedence when a node carries more than one layer label.
    pub const PRECEDENCE: [Layer; 3] = [Layer::Physical, Layer::Logical, Layer::Persona];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Logical => "logical",
            Self::Persona => "persona",
        }
    }

    /// Exact lower-case token match (view names and lower-cased labels).
    pub fn from_token(token: &str) -> Option<Self> {
        Self::PRECEDENCE.into_iter().find(|l| l.as_str() == token)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Nodes ─────────────────────────────────────────────────────────

/// A graph node after normalization. Only nodes with a canonical id exist.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNode {
    pub id: EntityId,
    pub properties: Map<String, Value>,
    pub labels: Vec<String>,
    pub element_id: Option<String>,
    pub identity: Option<EntityId>,
    pub layer: Option<Layer>,
}

impl NormalizedNode {
    /// Flat JSON record consumed by the rendering client: the node's own
    /// properties plus store metadata under `__`-prefixed keys, with `id`
    /// overwritten by the canonical id.
    pub fn to_record(&self) -> Value {
        let mut out = self.properties.clone();
        out.insert(
            "__labels".to_string(),
            Value::Array(self.labels.iter().cloned().map(Value::String).collect()),
        );
        out.insert(
            "__element_id".to_string(),
            self.element_id.clone().map(Value::String).unwrap_or(Value::Null),
        );
        out.insert(
            "__id".to_string(),
            self.identity.as_ref().map(EntityId::to_value).unwrap_or(Value::Null),
        );
        out.insert("id".to_string(), self.id.to_value());
        if let Some(layer) = self.layer {
            out.insert("layer".to_string(), Value::String(layer.as_str().to_string()));
        }
        Value::Object(out)
    }
}

// ── Edges ─────────────────────────────────────────────────────────

/// Relationship semantics stamped on an edge record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTag {
    /// Relationship kind from a multi-layer pattern (`HOSTS`, `USES`, `PHYSICAL`).
    Rel(String),
    /// Lower-cased relationship layer token from the generic edge pattern.
    Layer(String),
    None,
}

/// A directed edge between two canonical node ids.
///
/// `sourceIP`/`targetIP` in the serialized form are historical names: they
/// carry canonical ids, which are only sometimes IP addresses.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEdge {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub tag: EdgeTag,
    pub properties: Map<String, Value>,
}

impl NormalizedEdge {
    pub fn to_record(&self) -> Value {
        let mut out = self.properties.clone();
        match &self.tag {
            EdgeTag::Rel(rel) => {
                out.insert("rel".to_string(), Value::String(rel.clone()));
            }
            EdgeTag::Layer(layer) => {
                out.insert("layer".to_string(), Value::String(layer.clone()));
            }
            EdgeTag::None => {}
        }
        out.insert("sourceIP".to_string(), self.source_id.to_value());
        out.insert("targetIP".to_string(), self.target_id.to_value());
        Value::Object(out)
    }
}
