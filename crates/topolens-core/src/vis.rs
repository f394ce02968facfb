//! Visualization node/edge shapes for the device topology and attack graph.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::normalize::NormalizedEntity;
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeColor {
    pub background: String,
    pub border: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeColor {
    pub color: String,
}

/// Fixed presentation of a node group.
#[derive(Debug, Clone, Copy)]
pub struct NodeStyle {
    pub group: &'static str,
    pub size: u32,
    pub background: &'static str,
    pub border: &'static str,
}

pub const DEVICE_STYLE: NodeStyle = NodeStyle {
    group: "Device",
    size: 12,
    background: "#2B7CE9",
    border: "#205AAA",
};

pub const TARGET_STYLE: NodeStyle = NodeStyle {
    group: "TargetPhysical",
    size: 25,
    background: "#FF0000",
    border: "#CC0000",
};

pub const START_STYLE: NodeStyle = NodeStyle {
    group: "StartPhysical",
    size: 20,
    background: "#00FF00",
    border: "#00CC00",
};

pub const EDGE_COLOR: &str = "#848484";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisNode {
    pub id: EntityId,
    pub label: String,
    #[serde(rename = "elementId", skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    pub group: String,
    pub title: String,
    pub shape: String,
    pub size: u32,
    pub color: NodeColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl VisNode {
    /// Build a styled node. Returns `None` when the entity has no usable id.
    pub fn styled(entity: &NormalizedEntity, style: NodeStyle) -> Option<Self> {
        let id = vis_id(entity)?;
        Some(Self {
            label: display_label(entity),
            element_id: entity.element_id.clone(),
            group: style.group.to_string(),
            title: render_title(&entity.properties),
            shape: "dot".to_string(),
            size: style.size,
            color: NodeColor {
                background: style.background.to_string(),
                border: style.border.to_string(),
            },
            properties: None,
            id,
        })
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn without_element_id(mut self) -> Self {
        self.element_id = None;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisEdge {
    pub id: String,
    pub from: EntityId,
    pub to: EntityId,
    pub color: EdgeColor,
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl VisEdge {
    pub fn new(from: EntityId, to: EntityId, width: u32) -> Self {
        Self {
            id: edge_key(&from, &to),
            from,
            to,
            color: EdgeColor {
                color: EDGE_COLOR.to_string(),
            },
            width,
            title: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

/// Direction-independent edge key: `"<min>-<max>"`.
pub fn edge_key(a: &EntityId, b: &EntityId) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}-{hi}")
}

/// Visualization id: the store identity, else the canonical id.
pub fn vis_id(entity: &NormalizedEntity) -> Option<EntityId> {
    entity
        .identity
        .clone()
        .or_else(|| entity.canonical_id.clone())
}

/// Display label: property `name` → property `label` → first label →
/// property `id` → identity.
pub fn display_label(entity: &NormalizedEntity) -> String {
    let prop = |key: &str| {
        entity
            .properties
            .get(key)
            .and_then(EntityId::from_value)
            .map(|v| v.to_string())
    };

    prop("name")
        .or_else(|| prop("label"))
        .or_else(|| entity.labels.first().cloned())
        .or_else(|| prop("id"))
        .or_else(|| entity.identity.as_ref().map(ToString::to_string))
        .unwrap_or_default()
}

/// Hover text: the property map as compact JSON.
pub fn render_title(properties: &Map<String, Value>) -> String {
    serde_json::to_string(properties).unwrap_or_default()
}
