//! Graph Assembler: runs an execution plan and folds its rows into
//! deduplicated nodes and per-row edges.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use topolens_core::normalize::NormalizedEntity;
use topolens_core::view::{
    LAYER_COLUMN, RELATIONSHIP_COLUMN, REL_TYPE_COLUMN, SOURCE_COLUMN, TARGET_COLUMN,
};
use topolens_core::{
    normalize, EdgeTag, EntityId, ExecutionPlan, NormalizedEdge, NormalizedNode, Record,
    RowMapping,
};

use crate::client::{GraphError, GraphStore, Session};

/// One `/nodes` response record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    #[serde(rename = "src_IP")]
    pub src_ip: Value,
    #[serde(rename = "dst_IP")]
    pub dst_ip: Value,
    pub edge: Value,
}

/// Nodes keyed by canonical id in first-seen order, plus one edge per kept row.
#[derive(Debug, Clone, Default)]
pub struct GraphAssembly {
    pub nodes: IndexMap<EntityId, NormalizedNode>,
    pub edges: Vec<NormalizedEdge>,
    pub skipped_rows: usize,
}

impl GraphAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch of rows. Malformed rows are skipped and counted.
    pub fn absorb(&mut self, rows: &[Record], mapping: RowMapping) {
        for row in rows {
            if !self.absorb_row(row, mapping) {
                self.skipped_rows += 1;
            }
        }
    }

    fn absorb_row(&mut self, row: &Record, mapping: RowMapping) -> bool {
        let raw_rel = row.get(RELATIONSHIP_COLUMN);
        if raw_rel.is_null() {
            return false;
        }

        let source = checked(normalize(row.get(SOURCE_COLUMN)), SOURCE_COLUMN);
        let target = checked(normalize(row.get(TARGET_COLUMN)), TARGET_COLUMN);
        let rel = checked(normalize(raw_rel), RELATIONSHIP_COLUMN);

        let (Some(source), Some(target)) = (source.into_node(), target.into_node()) else {
            tracing::warn!("Dropping row with an endpoint that has no usable id");
            return false;
        };

        let tag = match mapping {
            RowMapping::Path => row
                .get(REL_TYPE_COLUMN)
                .as_str()
                .map(|rel| EdgeTag::Rel(rel.to_string()))
                .unwrap_or(EdgeTag::None),
            RowMapping::Flat => row
                .get(LAYER_COLUMN)
                .as_str()
                .filter(|layer| !layer.is_empty())
                .map(|layer| EdgeTag::Layer(layer.to_string()))
                .unwrap_or(EdgeTag::None),
        };

        self.edges.push(NormalizedEdge {
            source_id: source.id.clone(),
            target_id: target.id.clone(),
            tag,
            properties: rel.properties,
        });
        self.nodes.entry(source.id.clone()).or_insert(source);
        self.nodes.entry(target.id.clone()).or_insert(target);
        true
    }

    /// Render one record per edge, with endpoints taken from the
    /// deduplicated node map.
    pub fn records(&self) -> Vec<EdgeRecord> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let src = self.nodes.get(&edge.source_id)?;
                let dst = self.nodes.get(&edge.target_id)?;
                Some(EdgeRecord {
                    src_ip: src.to_record(),
                    dst_ip: dst.to_record(),
                    edge: edge.to_record(),
                })
            })
            .collect()
    }
}

/// Log normalization defects; they never reach the caller.
fn checked(entity: NormalizedEntity, column: &str) -> NormalizedEntity {
    if !entity.missing.is_empty() {
        tracing::warn!(
            column,
            missing = ?entity.missing.names(),
            "Entity normalized with defaulted fields"
        );
    }
    entity
}

/// Execute every statement of the plan in order on one session.
pub async fn assemble<S: GraphStore>(
    session: &Session<S>,
    plan: &ExecutionPlan,
) -> Result<GraphAssembly, GraphError> {
    let mut assembly = GraphAssembly::new();
    for spec in &plan.specs {
        let rows = session.run(&spec.statement).await?;
        tracing::debug!(view = ?plan.view, rows = rows.len(), "Statement complete");
        assembly.absorb(&rows, spec.mapping);
    }

    tracing::info!(
        view = ?plan.view,
        nodes = assembly.nodes.len(),
        edges = assembly.edges.len(),
        skipped = assembly.skipped_rows,
        "Graph assembled"
    );
    Ok(assembly)
}
