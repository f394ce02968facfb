//! Device topology: every facility device and its undirected CONNECTED links.

use indexmap::IndexMap;
use serde::Serialize;
use topolens_core::normalize::{project_node, project_relationship};
use topolens_core::vis::{edge_key, VisEdge, VisNode, DEVICE_STYLE};
use topolens_core::{normalize, EntityId, Record, Statement};

use crate::client::{GraphError, GraphStore, Session};

const DEVICE_COLUMN: &str = "d";
const LINK_COLUMN: &str = "r";
const PEER_COLUMN: &str = "d2";

const EDGE_WIDTH: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopologyGraph {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

pub fn topology_statement() -> Statement {
    Statement::new(format!(
        "MATCH (d:Device {{project: 'facility'}})
         OPTIONAL MATCH (d)-[r:CONNECTED {{project: 'facility'}}]-(d2:Device {{project: 'facility'}})
         RETURN {} AS {DEVICE_COLUMN}, {} AS {LINK_COLUMN}, {} AS {PEER_COLUMN}",
        project_node("d"),
        project_relationship("r"),
        project_node("d2"),
    ))
    .returns(&[DEVICE_COLUMN, LINK_COLUMN, PEER_COLUMN])
}

/// Fold topology rows into unique nodes and symmetric, unique edges.
///
/// Nodes are keyed by store identity. An edge is emitted once per unordered
/// pair, oriented from the smaller id to the larger.
pub fn build_topology(rows: &[Record]) -> TopologyGraph {
    let mut nodes: IndexMap<EntityId, VisNode> = IndexMap::new();
    let mut edges: IndexMap<String, VisEdge> = IndexMap::new();

    for row in rows {
        let device = add_device(&mut nodes, row, DEVICE_COLUMN);
        let peer = add_device(&mut nodes, row, PEER_COLUMN);

        if row.get(LINK_COLUMN).is_null() {
            continue;
        }
        if let (Some(a), Some(b)) = (device, peer) {
            let (from, to) = if a <= b { (a, b) } else { (b, a) };
            edges
                .entry(edge_key(&from, &to))
                .or_insert_with(|| VisEdge::new(from, to, EDGE_WIDTH));
        }
    }

    TopologyGraph {
        nodes: nodes.into_values().collect(),
        edges: edges.into_values().collect(),
    }
}

fn add_device(
    nodes: &mut IndexMap<EntityId, VisNode>,
    row: &Record,
    column: &str,
) -> Option<EntityId> {
    let raw = row.get(column);
    if raw.is_null() {
        return None;
    }
    let entity = normalize(raw);
    if !entity.missing.is_empty() {
        tracing::warn!(column, missing = ?entity.missing.names(), "Device normalized with defaulted fields");
    }
    let node = VisNode::styled(&entity, DEVICE_STYLE)?;
    let id = node.id.clone();
    nodes.entry(id.clone()).or_insert(node);
    Some(id)
}

pub async fn fetch_topology<S: GraphStore>(session: &Session<S>) -> Result<TopologyGraph, GraphError> {
    let rows = session.run(&topology_statement()).await?;
    let graph = build_topology(&rows);
    tracing::info!(
        rows = rows.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Topology assembled"
    );
    Ok(graph)
}
