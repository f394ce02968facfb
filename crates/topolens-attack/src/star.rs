//! Star graph assembly: role-styled nodes with every start joined to the target.

use indexmap::IndexMap;
use topolens_core::normalize::NormalizedEntity;
use topolens_core::vis::{NodeStyle, VisEdge, VisNode, START_STYLE, TARGET_STYLE};
use topolens_core::EntityId;

use crate::types::AttackGraphResult;

const EDGE_WIDTH: u32 = 2;
const EDGE_TITLE: &str = "Connected";

fn role_node(entity: &NormalizedEntity, style: NodeStyle) -> Option<VisNode> {
    VisNode::styled(entity, style)
        .map(|node| node.without_element_id().with_properties(entity.properties.clone()))
}

/// Build the attack graph around `target`. Starts without a usable id,
/// duplicates, and the target itself are dropped.
pub fn build_star(target: &NormalizedEntity, starts: &[NormalizedEntity]) -> Option<AttackGraphResult> {
    let target_node = role_node(target, TARGET_STYLE)?;
    let target_id = target_node.id.clone();

    let mut reached: IndexMap<EntityId, VisNode> = IndexMap::new();
    for start in starts {
        let Some(node) = role_node(start, START_STYLE) else {
            tracing::warn!(missing = ?start.missing.names(), "Reached device has no usable id");
            continue;
        };
        if node.id == target_id {
            continue;
        }
        reached.entry(node.id.clone()).or_insert(node);
    }

    let all_start_nodes: Vec<EntityId> = reached.keys().cloned().collect();
    let edges = all_start_nodes
        .iter()
        .map(|start| VisEdge::new(start.clone(), target_id.clone(), EDGE_WIDTH).with_title(EDGE_TITLE))
        .collect();

    let mut nodes = Vec::with_capacity(reached.len() + 1);
    nodes.push(target_node);
    nodes.extend(reached.into_values());

    Some(AttackGraphResult {
        nodes,
        edges,
        all_start_nodes,
        target_node_id: Some(target_id),
        error: None,
    })
}
