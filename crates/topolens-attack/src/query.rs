//! Cypher for the two reachability phases.

use topolens_core::normalize::{project_node, NormalizedEntity};
use topolens_core::{EntityId, Param, Statement};

use crate::types::ReachabilityConfig;

pub const TARGET_COLUMN: &str = "target";
pub const START_COLUMN: &str = "start";

/// How the resolved target is pinned in the reachability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    ElementId(String),
    Identity(i64),
}

impl Anchor {
    /// Prefer the durable element id; numeric identity otherwise.
    pub fn of(target: &NormalizedEntity) -> Option<Self> {
        if let Some(element_id) = &target.element_id {
            return Some(Self::ElementId(element_id.clone()));
        }
        match target.identity {
            Some(EntityId::Int(id)) => Some(Self::Identity(id)),
            _ => None,
        }
    }

    fn predicate(&self) -> &'static str {
        match self {
            Self::ElementId(_) => "elementId(target) = $anchor",
            Self::Identity(_) => "id(target) = $anchor",
        }
    }

    fn param(&self) -> Param {
        match self {
            Self::ElementId(id) => Param::from(id.as_str()),
            Self::Identity(id) => Param::from(*id),
        }
    }
}

/// Phase 1: at most one device whose element id or `id` property matches.
pub fn target_statement(config: &ReachabilityConfig, device: &str) -> Statement {
    Statement::new(format!(
        "MATCH (target:Device {{project: $project}})
         WHERE elementId(target) = $device OR target.id = $device
         RETURN {} AS {TARGET_COLUMN}
         LIMIT 1",
        project_node("target"),
    ))
    .param("project", config.project.as_str())
    .param("device", device)
    .returns(&[TARGET_COLUMN])
}

/// Phase 2: distinct devices within `1..=max_hops` undirected hops of the
/// anchored target, excluding the target itself.
///
/// `config` must have passed [`ReachabilityConfig::validate`].
pub fn reach_statement(config: &ReachabilityConfig, anchor: &Anchor) -> Statement {
    Statement::new(format!(
        "MATCH (target:Device {{project: $project}})
         WHERE {predicate}
         MATCH (start:Device {{project: $project}})-[:{rel}*1..{hops}]-(target)
         WHERE start <> target
         WITH DISTINCT start
         LIMIT {limit}
         RETURN {start} AS {START_COLUMN}",
        predicate = anchor.predicate(),
        rel = config.relationship,
        hops = config.max_hops,
        limit = config.max_results,
        start = project_node("start"),
    ))
    .param("project", config.project.as_str())
    .param("anchor", anchor.param())
    .returns(&[START_COLUMN])
}
