//! Request configuration and response types for attack graph computation.

use serde::{Deserialize, Serialize};

use topolens_core::vis::{VisEdge, VisNode};
use topolens_core::EntityId;

/// Deepest traversal the reachability query may request.
pub const MAX_HOPS_CEILING: u32 = 3;

/// Traversal bounds for the reachability phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    /// Relationship type walked between devices.
    pub relationship: String,
    /// Project tag both the target and reached devices must carry.
    pub project: String,
    /// Maximum path length, in hops: 1 to [`MAX_HOPS_CEILING`].
    pub max_hops: u32,
    /// Cap on reached devices.
    pub max_results: u32,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            relationship: "CONNECTED".to_string(),
            project: "facility".to_string(),
            max_hops: 3,
            max_results: 50,
        }
    }
}

impl ReachabilityConfig {
    /// The relationship type is spliced into Cypher, so it must be a plain
    /// identifier.
    pub fn validate(&self) -> Result<(), String> {
        let rel = &self.relationship;
        if rel.is_empty() || !rel.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("relationship must be an identifier, got {rel:?}"));
        }
        if !(1..=MAX_HOPS_CEILING).contains(&self.max_hops) {
            return Err(format!(
                "max_hops must be between 1 and {MAX_HOPS_CEILING}, got {}",
                self.max_hops
            ));
        }
        Ok(())
    }
}

/// A target device and every device that can reach it, as a star graph.
///
/// Edges always join a start node directly to the target; they do not
/// follow the hop-by-hop path that was traversed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackGraphResult {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
    pub all_start_nodes: Vec<EntityId>,
    pub target_node_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttackGraphResult {
    /// The expected "no such device" outcome. Not an error status.
    pub fn not_found(device: &str) -> Self {
        Self {
            error: Some(format!("No target node found for: {device}")),
            ..Self::default()
        }
    }
}
