//! topolens-attack: Bounded-hop attack graphs over the device topology.
//!
//! Resolves a selected device, collects every facility device that can
//! reach it within a few hops, and shapes the result as a star graph with
//! target/start roles for the visualization client.

pub mod error;
pub mod query;
pub mod star;
pub mod types;

pub use error::AttackError;
pub use types::{AttackGraphResult, ReachabilityConfig};

use topolens_core::normalize;
use topolens_graph::{GraphStore, Session};

use crate::query::{Anchor, START_COLUMN, TARGET_COLUMN};

/// Two-phase reachability: resolve the target, then walk out from it.
#[derive(Debug, Clone)]
pub struct ReachabilityEngine {
    config: ReachabilityConfig,
}

impl ReachabilityEngine {
    pub fn new(config: ReachabilityConfig) -> error::Result<Self> {
        config.validate().map_err(AttackError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReachabilityConfig {
        &self.config
    }

    /// Compute the attack graph for the device identified by element id or
    /// `id` property. An unknown device is a successful empty result.
    pub async fn attack_graph<S: GraphStore>(
        &self,
        session: &Session<S>,
        device: &str,
    ) -> error::Result<AttackGraphResult> {
        let rows = session
            .run(&query::target_statement(&self.config, device))
            .await?;
        let target = rows
            .first()
            .map(|row| row.get(TARGET_COLUMN))
            .filter(|raw| !raw.is_null())
            .map(normalize);

        let Some(target) = target else {
            tracing::info!(device_element_id = %device, "No target device found");
            return Ok(AttackGraphResult::not_found(device));
        };
        let Some(anchor) = Anchor::of(&target) else {
            tracing::warn!(device_element_id = %device, "Target device has no element id or identity");
            return Ok(AttackGraphResult::not_found(device));
        };

        let rows = session
            .run(&query::reach_statement(&self.config, &anchor))
            .await?;
        let starts: Vec<_> = rows
            .iter()
            .map(|row| row.get(START_COLUMN))
            .filter(|raw| !raw.is_null())
            .map(normalize)
            .collect();

        let Some(result) = star::build_star(&target, &starts) else {
            tracing::warn!(device_element_id = %device, "Target device has no usable id");
            return Ok(AttackGraphResult::not_found(device));
        };

        tracing::info!(
            device_element_id = %device,
            reached = result.all_start_nodes.len(),
            "Attack graph computed"
        );
        Ok(result)
    }
}
