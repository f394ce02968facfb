//! Shared, read-only application state.

use std::sync::Arc;

use topolens_attack::ReachabilityEngine;
use topolens_graph::{ConnectionManager, Dialer};

/// Connection settings and the reachability engine. Nothing here changes
/// after startup; every request opens its own session.
pub struct AppState<D> {
    pub manager: Arc<ConnectionManager<D>>,
    pub engine: Arc<ReachabilityEngine>,
}

impl<D: Dialer> AppState<D> {
    pub fn new(manager: ConnectionManager<D>, engine: ReachabilityEngine) -> Self {
        Self {
            manager: Arc::new(manager),
            engine: Arc::new(engine),
        }
    }
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            engine: Arc::clone(&self.engine),
        }
    }
}
