//! Connection management and request-scoped sessions.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use topolens_core::{Record, Statement};

/// Errors from graph operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j auth failed: {0}")]
    Auth(String),

    #[error("Neo4j routing/connection failed: {0}")]
    Unavailable(String),

    #[error("Neo4j query error: {0}")]
    Query(String),

    #[error("Neo4j query timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Neo4j configuration error: {0}")]
    Config(String),
}

impl GraphError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Configuration for connecting to Neo4j.
///
/// Loaded from the `[neo4j]` section. The URI and credentials have no
/// defaults; everything else does.
#[derive(Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

impl GraphConfig {
    pub fn new(uri: &str, user: &str, password: &str) -> Self {
        Self {
            uri: uri.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            database: default_database(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            connect_timeout_secs: default_connect_timeout(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("fetch_size", &self.fetch_size)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> usize {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_query_timeout() -> u64 {
    30
}

// ── Store seam ────────────────────────────────────────────────────

/// A connected, verified handle on the graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute a read statement and collect its declared columns per row.
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, GraphError>;

    /// Release the handle. Must not panic.
    fn close(&self) {}
}

/// Opens store handles. `dial` must verify connectivity before returning.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Store: GraphStore + 'static;

    async fn dial(&self, config: &GraphConfig, uri: &str) -> Result<Self::Store, GraphError>;
}

/// Routing schemes and their direct-connection equivalents.
const ROUTING_SCHEMES: [(&str, &str); 3] = [
    ("neo4j+s://", "bolt+s://"),
    ("neo4j+ssc://", "bolt+ssc://"),
    ("neo4j://", "bolt://"),
];

/// The direct-connection URI for a routing URI, same host and port.
/// `None` for URIs that are not routing URIs.
pub fn direct_uri(uri: &str) -> Option<String> {
    ROUTING_SCHEMES.iter().find_map(|(routing, direct)| {
        uri.strip_prefix(routing)
            .map(|rest| format!("{direct}{rest}"))
    })
}

// ── Connection manager ────────────────────────────────────────────

/// Opens one session per request with routing-scheme fallback.
pub struct ConnectionManager<D> {
    config: GraphConfig,
    dialer: D,
}

impl<D: Dialer> ConnectionManager<D> {
    pub fn new(config: GraphConfig, dialer: D) -> Self {
        Self { config, dialer }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Connect and verify.
    ///
    /// If the store is unavailable and the URI uses a routing scheme, retry
    /// exactly once against the direct-scheme URI. Authentication failures
    /// are returned immediately.
    pub async fn connect(&self) -> Result<Session<D::Store>, GraphError> {
        let uri = self.config.uri.as_str();
        match self.dial(uri).await {
            Ok(store) => Ok(self.session(store, uri)),
            Err(GraphError::Unavailable(reason)) => {
                let Some(fallback) = direct_uri(uri) else {
                    return Err(GraphError::Unavailable(reason));
                };
                tracing::warn!(
                    uri = %uri,
                    fallback = %fallback,
                    %reason,
                    "Routing connection unavailable, retrying with direct scheme"
                );
                let store = self.dial(&fallback).await?;
                Ok(self.session(store, &fallback))
            }
            Err(e) => Err(e),
        }
    }

    async fn dial(&self, uri: &str) -> Result<D::Store, GraphError> {
        let limit = Duration::from_secs(self.config.connect_timeout_secs);
        match tokio::time::timeout(limit, self.dialer.dial(&self.config, uri)).await {
            Ok(result) => result,
            Err(_) => Err(GraphError::Unavailable(format!(
                "connection to {uri} timed out after {}s",
                self.config.connect_timeout_secs
            ))),
        }
    }

    fn session(&self, store: D::Store, uri: &str) -> Session<D::Store> {
        tracing::debug!(uri = %uri, database = %self.config.database, "Session opened");
        Session {
            store: Some(store),
            uri: uri.to_string(),
            database: self.config.database.clone(),
            query_timeout: Duration::from_secs(self.config.query_timeout_secs),
        }
    }
}

// ── Session ───────────────────────────────────────────────────────

/// A request-scoped store handle. Released by [`Session::close`] or on drop,
/// whichever comes first.
pub struct Session<S: GraphStore> {
    store: Option<S>,
    uri: String,
    database: String,
    query_timeout: Duration,
}

impl<S: GraphStore> Session<S> {
    /// The URI actually connected to, after any scheme fallback.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Run one statement under the per-query timeout.
    pub async fn run(&self, statement: &Statement) -> Result<Vec<Record>, GraphError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| GraphError::Unavailable("session already closed".to_string()))?;

        match tokio::time::timeout(self.query_timeout, store.fetch(statement)).await {
            Ok(result) => result,
            Err(_) => Err(GraphError::Timeout {
                seconds: self.query_timeout.as_secs(),
            }),
        }
    }

    /// Release the session. Never fails.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(store) = self.store.take() {
            store.close();
            tracing::debug!(uri = %self.uri, "Session closed");
        }
    }
}

impl<S: GraphStore> Drop for Session<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedDialer, ScriptedStore};
    use serde_json::json;

    fn config(uri: &str) -> GraphConfig {
        GraphConfig::new(uri, "neo4j", "secret")
    }

    #[test]
    fn test_direct_uri_rewrites_routing_schemes() {
        assert_eq!(direct_uri("neo4j+s://db.example:7687").as_deref(), Some("bolt+s://db.example:7687"));
        assert_eq!(direct_uri("neo4j+ssc://db.example").as_deref(), Some("bolt+ssc://db.example"));
        assert_eq!(direct_uri("neo4j://localhost:7687").as_deref(), Some("bolt://localhost:7687"));
        assert_eq!(direct_uri("bolt://localhost:7687"), None);
        assert_eq!(direct_uri("bolt+s://db.example"), None);
    }

    #[tokio::test]
    async fn test_connects_directly_when_available() {
        let dialer = ScriptedDialer::new(ScriptedStore::new());
        let manager = ConnectionManager::new(config("neo4j+s://db.example"), dialer.clone());

        let session = manager.connect().await.unwrap();
        assert_eq!(session.uri(), "neo4j+s://db.example");
        assert_eq!(dialer.attempts(), vec!["neo4j+s://db.example"]);
    }

    #[tokio::test]
    async fn test_routing_uri_falls_back_once() {
        let dialer = ScriptedDialer::new(ScriptedStore::new())
            .refuse("neo4j+s://db.example", GraphError::Unavailable("no routing table".into()));
        let manager = ConnectionManager::new(config("neo4j+s://db.example"), dialer.clone());

        let session = manager.connect().await.unwrap();
        assert_eq!(session.uri(), "bolt+s://db.example");
        assert_eq!(
            dialer.attempts(),
            vec!["neo4j+s://db.example", "bolt+s://db.example"]
        );
    }

    #[tokio::test]
    async fn test_fallback_failure_propagates() {
        let dialer = ScriptedDialer::new(ScriptedStore::new())
            .refuse("neo4j://db", GraphError::Unavailable("down".into()))
            .refuse("bolt://db", GraphError::Unavailable("still down".into()));
        let manager = ConnectionManager::new(config("neo4j://db"), dialer.clone());

        let err = manager.connect().await.err().unwrap();
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "Neo4j routing/connection failed: still down");
        assert_eq!(dialer.attempts().len(), 2);
    }

    #[tokio::test]
    async fn test_direct_uri_is_not_retried() {
        let dialer = ScriptedDialer::new(ScriptedStore::new())
            .refuse("bolt://db", GraphError::Unavailable("down".into()));
        let manager = ConnectionManager::new(config("bolt://db"), dialer.clone());

        assert!(manager.connect().await.err().unwrap().is_unavailable());
        assert_eq!(dialer.attempts(), vec!["bolt://db"]);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let dialer = ScriptedDialer::new(ScriptedStore::new())
            .refuse("neo4j+s://db", GraphError::Auth("bad credentials".into()));
        let manager = ConnectionManager::new(config("neo4j+s://db"), dialer.clone());

        assert!(manager.connect().await.err().unwrap().is_auth());
        assert_eq!(dialer.attempts(), vec!["neo4j+s://db"]);
    }

    #[tokio::test]
    async fn test_session_releases_store_exactly_once() {
        let store = ScriptedStore::new();
        let manager = ConnectionManager::new(config("bolt://db"), ScriptedDialer::new(store.clone()));

        let session = manager.connect().await.unwrap();
        session.close();
        assert_eq!(store.close_count(), 1);

        {
            let _session = manager.connect().await.unwrap();
        }
        assert_eq!(store.close_count(), 2);
    }

    #[tokio::test]
    async fn test_session_runs_statements_in_order() {
        let store = ScriptedStore::new()
            .respond(vec![Record::from_json(json!({"ok": 1}))])
            .respond(vec![]);
        let manager = ConnectionManager::new(config("bolt://db"), ScriptedDialer::new(store.clone()));
        let session = manager.connect().await.unwrap();

        let first = session.run(&Statement::new("RETURN 1 AS ok")).await.unwrap();
        let second = session.run(&Statement::new("RETURN 2 AS ok")).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());

        let seen: Vec<String> = store.statements().into_iter().map(|s| s.cypher).collect();
        assert_eq!(seen, vec!["RETURN 1 AS ok", "RETURN 2 AS ok"]);
    }

    #[test]
    fn test_config_requires_credentials() {
        let missing: Result<GraphConfig, _> =
            serde_json::from_value(json!({"uri": "bolt://db", "user": "neo4j"}));
        assert!(missing.is_err());

        let cfg: GraphConfig = serde_json::from_value(json!({
            "uri": "bolt://db", "user": "neo4j", "password": "pw"
        }))
        .unwrap();
        assert_eq!(cfg.database, "neo4j");
        assert_eq!(cfg.query_timeout_secs, 30);
        assert!(!format!("{cfg:?}").contains("pw\""));
    }
}
