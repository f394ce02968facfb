//! Neo4j-backed store, via neo4rs.

use async_trait::async_trait;
use neo4rs::{
    BoltNull, BoltType, ConfigBuilder, Graph, Neo4jClientErrorKind, Neo4jErrorKind,
    Neo4jSecurityErrorKind,
};
use topolens_core::{Param, Record, Statement};

use crate::client::{Dialer, GraphConfig, GraphError, GraphStore};

/// Dials Neo4j with a pooled neo4rs [`Graph`] and verifies it with a probe query.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neo4jDialer;

#[async_trait]
impl Dialer for Neo4jDialer {
    type Store = Neo4jStore;

    async fn dial(&self, config: &GraphConfig, uri: &str) -> Result<Neo4jStore, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(uri)
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Config(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(classify_connect_error)?;

        // Pool creation is lazy; force a round trip so routing and auth
        // failures surface here rather than on the first real query.
        let mut probe = graph
            .execute(neo4rs::query("RETURN 1 AS ok"))
            .await
            .map_err(classify_connect_error)?;
        while probe.next().await.map_err(classify_connect_error)?.is_some() {}

        tracing::info!(uri = %uri, database = %config.database, "Connected to Neo4j");
        Ok(Neo4jStore { graph })
    }
}

/// A verified connection pool for one session.
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Graph,
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, GraphError> {
        let mut query = neo4rs::query(&statement.cypher);
        for (key, value) in &statement.params {
            query = query.param(key, bolt_value(value));
        }

        let mut stream = self.graph.execute(query).await.map_err(classify_query_error)?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await.map_err(classify_query_error)? {
            let mut record = Record::new();
            for column in &statement.columns {
                let value = row.get::<serde_json::Value>(column).unwrap_or_else(|e| {
                    tracing::warn!(column = %column, error = %e, "Undecodable column, treating as null");
                    serde_json::Value::Null
                });
                record.insert(column, value);
            }
            records.push(record);
        }
        Ok(records)
    }
}

fn bolt_value(param: &Param) -> BoltType {
    match param {
        Param::Str(s) => BoltType::from(s.as_str()),
        Param::Int(i) => BoltType::from(*i),
        Param::Null => BoltType::Null(BoltNull),
    }
}

fn is_auth_kind(kind: Neo4jErrorKind) -> bool {
    kind == Neo4jErrorKind::Client(Neo4jClientErrorKind::Security(
        Neo4jSecurityErrorKind::Authentication,
    ))
}

fn is_auth_error(error: &neo4rs::Error) -> bool {
    match error {
        neo4rs::Error::AuthenticationError(_) => true,
        neo4rs::Error::Neo4j(e) => is_auth_kind(e.kind()),
        _ => false,
    }
}

fn is_connection_error(error: &neo4rs::Error) -> bool {
    matches!(
        error,
        neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError
    )
}

fn classify_connect_error(error: neo4rs::Error) -> GraphError {
    if is_auth_error(&error) {
        GraphError::Auth(error.to_string())
    } else {
        GraphError::Unavailable(error.to_string())
    }
}

/// A dropped connection mid-query is still a connectivity failure.
fn classify_query_error(error: neo4rs::Error) -> GraphError {
    if is_auth_error(&error) {
        GraphError::Auth(error.to_string())
    } else if is_connection_error(&error) {
        GraphError::Unavailable(error.to_string())
    } else {
        GraphError::Query(error.to_string())
    }
}
