//! topolens-graph: Neo4j access for the topology service.
//!
//! Every request opens exactly one [`Session`] through the
//! [`ConnectionManager`], runs its statements in order, and releases the
//! session on every exit path. The store itself sits behind the
//! [`GraphStore`]/[`Dialer`] traits so that everything above the neo4rs
//! adapter runs against scripted stores in tests.

pub mod assemble;
pub mod client;
pub mod neo4j;
pub mod topology;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use assemble::{assemble, EdgeRecord, GraphAssembly};
pub use client::{ConnectionManager, Dialer, GraphConfig, GraphError, GraphStore, Session};
pub use neo4j::{Neo4jDialer, Neo4jStore};
pub use topology::{fetch_topology, TopologyGraph};
