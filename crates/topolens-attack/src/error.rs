//! Error types for the topolens-attack crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttackError {
    #[error("Graph error: {0}")]
    Graph(#[from] topolens_graph::GraphError),

    #[error("Invalid reachability configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AttackError>;
