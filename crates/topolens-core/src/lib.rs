//! topolens-core: Shared types, view resolution, and entity normalization.
//!
//! This crate holds everything that does not need a live graph store:
//! - Identity and layer types for normalized topology entities
//! - The total entity normalizer (raw store value → normalized record)
//! - The view resolver mapping a view name to parametrized Cypher plans
//! - Visualization node/edge shapes shared by the topology and attack graph
//! - Layered configuration loading

pub mod config;
pub mod error;
pub mod normalize;
pub mod statement;
pub mod types;
pub mod view;
pub mod vis;

pub use error::CoreError;
pub use normalize::{normalize, NormalizedEntity};
pub use statement::{Param, Record, Statement};
pub use types::{EdgeTag, EntityId, Layer, NormalizedEdge, NormalizedNode};
pub use view::{resolve, ExecutionPlan, RowMapping, ViewKind, ViewSpec};
