//! View resolution: view name → typed view kind → Cypher execution plan.
//!
//! The client toggles between a small, fixed set of traversal shapes over
//! the topology (network layer, project boundary, zone, subnet). Each one
//! is a [`ViewKind`] variant carrying its own typed parameters; parsing the
//! raw name happens once, and malformed suffixes disable the filter rather
//! than fail.

use crate::normalize::{project_node, project_relationship};
use crate::statement::{Param, Statement};
use crate::types::Layer;

/// Source node column.
pub const SOURCE_COLUMN: &str = "n";
/// Relationship column.
pub const RELATIONSHIP_COLUMN: &str = "r";
/// Target node column.
pub const TARGET_COLUMN: &str = "t";
/// Relationship kind column of multi-layer patterns.
pub const REL_TYPE_COLUMN: &str = "rel_type";
/// Lower-cased relationship layer column of the generic edge pattern.
pub const LAYER_COLUMN: &str = "_layer";

const HOSTS_LIMIT: u32 = 400;
const USES_LIMIT: u32 = 400;
const PHYSICAL_LIMIT: u32 = 78;
const TARGET_LIMIT: u32 = 500;

/// A parsed view with its typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    /// Physical→HOSTS→Logical, Logical→USES→Persona, Physical-Physical.
    MultiLayer { project: Option<String> },
    /// Facility-project edges, any labels.
    Target,
    /// Reserved; always empty.
    External,
    /// Device edges whose relationship layer token equals the layer.
    Layer(Layer),
    /// Device edges crossing a project boundary.
    CrossProject,
    InternalOnly,
    ExternalOnly,
    /// `None` zone means the suffix did not parse and no filter applies.
    Zone { zone: Option<i64>, strict: bool },
    /// `None` subnet means the name was empty after trimming.
    Subnet(Option<String>),
    Default,
}

impl ViewKind {
    /// Parse a view name. Never fails; unknown names resolve to `Default`.
    ///
    /// `project` only applies to the multi-layer view.
    pub fn parse(name: &str, project: Option<&str>) -> Self {
        match name {
            "3layer" | "cyber3layer" | "threelayer" | "multilayer" => Self::MultiLayer {
                project: project.map(str::to_string),
            },
            "target" => Self::Target,
            "external" => Self::External,
            "physical" => Self::Layer(Layer::Physical),
            "logical" => Self::Layer(Layer::Logical),
            "persona" => Self::Layer(Layer::Persona),
            "externalInternal" => Self::CrossProject,
            "internalOnly" | "internaltopology" => Self::InternalOnly,
            "externalOnly" => Self::ExternalOnly,
            _ => {
                if let Some(rest) = name.strip_prefix("zone") {
                    Self::parse_zone(rest)
                } else if let Some(subnet) = name.strip_prefix("subnet:") {
                    let subnet = subnet.trim();
                    Self::Subnet((!subnet.is_empty()).then(|| subnet.to_string()))
                } else {
                    Self::Default
                }
            }
        }
    }

    fn parse_zone(rest: &str) -> Self {
        let (number, strict) = match rest.strip_suffix("_strict") {
            Some(number) => (number, true),
            None => (rest, false),
        };
        let zone = number.parse::<i64>().ok();
        if zone.is_none() {
            tracing::debug!(suffix = %rest, "Zone suffix is not numeric; zone filter disabled");
        }
        Self::Zone { zone, strict }
    }

    /// Build the execution plan for this view.
    pub fn plan(&self) -> ExecutionPlan {
        let specs = match self {
            Self::MultiLayer { project } => multi_layer_specs(project.as_deref()),
            Self::Target => vec![ViewSpec {
                statement: target_statement(),
                mapping: RowMapping::Flat,
            }],
            Self::External => Vec::new(),
            other => vec![ViewSpec {
                statement: generic_statement(other),
                mapping: RowMapping::Flat,
            }],
        };
        ExecutionPlan {
            view: self.clone(),
            specs,
        }
    }
}

/// How rows of a statement map onto node/edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMapping {
    /// Endpoints and first relationship of a matched path, tagged with the
    /// `rel_type` column as the edge's `rel`.
    Path,
    /// Flat `n`, `r`, `t` columns; a non-empty `_layer` column becomes the
    /// edge's `layer`.
    Flat,
}

/// One query of a plan together with its row mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSpec {
    pub statement: Statement,
    pub mapping: RowMapping,
}

/// Everything needed to answer one view request. Executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub view: ViewKind,
    pub specs: Vec<ViewSpec>,
}

/// Resolve a view name and optional project filter to an execution plan.
pub fn resolve(view_name: &str, project: Option<&str>) -> ExecutionPlan {
    ViewKind::parse(view_name, project).plan()
}

fn entity_columns() -> String {
    format!(
        "{} AS {SOURCE_COLUMN}, {} AS {RELATIONSHIP_COLUMN}, {} AS {TARGET_COLUMN}",
        project_node(SOURCE_COLUMN),
        project_relationship(RELATIONSHIP_COLUMN),
        project_node(TARGET_COLUMN),
    )
}

// ── Multi-layer ───────────────────────────────────────────────────

fn multi_layer_specs(project: Option<&str>) -> Vec<ViewSpec> {
    let patterns = [
        ("(a:Physical)-[:HOSTS]->(b:Logical)", "HOSTS", HOSTS_LIMIT),
        ("(a:Logical)-[:USES]->(b:Persona)", "USES", USES_LIMIT),
        ("(a:Physical)-[]-(b:Physical)", "PHYSICAL", PHYSICAL_LIMIT),
    ];

    patterns
        .into_iter()
        .map(|(pattern, rel_type, limit)| {
            let cypher = format!(
                "MATCH p = {pattern}
                 WHERE $project IS NULL
                    OR coalesce(a.project, '') = $project
                    OR coalesce(b.project, '') = $project
                 WITH p LIMIT {limit}
                 WITH nodes(p)[0] AS {SOURCE_COLUMN},
                      relationships(p)[0] AS {RELATIONSHIP_COLUMN},
                      last(nodes(p)) AS {TARGET_COLUMN}
                 RETURN {columns}, '{rel_type}' AS {REL_TYPE_COLUMN}",
                columns = entity_columns(),
            );
            ViewSpec {
                statement: Statement::new(cypher)
                    .param("project", project)
                    .returns(&[
                        SOURCE_COLUMN,
                        RELATIONSHIP_COLUMN,
                        TARGET_COLUMN,
                        REL_TYPE_COLUMN,
                    ]),
                mapping: RowMapping::Path,
            }
        })
        .collect()
}

// ── Target ────────────────────────────────────────────────────────

fn target_statement() -> Statement {
    Statement::new(format!(
        "MATCH (n)-[r]->(t)
         WHERE n.project = 'facility' AND t.project = 'facility'
         RETURN {columns}
         ORDER BY rand()
         LIMIT {TARGET_LIMIT}",
        columns = entity_columns(),
    ))
    .returns(&[SOURCE_COLUMN, RELATIONSHIP_COLUMN, TARGET_COLUMN])
}

// ── Generic Device→Device edges ───────────────────────────────────

fn generic_statement(view: &ViewKind) -> Statement {
    let mut params: Vec<(&str, Param)> = Vec::new();
    let predicate = match view {
        ViewKind::Layer(layer) => {
            params.push(("rtype", layer.as_str().into()));
            Some(format!("{LAYER_COLUMN} = $rtype"))
        }
        ViewKind::CrossProject => {
            Some("coalesce(n.project, '') <> coalesce(t.project, '')".to_string())
        }
        ViewKind::InternalOnly => Some(
            "coalesce(n.project, '') = 'internal' AND coalesce(t.project, '') = 'internal'"
                .to_string(),
        ),
        ViewKind::ExternalOnly => Some(
            "coalesce(n.project, '') = 'external' AND coalesce(t.project, '') = 'external'"
                .to_string(),
        ),
        ViewKind::Zone {
            zone: Some(zone),
            strict,
        } => {
            params.push(("zone", (*zone).into()));
            Some(if *strict {
                "n.zone = $zone AND t.zone = $zone".to_string()
            } else {
                "(n.zone = $zone OR t.zone = $zone)".to_string()
            })
        }
        ViewKind::Subnet(Some(subnet)) => {
            params.push(("subnet", subnet.as_str().into()));
            Some("n.subnet = $subnet AND t.subnet = $subnet".to_string())
        }
        _ => None,
    };

    let where_clause = predicate
        .map(|p| format!("WHERE {p}"))
        .unwrap_or_default();

    let cypher = format!(
        "MATCH (n:Device)-[r]->(t:Device)
         WITH n, r, t, toLower(coalesce(r.type, type(r))) AS {LAYER_COLUMN}
         {where_clause}
         RETURN {columns}, {LAYER_COLUMN}
         ORDER BY rand()",
        columns = entity_columns(),
    );

    params
        .into_iter()
        .fold(Statement::new(cypher), |stmt, (key, value)| stmt.param(key, value))
        .returns(&[SOURCE_COLUMN, RELATIONSHIP_COLUMN, TARGET_COLUMN, LAYER_COLUMN])
}
