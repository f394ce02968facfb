//! Router and handlers.
//!
//! Each data handler opens exactly one session, runs its statements in
//! order, and closes the session before responding. Error paths and
//! cancelled requests release the session on drop.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use topolens_attack::AttackGraphResult;
use topolens_core::{resolve, Statement};
use topolens_graph::{assemble, fetch_topology, Dialer, EdgeRecord, TopologyGraph};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_VIEW: &str = "default";

/// Build the full router. Data routes are served at the root and under
/// `/neo4j`; `/health` only at the root.
pub fn build_router<D: Dialer + 'static>(state: AppState<D>) -> Router {
    let data = Router::new()
        .route("/nodes", get(nodes::<D>))
        .route("/ping", get(ping::<D>))
        .route("/topology", get(topology::<D>))
        .route("/attack-graph", get(attack_graph::<D>));

    Router::new()
        .route("/health", get(health))
        .merge(data.clone())
        .nest("/neo4j", data)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct NodesParams {
    #[serde(rename = "activeView")]
    pub active_view: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttackGraphParams {
    #[serde(rename = "deviceElementId")]
    pub device_element_id: Option<String>,
}

async fn nodes<D: Dialer>(
    State(state): State<AppState<D>>,
    Query(params): Query<NodesParams>,
) -> Result<Json<Vec<EdgeRecord>>, ApiError> {
    let view = params.active_view.as_deref().unwrap_or(DEFAULT_VIEW);
    let plan = resolve(view, params.project.as_deref());
    tracing::debug!(view, project = ?params.project, "Resolved view");

    let session = state.manager.connect().await?;
    let assembly = assemble(&session, &plan).await?;
    session.close();

    Ok(Json(assembly.records()))
}

async fn ping<D: Dialer>(State(state): State<AppState<D>>) -> Response {
    let config = state.manager.config();
    let probe = Statement::new("RETURN 1 AS ok").returns(&["ok"]);

    let outcome = match state.manager.connect().await {
        Ok(session) => {
            let result = session.run(&probe).await.map(|_| session.uri().to_string());
            session.close();
            result
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(uri) => Json(json!({ "ok": true, "uri": uri, "db": config.database })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "ok": false,
                    "uri": config.uri,
                    "db": config.database,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn topology<D: Dialer>(
    State(state): State<AppState<D>>,
) -> Result<Json<TopologyGraph>, ApiError> {
    let session = state.manager.connect().await?;
    let graph = fetch_topology(&session).await?;
    session.close();
    Ok(Json(graph))
}

async fn attack_graph<D: Dialer>(
    State(state): State<AppState<D>>,
    Query(params): Query<AttackGraphParams>,
) -> Result<Json<AttackGraphResult>, ApiError> {
    let device = params
        .device_element_id
        .ok_or(ApiError::MissingParameter("deviceElementId"))?;

    let session = state.manager.connect().await?;
    let result = state.engine.attack_graph(&session, &device).await?;
    session.close();
    Ok(Json(result))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
