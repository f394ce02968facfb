//! Request-boundary error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use topolens_attack::AttackError;
use topolens_graph::GraphError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Missing required query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AttackError> for ApiError {
    fn from(err: AttackError) -> Self {
        match err {
            AttackError::Graph(e) => Self::Graph(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Graph(GraphError::Auth(_)) => StatusCode::UNAUTHORIZED,
            Self::Graph(GraphError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Graph(GraphError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Graph(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        if status.is_server_error() || status == StatusCode::UNAUTHORIZED {
            tracing::error!(status = status.as_u16(), %detail, "Request failed");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
