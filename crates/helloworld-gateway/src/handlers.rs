use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use helloworld_common::Error;
use serde_json::json;
use tracing::error;

use crate::assets::{HELLO_WORLD_PAGE, INDEX_PAGE, asset_response};
use crate::state::SharedState;

/// Error returned by JSON API handlers.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("request failed: {}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn home_page() -> Response {
    asset_response(INDEX_PAGE)
}

pub async fn hello_world() -> Response {
    asset_response(HELLO_WORLD_PAGE)
}

pub async fn hello_vars(Path((var1, var2)): Path<(String, String)>) -> String {
    format!("Path params: {var1} {var2}\n")
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    // Read live so a degraded start stays visible.
    let schema_version = state.database.schema_version().ok().map(|v| v.get());
    let database = state
        .database
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());

    Json(json!({
        "status": "running",
        "schema_version": schema_version,
        "database": database,
        "migration": state.migration,
    }))
}

pub async fn greetings(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let greetings = state.database.greetings()?;
    Ok(Json(greetings).into_response())
}

/// Anything no route claimed is looked up among the embedded UI files.
pub async fn static_file(uri: Uri) -> Response {
    asset_response(uri.path().trim_start_matches('/'))
}
