use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::server::Server;

/// Query parameters for `GET /resources`.
#[derive(Debug, Deserialize)]
struct FetchParams {
    uri: String,
}

/// Expose a [`Server`]'s invocation API over HTTP.
///
/// Dispatch outcomes always serialize as the envelope with HTTP 200 —
/// success and failure travel inside the body, not the status line. The
/// server sits behind an `Arc`; concurrent requests dispatch without any
/// serialization between them.
pub fn http_router(server: Server) -> Router {
    let state = Arc::new(server);

    Router::new()
        .route("/tools", get(handle_list_tools))
        .route("/tools/{name}", post(handle_invoke_tool))
        .route("/resources", get(handle_fetch_resource))
        .route("/prompts/{name}", get(handle_render_prompt))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

async fn handle_healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn handle_list_tools(State(server): State<Arc<Server>>) -> Response {
    Json(json!({"tools": server.list_tools()})).into_response()
}

async fn handle_invoke_tool(
    State(server): State<Arc<Server>>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Response {
    Json(server.invoke_tool(&name, args).await).into_response()
}

async fn handle_fetch_resource(
    State(server): State<Arc<Server>>,
    Query(params): Query<FetchParams>,
) -> Response {
    Json(server.fetch_resource(&params.uri).await).into_response()
}

async fn handle_render_prompt(
    State(server): State<Arc<Server>>,
    Path(name): Path<String>,
) -> Response {
    match server.render_prompt(&name) {
        Ok(text) => text.into_response(),
        Err(err) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
    }
}
