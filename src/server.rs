// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP surface for the caching proxy.
//!
//! Two routes: `POST /` takes a JSON-RPC request object, `GET /printstats`
//! returns (and logs) a counters snapshot without terminating the process.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::proxy::{RequestCoordinator, RpcRequest};

/// Builds the HTTP router over a shared coordinator
pub fn router(coordinator: Arc<RequestCoordinator>) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .route("/printstats", get(print_stats))
        .with_state(coordinator)
}

/// JSON-RPC parse-error envelope for bodies that are not a request object.
fn parse_error_envelope() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": { "code": -32700, "message": "Parse error" }
    })
}

async fn handle_rpc(
    State(coordinator): State<Arc<RequestCoordinator>>,
    body: String,
) -> Response {
    let request: RpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(parse_error) => {
            debug!(error = %parse_error, "rejecting malformed request body");
            return (StatusCode::BAD_REQUEST, Json(parse_error_envelope())).into_response();
        }
    };

    match coordinator.handle(request).await {
        Ok(response) => Json(response.into_body()).into_response(),
        Err(failure) => {
            error!(error = %failure, class = failure.class(), "upstream failed after retries");
            (StatusCode::BAD_GATEWAY, Json(failure.to_body())).into_response()
        }
    }
}

async fn print_stats(State(coordinator): State<Arc<RequestCoordinator>>) -> Response {
    let snapshot = coordinator.snapshot().await;
    info!(%snapshot, "stats snapshot");
    Json(snapshot).into_response()
}
