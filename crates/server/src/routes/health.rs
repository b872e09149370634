use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Liveness probe (GET /healthz)
///
/// `200 UP` while serving, `503` from the moment shutdown begins.
pub async fn healthz(State(state): State<Arc<ServerState>>) -> Response {
    if state.health.is_healthy() {
        (StatusCode::OK, "UP\n").into_response()
    } else {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
}
