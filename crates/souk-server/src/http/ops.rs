//! Liveness, readiness, and the metrics snapshot. No envelope here; these
//! endpoints answer probes, not API clients.

use crate::{run_store, store_fail, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use souk_store::StoreError;
use std::sync::atomic::Ordering;

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Ready means the process still accepts work and the database answers a
/// `SELECT 1`.
pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    if !state.accepting_requests.load(Ordering::Relaxed) {
        return (StatusCode::SERVICE_UNAVAILABLE, "not-ready").into_response();
    }
    let ping = run_store(&state, |conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| store_fail(StoreError::from(e)))
    })
    .await;
    match ping {
        Ok(()) => (StatusCode::OK, "ready").into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not-ready").into_response(),
    }
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    Json(state.metrics.snapshot().await).into_response()
}
