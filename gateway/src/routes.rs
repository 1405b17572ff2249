use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, Router};
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use tracing::error;

use crate::state::AppState;
use crate::ws::ws_handler;

pub const HEALTHZ_PATH: &str = "/healthz";
pub const VERSION_PATH: &str = "/version";
pub const METRICS_PATH: &str = "/metrics";
pub const WS_PATH: &str = "/ws";
pub const QUEUE_PATH: &str = "/matchmaking/queue";

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gateway_http_requests_total",
        "Total HTTP requests by route",
        &["path"]
    )
    .expect("register gateway_http_requests_total")
});

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTHZ_PATH, axum::routing::get(healthz))
        .route(VERSION_PATH, axum::routing::get(version))
        .route(METRICS_PATH, axum::routing::get(metrics))
        .route(QUEUE_PATH, axum::routing::get(queue_stats))
        .route(WS_PATH, axum::routing::get(ws_handler))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    HTTP_REQUESTS_TOTAL.with_label_values(&[HEALTHZ_PATH]).inc();
    axum::http::StatusCode::OK
}

async fn version() -> impl IntoResponse {
    HTTP_REQUESTS_TOTAL.with_label_values(&[VERSION_PATH]).inc();
    Json(serde_json::json!({
        "name": "gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics() -> impl IntoResponse {
    HTTP_REQUESTS_TOTAL.with_label_values(&[METRICS_PATH]).inc();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(%err, "metrics encode failed");
        return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let body = String::from_utf8(buffer).unwrap_or_default();
    axum::response::Response::builder()
        .status(axum::http::StatusCode::OK)
        .header(axum::http::header::CONTENT_TYPE, encoder.format_type())
        .body(axum::body::Body::from(body))
        .unwrap()
}

/// Admin read-only view of current queue/pending-match counts.
async fn queue_stats(State(state): State<AppState>) -> impl IntoResponse {
    HTTP_REQUESTS_TOTAL.with_label_values(&[QUEUE_PATH]).inc();
    let stats = state.engine.queue_stats().await;
    Json(serde_json::json!({
        "size": stats.size,
        "pending": stats.pending,
    }))
}
