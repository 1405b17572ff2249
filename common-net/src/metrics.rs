use std::net::SocketAddr;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use once_cell::sync::OnceCell;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Metric set for the matchmaking core.
pub struct MatchmakingMetrics {
    pub queue_depth: IntGauge,
    pub pending_matches: IntGauge,
    pub matches_created_total: IntCounter,
    pub matches_cancelled_total: IntCounterVec,
    pub penalties_issued_total: IntCounter,
    pub game_client_fallback_total: IntCounter,
}

impl MatchmakingMetrics {
    pub fn on_startup(&self) {
        self.queue_depth.set(0);
        self.pending_matches.set(0);
        self.matches_created_total.inc_by(0);
        self.penalties_issued_total.inc_by(0);
        self.game_client_fallback_total.inc_by(0);
    }

    pub fn set_queue_depth(&self, depth: i64) {
        self.queue_depth.set(depth);
    }

    pub fn set_pending_matches(&self, pending: i64) {
        self.pending_matches.set(pending);
    }

    pub fn inc_matches_created(&self) {
        self.matches_created_total.inc();
    }

    pub fn inc_matches_cancelled(&self, reason: &str) {
        self.matches_cancelled_total.with_label_values(&[reason]).inc();
    }

    pub fn inc_penalties_issued(&self) {
        self.penalties_issued_total.inc();
    }

    pub fn inc_game_client_fallback(&self) {
        self.game_client_fallback_total.inc();
    }
}

static MATCHMAKING_METRICS: OnceCell<MatchmakingMetrics> = OnceCell::new();

pub fn matchmaking_metrics() -> &'static MatchmakingMetrics {
    MATCHMAKING_METRICS.get_or_init(|| MatchmakingMetrics {
        queue_depth: register_int_gauge!(
            "matchmaking_queue_depth",
            "So luong nguoi choi dang cho trong hang doi matchmaking"
        )
        .expect("register matchmaking_queue_depth"),
        pending_matches: register_int_gauge!(
            "matchmaking_pending_matches",
            "So luong tran dau dang cho xac nhan"
        )
        .expect("register matchmaking_pending_matches"),
        matches_created_total: register_int_counter!(
            "matchmaking_matches_created_total",
            "Tong so tran dau da duoc tao thanh cong"
        )
        .expect("register matchmaking_matches_created_total"),
        matches_cancelled_total: register_int_counter_vec!(
            "matchmaking_matches_cancelled_total",
            "Tong so tran dau bi huy, theo ly do",
            &["reason"]
        )
        .expect("register matchmaking_matches_cancelled_total"),
        penalties_issued_total: register_int_counter!(
            "matchmaking_penalties_issued_total",
            "Tong so penalty da duoc ghi nhan"
        )
        .expect("register matchmaking_penalties_issued_total"),
        game_client_fallback_total: register_int_counter!(
            "matchmaking_game_client_fallback_total",
            "So lan Game Client tra ve ket qua fallback"
        )
        .expect("register matchmaking_game_client_fallback_total"),
    })
}

pub fn metrics_router(metrics_path: &'static str) -> Router {
    Router::new().route(metrics_path, get(metrics_handler))
}

pub async fn serve_metrics(
    listener: TcpListener,
    metrics_path: &'static str,
) -> Result<(), BoxError> {
    let router = metrics_router(metrics_path);
    axum::serve(listener, router)
        .await
        .map_err(|err| Box::new(err) as BoxError)
}

pub fn spawn_metrics_exporter(
    addr: SocketAddr,
    metrics_path: &'static str,
    service_name: &'static str,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(err) = serve_metrics(listener, metrics_path).await {
                    error!(%err, service = service_name, %addr, path = metrics_path, "metrics exporter dung bat thuong");
                }
            }
            Err(err) => {
                error!(%err, service = service_name, %addr, path = metrics_path, "metrics exporter khong the bind");
            }
        }
    })
}

async fn metrics_handler() -> impl IntoResponse {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(%err, "metrics: encode that bai");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let body = match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(err) => {
            error!(%err, "metrics: UTF-8 sai");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(Body::from(body))
        .unwrap()
}
