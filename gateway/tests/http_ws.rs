use std::net::SocketAddr;
use std::time::Duration;

use common_net::config::MatchmakingSettings;
use common_net::telemetry;
use futures_util::{SinkExt, StreamExt};
use gateway::auth::authenticate;
use gateway::{build_state, routes};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

type BoxError = common_net::metrics::BoxError;

fn test_settings(bind_addr: SocketAddr) -> MatchmakingSettings {
    MatchmakingSettings {
        bind_addr,
        game_service_url: "http://127.0.0.1:1".to_string(),
        user_service_url: "http://127.0.0.1:1".to_string(),
        jwt_secret: "test-secret".to_string(),
        tick_rate_ms: 50,
        base_tolerance: 50.0,
        expansion_interval_ms: 10_000,
        expansion_step: 1.0,
        match_accept_timeout_ms: 15_000,
        penalty_duration_seconds: 300,
        game_client_timeout_ms: 200,
        default_elo: 1000,
    }
}

async fn spawn_gateway() -> Result<(SocketAddr, oneshot::Sender<()>, JoinHandle<()>, String), BoxError> {
    telemetry::init("gateway-test");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let settings = test_settings(addr);
    let jwt_secret = settings.jwt_secret.clone();
    let state = build_state(&settings);
    let app = routes::build_router(state);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(err) = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(%err, "gateway test server failed");
        }
    });

    Ok((addr, shutdown_tx, server, jwt_secret))
}

#[derive(Serialize)]
struct TestClaims {
    id: i64,
    exp: usize,
}

fn token_for(user_id: i64, secret: &str) -> String {
    let claims = TestClaims {
        id: user_id,
        exp: 9_999_999_999,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[tokio::test]
async fn http_endpoints_work() -> Result<(), BoxError> {
    let (addr, shutdown_tx, server, _secret) = spawn_gateway().await?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let base = format!("http://{}", addr);

    let health = client.get(format!("{base}/healthz")).send().await?;
    assert_eq!(StatusCode::OK, health.status());

    let version_resp = client.get(format!("{base}/version")).send().await?;
    assert_eq!(StatusCode::OK, version_resp.status());
    let version_body: serde_json::Value = version_resp.json().await?;
    assert_eq!("gateway", version_body["name"]);

    let metrics_resp = client.get(format!("{base}/metrics")).send().await?;
    assert_eq!(StatusCode::OK, metrics_resp.status());
    let metrics_text = metrics_resp.text().await?;
    assert!(metrics_text.contains("gateway_http_requests_total"));

    let queue_resp = client
        .get(format!("{base}/matchmaking/queue"))
        .send()
        .await?;
    assert_eq!(StatusCode::OK, queue_resp.status());
    let queue_body: serde_json::Value = queue_resp.json().await?;
    assert_eq!(0, queue_body["size"]);

    shutdown_tx.send(()).ok();
    let _ = server.await;
    Ok(())
}

#[tokio::test]
async fn websocket_join_queue_round_trip() -> Result<(), BoxError> {
    let (addr, shutdown_tx, server, secret) = spawn_gateway().await?;
    let token = token_for(7, &secret);
    let url = format!("ws://{addr}/ws?token={token}");

    let (mut ws, _) = tokio_tungstenite::connect_async(url).await?;
    ws.send(WsMessage::Text(
        serde_json::json!({"event": "join_queue", "data": {"elo": 1200}}).to_string(),
    ))
    .await?;

    let reply = ws.next().await.expect("a reply")?;
    let WsMessage::Text(text) = reply else {
        panic!("expected a text frame");
    };
    let parsed: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!("queue_joined", parsed["event"]);
    assert_eq!(1200, parsed["data"]["elo"]);

    ws.close(None).await.ok();
    shutdown_tx.send(()).ok();
    let _ = server.await;
    Ok(())
}

#[test]
fn auth_rejects_invalid_token() {
    let err = authenticate("not-a-token", "secret").unwrap_err();
    assert!(matches!(err, gateway::auth::AuthError::InvalidToken));
}
