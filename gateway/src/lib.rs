// Gateway library: router + connection-lifecycle wiring used by both
// the binary entrypoint (src/main.rs) and integration tests.

use std::sync::Arc;
use std::time::Duration;

use clients::{HttpGameClient, HttpUsersClient};
use common_net::config::MatchmakingSettings;
use matchmaker::stores::{InMemoryPenaltyStore, InMemorySessionLog};
use matchmaker::{EngineConfig, MatchmakingEngine};
use tokio::sync::oneshot;
use tracing::error;

pub mod auth;
pub mod notifier;
pub mod routes;
pub mod state;
pub mod ws;

use notifier::WsNotifier;
use state::AppState;

pub type BoxError = common_net::metrics::BoxError;

pub struct GatewayConfig {
    pub settings: MatchmakingSettings,
    pub ready_tx: Option<oneshot::Sender<std::net::SocketAddr>>,
}

impl GatewayConfig {
    pub fn from_settings(settings: MatchmakingSettings) -> Self {
        Self {
            settings,
            ready_tx: None,
        }
    }

    pub fn from_env() -> Result<Self, BoxError> {
        MatchmakingSettings::from_env().map(Self::from_settings)
    }
}

/// Wires the matchmaking core (C1-C7) to its HTTP collaborators and
/// builds the gateway's `AppState`.
pub fn build_state(settings: &MatchmakingSettings) -> AppState {
    let penalty_store = Arc::new(InMemoryPenaltyStore::new());
    let session_log = Arc::new(InMemorySessionLog::new());
    let game_client_timeout = Duration::from_millis(settings.game_client_timeout_ms);
    let game_client = Arc::new(HttpGameClient::new(
        settings.game_service_url.clone(),
        game_client_timeout,
    ));
    let users_client = Arc::new(HttpUsersClient::new(
        settings.user_service_url.clone(),
        game_client_timeout,
        settings.default_elo,
    ));
    let notifier = Arc::new(WsNotifier::new());

    let engine = MatchmakingEngine::new(
        EngineConfig::from(settings),
        penalty_store,
        session_log,
        game_client,
        notifier.clone(),
    );

    AppState {
        engine,
        users_client,
        notifier,
        jwt_secret: Arc::from(settings.jwt_secret.as_str()),
    }
}

pub async fn run(
    config: GatewayConfig,
    shutdown_rx: common_net::shutdown::ShutdownReceiver,
) -> Result<(), BoxError> {
    let state = build_state(&config.settings);
    let ticker_shutdown = shutdown_rx.clone();
    let ticker_handle = state.engine.spawn_ticker(ticker_shutdown);

    let listener = tokio::net::TcpListener::bind(config.settings.bind_addr)
        .await
        .map_err(|e| Box::new(e) as BoxError)?;
    let local_addr = listener.local_addr().map_err(|e| Box::new(e) as BoxError)?;
    if let Some(tx) = config.ready_tx {
        let _ = tx.send(local_addr);
    }

    let app = routes::build_router(state);
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app.into_make_service()).await {
            error!(%err, "gateway server stopped unexpectedly");
        }
    });

    common_net::shutdown::wait(shutdown_rx).await;
    server.abort();
    ticker_handle.abort();
    Ok(())
}
