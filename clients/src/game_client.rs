use std::time::Duration;

use async_trait::async_trait;
use matchmaker::ports::{CreateGameOutcome, CreateGameRequest, GameClient, GameClientErrorCode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameBody {
    game_id: String,
    player1_id: String,
    player2_id: String,
}

/// The Game service always answers with 200 and encodes success/failure
/// in the body's `success` flag (§6), so the response is parsed once and
/// branched on that field rather than on HTTP status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameResponse {
    success: bool,
    game_id: Option<String>,
    error: Option<GameClientErrorCode>,
    message: String,
}

/// HTTP adapter for the Game service (C3), grounded on the teacher's
/// `PocketBaseClient`: a `reqwest::Client` plus `base_url`, status-based
/// success/error branching. Unlike `PocketBaseClient`, failures never
/// propagate as `Err` — they're synthesized into a fallback
/// `CreateGameOutcome::Failure` carrying a `"fallback"`-marked message, per
/// the Game Client contract in §4.4.
#[derive(Debug, Clone)]
pub struct HttpGameClient {
    client: Client,
    base_url: String,
}

impl HttpGameClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is valid");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn fallback(&self, detail: impl std::fmt::Display) -> CreateGameOutcome {
        CreateGameOutcome::fallback(format!("fallback: game service unreachable: {detail}"))
    }
}

#[async_trait]
impl GameClient for HttpGameClient {
    async fn create_game(&self, request: CreateGameRequest) -> CreateGameOutcome {
        let url = format!("{}/games", self.base_url);
        let request_game_id = request.game_id.clone();
        let body = CreateGameBody {
            game_id: request.game_id,
            player1_id: request.player1_id,
            player2_id: request.player2_id,
        };

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "create_game request failed, falling back");
                return self.fallback(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "create_game returned a non-2xx status, falling back");
            return self.fallback(format!("status {status}"));
        }

        match response.json::<CreateGameResponse>().await {
            Ok(parsed) if parsed.success => CreateGameOutcome::Success {
                game_id: parsed.game_id.unwrap_or(request_game_id),
                message: parsed.message,
            },
            Ok(parsed) => CreateGameOutcome::Failure {
                error: parsed.error.unwrap_or(GameClientErrorCode::InvalidPlayers),
                message: parsed.message,
            },
            Err(err) => {
                error!(%err, "create_game returned a 2xx with an unparseable body");
                self.fallback(err)
            }
        }
    }

    async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        matches!(self.client.get(&url).send().await, Ok(response) if response.status().is_success())
    }
}
