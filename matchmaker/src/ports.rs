use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Business-level error codes the Game service may report. Transport and
/// validation failures are synthesized into `GameAlreadyExists` with a
/// `"fallback"` marker in the message — they never reach the caller as a
/// raw transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameClientErrorCode {
    GameAlreadyExists,
    PlayerAlreadyInGame,
    InvalidPlayers,
}

impl GameClientErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GameAlreadyExists => "GAME_ALREADY_EXISTS",
            Self::PlayerAlreadyInGame => "PLAYER_ALREADY_IN_GAME",
            Self::InvalidPlayers => "INVALID_PLAYERS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateGameRequest {
    pub game_id: String,
    pub player1_id: String,
    pub player2_id: String,
}

/// Discriminated result of `createGame`. The client MUST return this type
/// and MUST NOT propagate transport errors — see §4.4's Game Client
/// contract.
#[derive(Debug, Clone)]
pub enum CreateGameOutcome {
    Success { game_id: String, message: String },
    Failure { error: GameClientErrorCode, message: String },
}

impl CreateGameOutcome {
    pub fn fallback(message: impl Into<String>) -> Self {
        let message = message.into();
        debug_assert!(
            message.contains("fallback"),
            "fallback outcome message must carry the \"fallback\" marker"
        );
        Self::Failure {
            error: GameClientErrorCode::GameAlreadyExists,
            message,
        }
    }
}

/// Remote create-game call with timeout and fallback (C3).
#[async_trait]
pub trait GameClient: Send + Sync {
    async fn create_game(&self, request: CreateGameRequest) -> CreateGameOutcome;
    async fn health(&self) -> bool;
}

/// Skill-rating snapshot lookup, consulted only at connection time (C3
/// sibling).
#[async_trait]
pub trait UsersClient: Send + Sync {
    async fn get_user_elo(&self, user_id: &str) -> u32;
}
