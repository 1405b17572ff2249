use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use matchmaker::events::{Notifier, OutboundEvent};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use matchmaker::errors::MatchmakingError;

use crate::auth::authenticate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    token: String,
}

/// Inbound events per §4.6, validated by `serde` before dispatch. An
/// unparseable frame is treated the same as a validation failure: an
/// `error` event on the offending socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum InboundEvent {
    JoinQueue { elo: Option<u32> },
    LeaveQueue,
    AcceptMatch { match_id: String },
    DeclineMatch { match_id: String },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, query.token, state))
}

async fn handle_connection(socket: WebSocket, token: String, state: AppState) {
    let user_id = match authenticate(&token, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => {
            debug!(%err, "websocket handshake rejected");
            return;
        }
    };

    let session_elo = state.users_client.get_user_elo(&user_id).await;
    let socket_id = Uuid::new_v4().to_string();

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.notifier.register(&socket_id, tx);

    let forward = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                dispatch(&state, &user_id, &socket_id, session_elo, &text).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.notifier.deregister(&socket_id);
    state.engine.remove_player(&socket_id).await;
    forward.abort();
}

async fn dispatch(state: &AppState, user_id: &str, socket_id: &str, session_elo: u32, text: &str) {
    if let Err(err) = run_event(state, user_id, socket_id, session_elo, text).await {
        send_error(state, socket_id, &err).await;
    }
}

async fn run_event(
    state: &AppState,
    user_id: &str,
    socket_id: &str,
    session_elo: u32,
    text: &str,
) -> Result<(), MatchmakingError> {
    let event: InboundEvent = serde_json::from_str(text).map_err(|err| MatchmakingError::InvalidPayload {
        details: err.to_string(),
    })?;

    match event {
        InboundEvent::JoinQueue { elo } => {
            state
                .engine
                .add_player(user_id, socket_id, elo.unwrap_or(session_elo), false)
                .await
        }
        InboundEvent::LeaveQueue => {
            state.engine.remove_player(user_id).await;
            Ok(())
        }
        InboundEvent::AcceptMatch { match_id } => state.engine.accept_match(user_id, &match_id).await,
        InboundEvent::DeclineMatch { match_id } => state.engine.decline_match(user_id, &match_id).await,
    }
}

async fn send_error(state: &AppState, socket_id: &str, err: &MatchmakingError) {
    warn!(%socket_id, %err, "rejecting inbound event");
    state
        .notifier
        .send_to_socket(
            socket_id,
            OutboundEvent::Error {
                message: err.to_string(),
                details: None,
            },
        )
        .await;
}
