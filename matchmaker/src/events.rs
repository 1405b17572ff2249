use async_trait::async_trait;
use serde::Serialize;

/// Outbound events (C7). Socket-targeted unless noted as a broadcast.
/// Serialized as `{"event": "...", "data": {...}}` for the gateway to
/// forward verbatim over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    QueueJoined {
        user_id: String,
        elo: u32,
        timestamp: i64,
        priority: bool,
    },
    QueueLeft {
        user_id: String,
        timestamp: i64,
    },
    QueueStats {
        size: usize,
        pending: usize,
    },
    MatchProposal {
        match_id: String,
        expires_at: i64,
        opponent_elo: u32,
    },
    MatchConfirmed {
        game_id: String,
        player1_id: String,
        player2_id: String,
    },
    MatchFailed {
        match_id: String,
        reason: String,
        error_code: String,
        message: String,
    },
    MatchCancelled {
        match_id: String,
        reason: String,
    },
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Outbound event emission to specific sockets and broadcast (C7).
/// Implementations must not block the mutator context for long; the
/// production adapter hands off to per-connection channels.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_to_socket(&self, socket_id: &str, event: OutboundEvent);
    async fn broadcast(&self, event: OutboundEvent);
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use tokio::sync::Mutex;

    /// In-memory `Notifier` used by the matchmaker's own tests: records
    /// every emission instead of delivering it anywhere.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, OutboundEvent)>>,
        pub broadcasts: Mutex<Vec<OutboundEvent>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_to_socket(&self, socket_id: &str, event: OutboundEvent) {
            self.sent.lock().await.push((socket_id.to_string(), event));
        }

        async fn broadcast(&self, event: OutboundEvent) {
            self.broadcasts.lock().await.push(event);
        }
    }
}
