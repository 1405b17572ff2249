use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use matchmaker::events::{Notifier, OutboundEvent};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Per-connection outbound channel registry (C8), grounded on the
/// teacher's `dashmap`-backed connection pooling. Each WebSocket session
/// registers its sender on connect and deregisters on disconnect; sends
/// to a socket that has since disconnected are silently dropped.
#[derive(Default)]
pub struct WsNotifier {
    sockets: DashMap<String, UnboundedSender<Message>>,
}

impl WsNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, socket_id: &str, sender: UnboundedSender<Message>) {
        self.sockets.insert(socket_id.to_string(), sender);
    }

    pub fn deregister(&self, socket_id: &str) {
        self.sockets.remove(socket_id);
    }
}

fn encode(event: &OutboundEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(err) => {
            warn!(%err, "failed to serialize outbound event");
            None
        }
    }
}

#[async_trait]
impl Notifier for WsNotifier {
    async fn send_to_socket(&self, socket_id: &str, event: OutboundEvent) {
        let Some(message) = encode(&event) else {
            return;
        };
        if let Some(sender) = self.sockets.get(socket_id) {
            if sender.send(message).is_err() {
                warn!(%socket_id, "outbound channel closed, dropping event");
            }
        }
    }

    async fn broadcast(&self, event: OutboundEvent) {
        let Some(message) = encode(&event) else {
            return;
        };
        for entry in self.sockets.iter() {
            let _ = entry.value().send(message.clone());
        }
    }
}
