use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// `{id, player1Id, player2Id, status: "STARTED", startedAt}` per §3.
#[derive(Debug, Clone)]
pub struct SessionLogEntry {
    pub id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub status: &'static str,
    pub started_at: i64,
}

/// Append-only record of started matches (C2). A write failure is
/// best-effort from the caller's perspective — see Finalize §4.4 step 2.
#[async_trait]
pub trait SessionLog: Send + Sync {
    async fn append(&self, entry: SessionLogEntry) -> Result<(), String>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionLog {
    entries: Arc<RwLock<Vec<SessionLogEntry>>>,
}

impl InMemorySessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<SessionLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl SessionLog for InMemorySessionLog {
    async fn append(&self, entry: SessionLogEntry) -> Result<(), String> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
