use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Time-bounded user ban, `penalties(id, user_id, reason, expires_at,
/// created_at)` per §6.
#[derive(Debug, Clone)]
pub struct Penalty {
    pub user_id: String,
    pub reason: String,
    pub expires_at: i64,
}

/// Look up / insert time-bounded user bans (C1). Persistence backend is
/// out of scope; production deployments swap this for a real database
/// without changing the matchmaking core.
#[async_trait]
pub trait PenaltyStore: Send + Sync {
    async fn get_active_penalty(&self, user_id: &str, now_ms: i64) -> Option<Penalty>;
    async fn add_penalty(&self, user_id: &str, duration_seconds: i64, reason: &str, now_ms: i64);
}

/// In-memory default, mirroring the teacher's `RedisCache`: a real
/// key/value API backed by an `Arc<RwLock<HashMap<_>>>` until a
/// persistence backend is wired in.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPenaltyStore {
    penalties: Arc<RwLock<HashMap<String, Penalty>>>,
}

impl InMemoryPenaltyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PenaltyStore for InMemoryPenaltyStore {
    async fn get_active_penalty(&self, user_id: &str, now_ms: i64) -> Option<Penalty> {
        let penalties = self.penalties.read().await;
        penalties
            .get(user_id)
            .filter(|p| p.expires_at > now_ms)
            .cloned()
    }

    async fn add_penalty(&self, user_id: &str, duration_seconds: i64, reason: &str, now_ms: i64) {
        let mut penalties = self.penalties.write().await;
        penalties.insert(
            user_id.to_string(),
            Penalty {
                user_id: user_id.to_string(),
                reason: reason.to_string(),
                expires_at: now_ms + duration_seconds * 1000,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn active_penalty_blocks_until_expiry() {
        let store = InMemoryPenaltyStore::new();
        store.add_penalty("alice", 300, "Matchmaking abuse: timeout", 0).await;

        assert!(store.get_active_penalty("alice", 1_000).await.is_some());
        assert!(store.get_active_penalty("alice", 300_001).await.is_none());
        assert!(store.get_active_penalty("bob", 1_000).await.is_none());
    }
}
