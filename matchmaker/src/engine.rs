use std::sync::Arc;
use std::time::Duration;

use common_net::time::now_ms;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::MatchmakingError;
use crate::events::{Notifier, OutboundEvent};
use crate::matcher::{self, EngineConfig};
use crate::model::{MatchParticipant, PendingMatch, QueueStats, QueuedPlayer};
use crate::ports::GameClient;
use crate::queue::QueueState;
use crate::stores::{PenaltyStore, SessionLog};

struct EngineInner {
    state: Mutex<QueueState>,
    config: EngineConfig,
    penalty_store: Arc<dyn PenaltyStore>,
    session_log: Arc<dyn SessionLog>,
    game_client: Arc<dyn GameClient>,
    notifier: Arc<dyn Notifier>,
}

/// The matchmaking core (C4-C7), orchestrating a single mutex-guarded
/// `QueueState` per §5's lock-guarded concurrency model. Cheaply
/// cloneable (an `Arc` handle) so the tick loop and per-match expiration
/// timers can each hold their own reference.
#[derive(Clone)]
pub struct MatchmakingEngine(Arc<EngineInner>);

impl MatchmakingEngine {
    pub fn new(
        config: EngineConfig,
        penalty_store: Arc<dyn PenaltyStore>,
        session_log: Arc<dyn SessionLog>,
        game_client: Arc<dyn GameClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        common_net::metrics::matchmaking_metrics().on_startup();
        Self(Arc::new(EngineInner {
            state: Mutex::new(QueueState::new()),
            config,
            penalty_store,
            session_log,
            game_client,
            notifier,
        }))
    }

    pub fn config(&self) -> EngineConfig {
        self.0.config
    }

    /// `addPlayer` (§4.1). Checks `Banned` against the Penalty Store,
    /// then `AlreadyQueued`/`SocketBusy` against the queue indices, then
    /// emits `queue_joined` and broadcasts `queue_stats`.
    pub async fn add_player(
        &self,
        user_id: &str,
        socket_id: &str,
        elo: u32,
        priority: bool,
    ) -> Result<(), MatchmakingError> {
        let now = now_ms();
        let mut state = self.0.state.lock().await;
        self.add_player_locked(&mut state, user_id, socket_id, elo, priority, now)
            .await
    }

    /// Shared by `add_player` and every internal re-queue path (cancel,
    /// finalize-failure) so they reuse the already-held lock instead of
    /// re-entering `add_player` and deadlocking on the mutex.
    pub(crate) async fn add_player_locked(
        &self,
        state: &mut QueueState,
        user_id: &str,
        socket_id: &str,
        elo: u32,
        priority: bool,
        now: i64,
    ) -> Result<(), MatchmakingError> {
        if let Some(penalty) = self.0.penalty_store.get_active_penalty(user_id, now).await {
            return Err(MatchmakingError::Banned {
                expires_at: penalty.expires_at,
            });
        }
        state.check_can_add(user_id, socket_id)?;
        state.insert_waiting(QueuedPlayer::new(
            user_id.to_string(),
            socket_id.to_string(),
            elo,
            priority,
            now,
        ));

        let stats = state.stats();
        common_net::metrics::matchmaking_metrics().set_queue_depth(stats.size as i64);
        self.0
            .notifier
            .send_to_socket(
                socket_id,
                OutboundEvent::QueueJoined {
                    user_id: user_id.to_string(),
                    elo,
                    timestamp: now,
                    priority,
                },
            )
            .await;
        self.0
            .notifier
            .broadcast(OutboundEvent::QueueStats {
                size: stats.size,
                pending: stats.pending,
            })
            .await;

        Ok(())
    }

    /// `removePlayer` (§4.1). Idempotent; does not touch `PendingMatches`.
    pub async fn remove_player(&self, identifier: &str) {
        let now = now_ms();
        let mut state = self.0.state.lock().await;
        let Some(player) = state.remove_player(identifier) else {
            return;
        };
        common_net::metrics::matchmaking_metrics().set_queue_depth(state.waiting_len() as i64);
        drop(state);

        self.0
            .notifier
            .send_to_socket(
                &player.socket_id,
                OutboundEvent::QueueLeft {
                    user_id: player.user_id,
                    timestamp: now,
                },
            )
            .await;
    }

    pub async fn queue_stats(&self) -> QueueStats {
        self.0.state.lock().await.stats()
    }

    /// Spawns the fixed-period matcher tick (C5). Stops when `shutdown`
    /// observes a shutdown signal, mirroring the teacher's
    /// `common_net::shutdown` watch-channel idiom.
    pub fn spawn_ticker(&self, mut shutdown: common_net::shutdown::ShutdownReceiver) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(engine.0.config.tick_rate_ms));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.run_tick().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Matcher Tick (C5) body. Any unexpected failure in a collaborator
    /// call is logged and swallowed rather than propagated — the next
    /// tick must still run on schedule.
    pub async fn run_tick(&self) {
        let now = now_ms();
        let mut state = self.0.state.lock().await;
        if state.waiting_len() < 2 {
            return;
        }

        let mut candidates = state.waiting_snapshot();
        let pairs = matcher::select_pairs(&mut candidates, now, &self.0.config);

        for candidate in &candidates {
            state.update_range_factor(&candidate.user_id, candidate.range_factor);
        }

        for (i, j) in pairs {
            let a_id = candidates[i].user_id.clone();
            let b_id = candidates[j].user_id.clone();
            let Some(player_a) = state.take_waiting(&a_id) else {
                warn!(user_id = %a_id, "matched candidate vanished before pairing");
                continue;
            };
            let Some(player_b) = state.take_waiting(&b_id) else {
                warn!(user_id = %b_id, "matched candidate vanished before pairing");
                continue;
            };
            self.form_pending_match(&mut state, player_a, player_b, now).await;
        }

        common_net::metrics::matchmaking_metrics().set_queue_depth(state.waiting_len() as i64);
        common_net::metrics::matchmaking_metrics()
            .set_pending_matches(state.stats().pending as i64);
    }

    async fn form_pending_match(
        &self,
        state: &mut QueueState,
        a: QueuedPlayer,
        b: QueuedPlayer,
        now: i64,
    ) {
        let match_id = Uuid::new_v4().to_string();
        let expires_at = now + self.0.config.match_accept_timeout_ms;
        let delay_ms = (expires_at - now).max(0) as u64;

        let engine = self.clone();
        let timer_match_id = match_id.clone();
        let timer_handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            engine.handle_timeout(&timer_match_id).await;
        });

        let player1 = MatchParticipant::from_queued(&a);
        let player2 = MatchParticipant::from_queued(&b);
        debug!(match_id = %match_id, player1 = %player1.user_id, player2 = %player2.user_id, "match proposed");

        state.insert_pending(PendingMatch {
            match_id: match_id.clone(),
            expires_at,
            player1: player1.clone(),
            player2: player2.clone(),
            timer_handle,
        });

        self.0
            .notifier
            .send_to_socket(
                &player1.socket_id,
                OutboundEvent::MatchProposal {
                    match_id: match_id.clone(),
                    expires_at,
                    opponent_elo: player2.elo,
                },
            )
            .await;
        self.0
            .notifier
            .send_to_socket(
                &player2.socket_id,
                OutboundEvent::MatchProposal {
                    match_id,
                    expires_at,
                    opponent_elo: player1.elo,
                },
            )
            .await;
    }

    pub(crate) fn penalty_store(&self) -> &Arc<dyn PenaltyStore> {
        &self.0.penalty_store
    }

    pub(crate) fn session_log(&self) -> &Arc<dyn SessionLog> {
        &self.0.session_log
    }

    pub(crate) fn game_client(&self) -> &Arc<dyn GameClient> {
        &self.0.game_client
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.0.notifier
    }

    pub(crate) async fn lock_state(&self) -> tokio::sync::MutexGuard<'_, QueueState> {
        self.0.state.lock().await
    }
}
