use std::collections::HashSet;

use common_net::time::now_ms;
use tracing::{debug, warn};

use crate::engine::MatchmakingEngine;
use crate::errors::MatchmakingError;
use crate::events::OutboundEvent;
use crate::model::{ParticipantStatus, PendingMatch};
use crate::ports::{CreateGameOutcome, CreateGameRequest};
use crate::queue::QueueState;
use crate::stores::SessionLogEntry;

impl MatchmakingEngine {
    /// `accept(u, matchId)` (§4.3). Idempotent on repeat acceptance;
    /// drives Finalize the instant both sides are `Accepted`, guaranteeing
    /// exactly one invocation does so even under concurrent accepts, since
    /// the removal from `PendingMatches` happens under the mutex guard.
    /// The guard is released before `finalize` runs so the Game service
    /// round trip inside it cannot stall the rest of the engine (§5).
    pub async fn accept_match(&self, user_id: &str, match_id: &str) -> Result<(), MatchmakingError> {
        let ready_to_finalize = {
            let mut state = self.lock_state().await;

            let pending = state
                .get_pending_mut(match_id)
                .ok_or(MatchmakingError::MatchNotFound)?;
            if !pending.is_participant(user_id) {
                return Err(MatchmakingError::NotParticipant);
            }

            let participant = pending.participant_mut(user_id).expect("checked above");
            if !matches!(participant.status, ParticipantStatus::Pending) {
                debug!(%user_id, %match_id, "duplicate accept ignored");
                return Ok(());
            }
            participant.status = ParticipantStatus::Accepted;

            if pending.both_accepted() {
                let pending = state.remove_pending(match_id).expect("just matched above");
                pending.cancel_timer();
                Some(pending)
            } else {
                None
            }
        };

        if let Some(pending) = ready_to_finalize {
            self.finalize(pending).await;
        }

        Ok(())
    }

    /// `decline(u, matchId)` (§4.3). Always transitions straight to
    /// Cancel with the declining user as the sole faulty party.
    pub async fn decline_match(&self, user_id: &str, match_id: &str) -> Result<(), MatchmakingError> {
        let mut state = self.lock_state().await;

        {
            let pending = state
                .get_pending_mut(match_id)
                .ok_or(MatchmakingError::MatchNotFound)?;
            if !pending.is_participant(user_id) {
                return Err(MatchmakingError::NotParticipant);
            }
        }

        let pending = state.remove_pending(match_id).expect("checked above");
        pending.cancel_timer();

        let mut faulty = HashSet::new();
        faulty.insert(user_id.to_string());
        self.cancel(&mut state, pending, faulty, "declined").await;

        Ok(())
    }

    /// Timer-fired path: whichever participant is still `Pending` at
    /// `expiresAt` is faulty. A match already resolved by accept/decline
    /// is a silent no-op (it was already removed from the index).
    pub(crate) async fn handle_timeout(&self, match_id: &str) {
        let mut state = self.lock_state().await;
        let Some(pending) = state.remove_pending(match_id) else {
            return;
        };

        let faulty: HashSet<String> = [&pending.player1, &pending.player2]
            .into_iter()
            .filter(|p| matches!(p.status, ParticipantStatus::Pending))
            .map(|p| p.user_id.clone())
            .collect();

        self.cancel(&mut state, pending, faulty, "timeout").await;
    }

    /// Cancel(match, faulty, reason) (§4.3). Faulty participants are
    /// penalized; innocent ones are re-queued with `priority=true`. A
    /// penalty-store failure for one participant must not prevent
    /// processing the other, so each arm is handled independently.
    async fn cancel(
        &self,
        state: &mut QueueState,
        pending: PendingMatch,
        faulty: HashSet<String>,
        reason: &'static str,
    ) {
        let now = now_ms();
        let match_id = pending.match_id.clone();

        for participant in [pending.player1, pending.player2] {
            if faulty.contains(&participant.user_id) {
                self.penalty_store()
                    .add_penalty(
                        &participant.user_id,
                        self.config().penalty_duration_seconds,
                        &format!("Matchmaking abuse: {reason}"),
                        now,
                    )
                    .await;
                common_net::metrics::matchmaking_metrics().inc_penalties_issued();
                self.notifier()
                    .send_to_socket(
                        &participant.socket_id,
                        OutboundEvent::MatchCancelled {
                            match_id: match_id.clone(),
                            reason: "penalty_applied".to_string(),
                        },
                    )
                    .await;
            } else {
                self.notifier()
                    .send_to_socket(
                        &participant.socket_id,
                        OutboundEvent::MatchCancelled {
                            match_id: match_id.clone(),
                            reason: "opponent_declined".to_string(),
                        },
                    )
                    .await;
                if let Err(err) = self
                    .add_player_locked(
                        state,
                        &participant.user_id,
                        &participant.socket_id,
                        participant.elo,
                        true,
                        now,
                    )
                    .await
                {
                    warn!(user_id = %participant.user_id, %err, "re-queue after cancel failed");
                }
            }
        }

        common_net::metrics::matchmaking_metrics().inc_matches_cancelled(reason);
        common_net::metrics::matchmaking_metrics()
            .set_pending_matches(state.stats().pending as i64);
    }

    /// Finalize (§4.4). The `PendingMatch` has already been removed from
    /// the index by the caller before this runs, so a reentrant accept
    /// can never finalize twice. Runs entirely without the `QueueState`
    /// lock held: the session log append and the Game service round trip
    /// (its own 3s timeout) must not block `add_player`/`run_tick`/other
    /// ready-check calls. A failed creation re-queues through the public,
    /// lock-acquiring `add_player` rather than `add_player_locked`, since
    /// no guard is held here.
    async fn finalize(&self, pending: PendingMatch) {
        let now = now_ms();

        if let Err(err) = self
            .session_log()
            .append(SessionLogEntry {
                id: pending.match_id.clone(),
                player1_id: pending.player1.user_id.clone(),
                player2_id: pending.player2.user_id.clone(),
                status: "STARTED",
                started_at: now,
            })
            .await
        {
            warn!(match_id = %pending.match_id, %err, "session log append failed");
        }

        let outcome = self
            .game_client()
            .create_game(CreateGameRequest {
                game_id: pending.match_id.clone(),
                player1_id: pending.player1.user_id.clone(),
                player2_id: pending.player2.user_id.clone(),
            })
            .await;

        match outcome {
            CreateGameOutcome::Success { game_id, .. } => {
                common_net::metrics::matchmaking_metrics().inc_matches_created();
                self.notifier()
                    .send_to_socket(
                        &pending.player1.socket_id,
                        OutboundEvent::MatchConfirmed {
                            game_id: game_id.clone(),
                            player1_id: pending.player1.user_id.clone(),
                            player2_id: pending.player2.user_id.clone(),
                        },
                    )
                    .await;
                self.notifier()
                    .send_to_socket(
                        &pending.player2.socket_id,
                        OutboundEvent::MatchConfirmed {
                            game_id,
                            player1_id: pending.player1.user_id.clone(),
                            player2_id: pending.player2.user_id.clone(),
                        },
                    )
                    .await;
            }
            CreateGameOutcome::Failure { error, message } => {
                if message.contains("fallback") {
                    common_net::metrics::matchmaking_metrics().inc_game_client_fallback();
                }
                common_net::metrics::matchmaking_metrics().inc_matches_cancelled("game_creation_failed");

                let error_code = error.as_str();
                self.notifier()
                    .send_to_socket(
                        &pending.player1.socket_id,
                        OutboundEvent::MatchFailed {
                            match_id: pending.match_id.clone(),
                            reason: "game_creation_failed".to_string(),
                            error_code: error_code.to_string(),
                            message: message.clone(),
                        },
                    )
                    .await;
                self.notifier()
                    .send_to_socket(
                        &pending.player2.socket_id,
                        OutboundEvent::MatchFailed {
                            match_id: pending.match_id.clone(),
                            reason: "game_creation_failed".to_string(),
                            error_code: error_code.to_string(),
                            message,
                        },
                    )
                    .await;

                for participant in [&pending.player1, &pending.player2] {
                    if let Err(err) = self
                        .add_player(
                            &participant.user_id,
                            &participant.socket_id,
                            participant.elo,
                            true,
                        )
                        .await
                    {
                        warn!(user_id = %participant.user_id, %err, "re-queue after game-creation failure failed");
                    }
                }
            }
        }
    }
}
