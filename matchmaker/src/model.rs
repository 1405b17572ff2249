use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// One waiting participant. Constructed by `addPlayer`, destroyed when
/// matched, manually removed, or disconnected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedPlayer {
    pub user_id: String,
    pub socket_id: String,
    pub elo: u32,
    pub join_time: i64,
    pub range_factor: f64,
    pub priority: bool,
}

impl QueuedPlayer {
    pub fn new(user_id: String, socket_id: String, elo: u32, priority: bool, join_time: i64) -> Self {
        Self {
            user_id,
            socket_id,
            elo,
            join_time,
            range_factor: 1.0,
            priority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    Pending,
    Accepted,
    Declined,
}

/// A frozen snapshot of one side of a `PendingMatch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchParticipant {
    pub user_id: String,
    pub socket_id: String,
    pub elo: u32,
    pub status: ParticipantStatus,
}

impl MatchParticipant {
    pub fn from_queued(player: &QueuedPlayer) -> Self {
        Self {
            user_id: player.user_id.clone(),
            socket_id: player.socket_id.clone(),
            elo: player.elo,
            status: ParticipantStatus::Pending,
        }
    }
}

/// An accept/decline session between two players. The expiration timer is
/// a spawned task aborted on removal (accept/decline/timeout), satisfying
/// invariant 3: exactly one active timer per pending match.
pub struct PendingMatch {
    pub match_id: String,
    pub expires_at: i64,
    pub player1: MatchParticipant,
    pub player2: MatchParticipant,
    pub timer_handle: JoinHandle<()>,
}

impl PendingMatch {
    pub fn cancel_timer(&self) {
        self.timer_handle.abort();
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut MatchParticipant> {
        if self.player1.user_id == user_id {
            Some(&mut self.player1)
        } else if self.player2.user_id == user_id {
            Some(&mut self.player2)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.player1.user_id == user_id || self.player2.user_id == user_id
    }

    pub fn both_accepted(&self) -> bool {
        matches!(self.player1.status, ParticipantStatus::Accepted)
            && matches!(self.player2.status, ParticipantStatus::Accepted)
    }

    pub fn other(&self, user_id: &str) -> &MatchParticipant {
        if self.player1.user_id == user_id {
            &self.player2
        } else {
            &self.player1
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueStats {
    pub size: usize,
    pub pending: usize,
}
