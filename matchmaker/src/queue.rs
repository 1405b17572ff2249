use std::collections::{HashMap, HashSet};

use crate::errors::MatchmakingError;
use crate::model::{PendingMatch, QueueStats, QueuedPlayer};

/// In-memory indices for C4: `WaitingByUser`, `WaitingBySocket`,
/// `PendingMatches`, plus the derived `isUserInPendingMatch` query.
///
/// Plain struct over `HashMap`/`HashSet` with synchronous methods —
/// thread-safety is the caller's problem (the engine wraps this in a
/// single mutex per §5). No suspension points live here; the Banned
/// check against the Penalty Store happens one layer up in
/// `MatchmakingEngine::add_player`.
#[derive(Default)]
pub struct QueueState {
    waiting_by_user: HashMap<String, QueuedPlayer>,
    waiting_by_socket: HashSet<String>,
    pending_matches: HashMap<String, PendingMatch>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_user_in_pending_match(&self, user_id: &str) -> bool {
        self.pending_matches
            .values()
            .any(|m| m.is_participant(user_id))
    }

    /// Validates `AlreadyQueued`/`SocketBusy` without touching the Banned
    /// check, which requires the async Penalty Store.
    pub fn check_can_add(&self, user_id: &str, socket_id: &str) -> Result<(), MatchmakingError> {
        if self.waiting_by_user.contains_key(user_id) || self.is_user_in_pending_match(user_id) {
            return Err(MatchmakingError::AlreadyQueued);
        }
        if self.waiting_by_socket.contains(socket_id) {
            return Err(MatchmakingError::SocketBusy);
        }
        Ok(())
    }

    /// Inserts a validated player into both indices. Callers must have
    /// already run `check_can_add` (and the Banned check).
    pub fn insert_waiting(&mut self, player: QueuedPlayer) {
        self.waiting_by_socket.insert(player.socket_id.clone());
        self.waiting_by_user.insert(player.user_id.clone(), player);
    }

    /// Idempotent removal by either `userId` or `socketId`. Does not
    /// touch `PendingMatches`.
    pub fn remove_player(&mut self, identifier: &str) -> Option<QueuedPlayer> {
        if let Some(player) = self.waiting_by_user.remove(identifier) {
            self.waiting_by_socket.remove(&player.socket_id);
            return Some(player);
        }

        let socket_owner = self
            .waiting_by_user
            .values()
            .find(|p| p.socket_id == identifier)
            .map(|p| p.user_id.clone());

        if let Some(user_id) = socket_owner {
            let player = self.waiting_by_user.remove(&user_id)?;
            self.waiting_by_socket.remove(&player.socket_id);
            return Some(player);
        }

        None
    }

    /// Snapshot of all currently waiting players, for the matcher tick.
    pub fn waiting_snapshot(&self) -> Vec<QueuedPlayer> {
        self.waiting_by_user.values().cloned().collect()
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting_by_user.len()
    }

    pub fn update_range_factor(&mut self, user_id: &str, range_factor: f64) {
        if let Some(player) = self.waiting_by_user.get_mut(user_id) {
            player.range_factor = range_factor;
        }
    }

    /// Removes a player from both waiting indices as part of forming a
    /// pending match (step 5 of §4.2).
    pub fn take_waiting(&mut self, user_id: &str) -> Option<QueuedPlayer> {
        let player = self.waiting_by_user.remove(user_id)?;
        self.waiting_by_socket.remove(&player.socket_id);
        Some(player)
    }

    pub fn insert_pending(&mut self, pending: PendingMatch) {
        self.pending_matches.insert(pending.match_id.clone(), pending);
    }

    pub fn remove_pending(&mut self, match_id: &str) -> Option<PendingMatch> {
        self.pending_matches.remove(match_id)
    }

    pub fn get_pending_mut(&mut self, match_id: &str) -> Option<&mut PendingMatch> {
        self.pending_matches.get_mut(match_id)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            size: self.waiting_by_user.len(),
            pending: self.pending_matches.len(),
        }
    }
}
