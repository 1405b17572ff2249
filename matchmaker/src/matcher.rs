use crate::model::QueuedPlayer;

/// The handful of tunables named throughout §4.2/§6. Kept separate from
/// `common_net::config::MatchmakingSettings` so the matcher can be unit
/// tested without loading the environment.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub tick_rate_ms: u64,
    pub base_tolerance: f64,
    pub expansion_interval_ms: i64,
    pub expansion_step: f64,
    pub match_accept_timeout_ms: i64,
    pub penalty_duration_seconds: i64,
    pub game_client_timeout_ms: u64,
    pub default_elo: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 1000,
            base_tolerance: 50.0,
            expansion_interval_ms: 10_000,
            expansion_step: 1.0,
            match_accept_timeout_ms: 15_000,
            penalty_duration_seconds: 300,
            game_client_timeout_ms: 3_000,
            default_elo: 1000,
        }
    }
}

impl From<&common_net::config::MatchmakingSettings> for EngineConfig {
    fn from(settings: &common_net::config::MatchmakingSettings) -> Self {
        Self {
            tick_rate_ms: settings.tick_rate_ms,
            base_tolerance: settings.base_tolerance,
            expansion_interval_ms: settings.expansion_interval_ms,
            expansion_step: settings.expansion_step,
            match_accept_timeout_ms: settings.match_accept_timeout_ms,
            penalty_duration_seconds: settings.penalty_duration_seconds,
            game_client_timeout_ms: settings.game_client_timeout_ms,
            default_elo: settings.default_elo,
        }
    }
}

/// Sorts `candidates` in place (priority first, then ascending elo, then
/// `userId` as a deterministic tiebreaker — HashMap iteration order is
/// not otherwise stable) and pairs them up per §4.2. Range expansion is
/// applied in place to every candidate visited, matched or not, since
/// expansion is "permanent while queued" regardless of whether a match
/// forms this tick.
///
/// Returns index pairs into `candidates` *after* sorting.
pub fn select_pairs(
    candidates: &mut [QueuedPlayer],
    now_ms: i64,
    config: &EngineConfig,
) -> Vec<(usize, usize)> {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.elo.cmp(&b.elo))
            .then(a.user_id.cmp(&b.user_id))
    });

    let len = candidates.len();
    let mut matched = vec![false; len];
    let mut pairs = Vec::new();

    for i in 0..len {
        if matched[i] {
            continue;
        }

        let wait_time = now_ms - candidates[i].join_time;
        let expansion_threshold = config.expansion_interval_ms as f64 * candidates[i].range_factor;
        if wait_time as f64 > expansion_threshold {
            candidates[i].range_factor += config.expansion_step;
        }

        let tolerance_a = config.base_tolerance
            * candidates[i].range_factor
            * if candidates[i].priority { 2.0 } else { 1.0 };
        let elo_a = candidates[i].elo;

        let mut found = None;
        for j in (i + 1)..len {
            if matched[j] {
                continue;
            }
            let elo_diff = (elo_a as i64 - candidates[j].elo as i64).unsigned_abs() as f64;
            let tolerance_b = config.base_tolerance * candidates[j].range_factor;
            if elo_diff <= tolerance_a.min(tolerance_b) {
                found = Some(j);
                break;
            }
        }

        if let Some(j) = found {
            matched[i] = true;
            matched[j] = true;
            pairs.push((i, j));
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(user_id: &str, elo: u32, join_time: i64, priority: bool) -> QueuedPlayer {
        QueuedPlayer::new(user_id.into(), format!("s-{user_id}"), elo, priority, join_time)
    }

    #[test]
    fn pairs_close_elo_within_base_tolerance() {
        let config = EngineConfig::default();
        let mut candidates = vec![candidate("a", 1500, 0, false), candidate("b", 1520, 0, false)];
        let pairs = select_pairs(&mut candidates, 1000, &config);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn no_match_outside_tolerance_before_expansion() {
        let config = EngineConfig::default();
        let mut candidates = vec![candidate("a", 1000, 0, false), candidate("b", 1200, 0, false)];
        let pairs = select_pairs(&mut candidates, 1000, &config);
        assert!(pairs.is_empty());
    }

    #[test]
    fn expansion_eventually_forms_a_pair() {
        let config = EngineConfig::default();
        let mut candidates = vec![candidate("a", 1000, 0, false), candidate("b", 1200, 0, false)];

        // elo diff is 200; base_tolerance=50 needs range_factor >= 4 on
        // both sides. Each tick past its own expansion_interval adds 1.0.
        let mut now = 0i64;
        let mut paired = Vec::new();
        for _ in 0..6 {
            now += config.expansion_interval_ms + 1;
            let pairs = select_pairs(&mut candidates, now, &config);
            if !pairs.is_empty() {
                paired = pairs;
                break;
            }
        }
        assert_eq!(paired, vec![(0, 1)]);
    }

    #[test]
    fn priority_player_sorts_first_regardless_of_elo() {
        let config = EngineConfig::default();
        let mut candidates = vec![
            candidate("low-elo", 1000, 0, false),
            candidate("priority", 1400, 0, true),
        ];
        select_pairs(&mut candidates, 0, &config);
        assert_eq!(candidates[0].user_id, "priority");
    }

    #[test]
    fn priority_bonus_applies_only_to_active_side() {
        let config = EngineConfig::default();
        // elo_diff = 150. "b" (priority, active/outer since priority
        // sorts first) has range_factor=2.0: without the x2 bonus its
        // tolerance is 100 (< 150, no match); with the bonus it's 200.
        // "a" (passive) has range_factor=3.0, tolerance 150 unaffected by
        // anyone's priority flag. min(200, 150) = 150 >= 150: match only
        // because the bonus raised the active side, never the passive one.
        let mut a = candidate("a", 1000, 0, false);
        a.range_factor = 3.0;
        let mut b = candidate("b", 1150, 0, true);
        b.range_factor = 2.0;
        let mut candidates = vec![a, b];

        let pairs = select_pairs(&mut candidates, 0, &config);
        assert_eq!(pairs, vec![(0, 1)]);
    }
}
