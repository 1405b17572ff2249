use std::net::SocketAddr;

use crate::metrics::BoxError;

/// Every tunable named by the matchmaking core, loaded once at bootstrap.
#[derive(Debug, Clone)]
pub struct MatchmakingSettings {
    pub bind_addr: SocketAddr,
    pub game_service_url: String,
    pub user_service_url: String,
    pub jwt_secret: String,

    pub tick_rate_ms: u64,
    pub base_tolerance: f64,
    pub expansion_interval_ms: i64,
    pub expansion_step: f64,
    pub match_accept_timeout_ms: i64,
    pub penalty_duration_seconds: i64,
    pub game_client_timeout_ms: u64,
    pub default_elo: u32,
}

impl MatchmakingSettings {
    pub fn from_env() -> Result<Self, BoxError> {
        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e| Box::new(e) as BoxError)?;

        let game_service_url =
            std::env::var("GAME_SERVICE_URL").unwrap_or_else(|_| "http://game:3000".to_string());
        let user_service_url = std::env::var("USER_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string());

        Ok(Self {
            bind_addr,
            game_service_url,
            user_service_url,
            jwt_secret,
            tick_rate_ms: env_parsed("TICK_RATE_MS", 1000),
            base_tolerance: env_parsed("BASE_TOLERANCE", 50.0),
            expansion_interval_ms: env_parsed("EXPANSION_INTERVAL_MS", 10_000),
            expansion_step: env_parsed("EXPANSION_STEP", 1.0),
            match_accept_timeout_ms: env_parsed("MATCH_ACCEPT_TIMEOUT_MS", 15_000),
            penalty_duration_seconds: env_parsed("PENALTY_DURATION_SECONDS", 300),
            game_client_timeout_ms: env_parsed("GAME_CLIENT_TIMEOUT_MS", 3_000),
            default_elo: env_parsed("DEFAULT_ELO", 1000),
        })
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        std::env::remove_var("TICK_RATE_MS");
        std::env::remove_var("BASE_TOLERANCE");
        let settings = MatchmakingSettings::from_env().expect("settings load");
        assert_eq!(settings.tick_rate_ms, 1000);
        assert_eq!(settings.base_tolerance, 50.0);
        assert_eq!(settings.penalty_duration_seconds, 300);
    }

    #[test]
    fn env_overrides_default() {
        std::env::set_var("BASE_TOLERANCE", "75.5");
        let settings = MatchmakingSettings::from_env().expect("settings load");
        assert_eq!(settings.base_tolerance, 75.5);
        std::env::remove_var("BASE_TOLERANCE");
    }
}
