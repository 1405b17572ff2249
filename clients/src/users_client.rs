use std::time::Duration;

use async_trait::async_trait;
use matchmaker::ports::UsersClient;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EloResponse {
    elo: u32,
}

/// HTTP adapter for the Users service elo lookup, consulted once at
/// connection time (§4.1). Unreachable/invalid responses fall back to
/// `default_elo` rather than blocking the connection.
#[derive(Debug, Clone)]
pub struct HttpUsersClient {
    client: Client,
    base_url: String,
    default_elo: u32,
}

impl HttpUsersClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, default_elo: u32) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is valid");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_elo,
        }
    }
}

#[async_trait]
impl UsersClient for HttpUsersClient {
    async fn get_user_elo(&self, user_id: &str) -> u32 {
        let url = format!("{}/users/{}/elo", self.base_url, user_id);
        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(%user_id, status = %response.status(), "elo lookup failed, using default");
                return self.default_elo;
            }
            Err(err) => {
                warn!(%user_id, %err, "elo lookup request failed, using default");
                return self.default_elo;
            }
        };

        match response.json::<EloResponse>().await {
            Ok(parsed) => parsed.elo,
            Err(err) => {
                warn!(%user_id, %err, "elo lookup returned an unparseable body, using default");
                self.default_elo
            }
        }
    }
}
