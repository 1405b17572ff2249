use std::sync::Arc;

use matchmaker::ports::UsersClient;
use matchmaker::MatchmakingEngine;

use crate::notifier::WsNotifier;

#[derive(Clone)]
pub struct AppState {
    pub engine: MatchmakingEngine,
    pub users_client: Arc<dyn UsersClient>,
    pub notifier: Arc<WsNotifier>,
    pub jwt_secret: Arc<str>,
}
