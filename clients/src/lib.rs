pub mod game_client;
pub mod users_client;

pub use game_client::HttpGameClient;
pub use users_client::HttpUsersClient;
