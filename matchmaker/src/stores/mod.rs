mod penalty;
mod session_log;

pub use penalty::{InMemoryPenaltyStore, Penalty, PenaltyStore};
pub use session_log::{InMemorySessionLog, SessionLog, SessionLogEntry};
