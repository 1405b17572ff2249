use thiserror::Error;

/// Error kinds surfaced to callers of the matchmaking core. Every variant
/// maps to an `error` event emitted on the offending socket by the gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchmakingError {
    #[error("user is banned until {expires_at}")]
    Banned { expires_at: i64 },

    #[error("user is already queued or in a pending match")]
    AlreadyQueued,

    #[error("socket is already in use by another queued player")]
    SocketBusy,

    #[error("no pending match with that id")]
    MatchNotFound,

    #[error("user is not a participant of this match")]
    NotParticipant,

    #[error("invalid payload: {details}")]
    InvalidPayload { details: String },
}
