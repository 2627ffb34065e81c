//! Error types for the poll engine.

use livepoll_protocol::{ErrorCode, RoomCode, ServerEvent};

/// Why an action was rejected.
///
/// These are ordinary outcomes, not failures: each maps to an
/// [`ErrorCode`] and goes back to the one caller that asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// No room with this code is in the store (never created, or reaped).
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room's voting window is over.
    #[error("voting has ended for room {0}")]
    PollEnded(RoomCode),

    /// This display name already has a vote recorded in the room.
    #[error("{participant} has already voted in room {room}")]
    AlreadyVoted { room: RoomCode, participant: String },

    /// The option index doesn't name one of the room's options.
    #[error("option {option_index} does not exist in room {room}")]
    InvalidOption { room: RoomCode, option_index: i64 },
}

impl PollError {
    /// The wire code for this rejection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound(_) => ErrorCode::RoomNotFound,
            Self::PollEnded(_) => ErrorCode::PollEnded,
            Self::AlreadyVoted { .. } => ErrorCode::AlreadyVoted,
            Self::InvalidOption { .. } => ErrorCode::InvalidOption,
        }
    }

    /// The error reply sent back to the caller.
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.code(), self.to_string())
    }
}
