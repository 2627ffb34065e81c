//! Core protocol types: room codes, client actions, server events.

use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::PollSnapshot;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short code a room is known by.
///
/// Codes are case-insensitive: every way of building one (including
/// deserialization) trims and uppercases the input, so two `RoomCode`s
/// compare equal exactly when they name the same room.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes `raw` into its canonical (uppercase) form.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// The canonical code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Machine-readable reason carried by [`ServerEvent::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomNotFound,
    PollEnded,
    AlreadyVoted,
    InvalidOption,
    /// The frame could not be decoded as a [`ClientAction`].
    BadRequest,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::PollEnded => "POLL_ENDED",
            Self::AlreadyVoted => "ALREADY_VOTED",
            Self::InvalidOption => "INVALID_OPTION",
            Self::BadRequest => "BAD_REQUEST",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// An action a participant asks the server to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientAction {
    /// Open a new room. `question` and `options` are optional and
    /// lenient: a value of the wrong shape counts as omitted.
    CreateRoom {
        #[serde(default)]
        creator_name: String,
        #[serde(
            default,
            deserialize_with = "lenient",
            skip_serializing_if = "Option::is_none"
        )]
        question: Option<String>,
        #[serde(
            default,
            deserialize_with = "lenient",
            skip_serializing_if = "Option::is_none"
        )]
        options: Option<Vec<String>>,
    },

    /// Start viewing a room (and receiving its broadcasts).
    JoinRoom {
        room_code: RoomCode,
        participant_name: String,
    },

    /// Cast this participant's single vote. A signed index so that
    /// negative values reach the engine and fail as an invalid option.
    SubmitVote {
        room_code: RoomCode,
        participant_name: String,
        option_index: i64,
    },

    /// Ask for the current state, letting the server confirm expiry.
    CheckPollStatus { room_code: RoomCode },
}

impl ClientAction {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::SubmitVote { .. } => "submit_vote",
            Self::CheckPollStatus { .. } => "check_poll_status",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

/// Accepts a `T`, and treats `null` or anything else that isn't a `T`
/// as absent instead of failing the whole frame.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Value(value)) => Some(value),
        Some(Lenient::Other(_)) | None => None,
    })
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// A message from the server: a reply to one caller or a broadcast to
/// every viewer of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Reply to `create_room`.
    RoomCreated {
        room_code: RoomCode,
        room: PollSnapshot,
    },

    /// Reply to `join_room`. `your_vote` restores the caller's choice
    /// when they rejoin after voting.
    RoomJoined {
        room_code: RoomCode,
        room: PollSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        your_vote: Option<usize>,
    },

    /// Broadcast after every recorded vote.
    VoteUpdate { room: PollSnapshot },

    /// Broadcast once, when a room's voting window is found to be over.
    PollEnded { room: PollSnapshot },

    /// Reply to `check_poll_status`.
    PollStatus { room: PollSnapshot },

    /// Reply to the caller when an action was rejected.
    Error { code: ErrorCode, message: String },
}

impl ServerEvent {
    /// Builds an error reply.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// The room snapshot carried by this event, if any.
    pub fn room(&self) -> Option<&PollSnapshot> {
        match self {
            Self::RoomCreated { room, .. }
            | Self::RoomJoined { room, .. }
            | Self::VoteUpdate { room }
            | Self::PollEnded { room }
            | Self::PollStatus { room } => Some(room),
            Self::Error { .. } => None,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room_created",
            Self::RoomJoined { .. } => "room_joined",
            Self::VoteUpdate { .. } => "vote_update",
            Self::PollEnded { .. } => "poll_ended",
            Self::PollStatus { .. } => "poll_status",
            Self::Error { .. } => "error",
        }
    }
}
