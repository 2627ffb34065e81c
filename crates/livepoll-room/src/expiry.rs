//! The active → ended edge.
//!
//! A room ends the first time anything looks at it after its deadline.
//! [`evaluate`] only reports; the engine applies the result and emits
//! `poll_ended` when `just_ended` is set. Because the stored flag is
//! cleared at that point, a later evaluation of the same room can never
//! report the edge again.

use chrono::{DateTime, Utc};

use crate::Room;

/// What an expiry check found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// The room was still flagged active but its deadline has passed.
    pub just_ended: bool,
    /// Whether the room accepts votes at `now`.
    pub is_active: bool,
}

/// Checks `room` against `now`. A vote at exactly `ends_at` still counts;
/// the room is over only once `now` is strictly later.
pub fn evaluate(room: &Room, now: DateTime<Utc>) -> Expiry {
    let just_ended = room.is_active() && now > room.ends_at();
    Expiry {
        just_ended,
        is_active: room.is_active() && !just_ended,
    }
}
