//! Vote validation and recording.

use crate::{PollError, Room};

/// Records `participant`'s vote for `option_index`.
///
/// Checks, in order: the participant hasn't voted yet, then the index
/// names an option. Nothing changes unless both pass. Whether the room is
/// still open is the caller's concern.
pub(crate) fn cast(room: &mut Room, participant: &str, option_index: i64) -> Result<usize, PollError> {
    if room.has_voted(participant) {
        return Err(PollError::AlreadyVoted {
            room: room.code().clone(),
            participant: participant.to_string(),
        });
    }

    let index = usize::try_from(option_index)
        .ok()
        .filter(|i| *i < room.options().len())
        .ok_or_else(|| PollError::InvalidOption {
            room: room.code().clone(),
            option_index,
        })?;

    room.record_vote(participant, index);
    Ok(index)
}
