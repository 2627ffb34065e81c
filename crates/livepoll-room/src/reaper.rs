//! Retention-based eviction of ended rooms.

use chrono::{DateTime, TimeDelta, Utc};
use livepoll_protocol::RoomCode;
use tracing::info;

use crate::{PollConfig, Room, RoomStore};

/// Removes rooms whose deadline is more than one retention window past.
///
/// Eviction is based purely on `ends_at`, so a room that nobody ever
/// observed ending is still reaped on schedule.
#[derive(Debug, Clone, Copy)]
pub struct Reaper {
    retention: TimeDelta,
}

impl Reaper {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            retention: config.retention_delta(),
        }
    }

    pub fn should_evict(&self, room: &Room, now: DateTime<Utc>) -> bool {
        now > room.ends_at() + self.retention
    }

    /// Evicts every expired room and returns the codes removed.
    pub fn sweep(&self, store: &mut RoomStore, now: DateTime<Utc>) -> Vec<RoomCode> {
        let doomed: Vec<RoomCode> = store
            .iter()
            .filter(|room| self.should_evict(room, now))
            .map(|room| room.code().clone())
            .collect();

        for code in &doomed {
            if let Some(room) = store.remove(code) {
                info!(
                    room = %code,
                    votes = room.total_votes(),
                    "reaped room"
                );
            }
        }

        doomed
    }
}
