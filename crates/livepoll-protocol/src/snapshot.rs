//! Room snapshots: the read-only view of a poll that goes on the wire.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::RoomCode;

/// Full state of one poll room at a point in time.
///
/// Every reply and broadcast that concerns a room carries one of these,
/// so a viewer can always redraw from the latest event alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    pub code: RoomCode,
    pub creator_name: String,
    pub question: String,
    pub options: Vec<String>,
    /// Option index → number of votes. Has exactly one key per option.
    #[serde(deserialize_with = "index_keys")]
    pub vote_counts: BTreeMap<usize, u64>,
    /// Display name → option index that participant chose.
    pub voter_choices: BTreeMap<String, usize>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub total_votes: u64,
    /// Milliseconds left in the voting window when the snapshot was
    /// taken; 0 once the poll has ended.
    pub remaining_ms: u64,
    /// Final result, present only once the poll has ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PollOutcome>,
}

impl PollSnapshot {
    /// Number of votes recorded for `option_index`, or `None` if the room
    /// has no such option.
    pub fn count_for(&self, option_index: usize) -> Option<u64> {
        self.vote_counts.get(&option_index).copied()
    }

    /// The option index `participant` voted for, if they voted.
    pub fn choice_of(&self, participant: &str) -> Option<usize> {
        self.voter_choices.get(participant).copied()
    }
}

/// JSON object keys are always strings. Inside an internally tagged
/// event the frame is buffered first, and the buffered `"0"` no longer
/// parses as a `usize` on its own, so keys are read as strings here.
fn index_keys<'de, D>(deserializer: D) -> Result<BTreeMap<usize, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, u64>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, count)| {
            key.parse::<usize>()
                .map(|index| (index, count))
                .map_err(|_| D::Error::custom(format!("invalid option index {key:?}")))
        })
        .collect()
}

/// How an ended poll came out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum PollOutcome {
    /// One option has strictly more votes than every other.
    Winner { option_index: usize, option: String },
    /// Several options share the highest (non-zero) count.
    Tie { option_indices: Vec<usize> },
    /// Nobody voted.
    NoVotes,
}
