//! A single poll room and its tallies.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use livepoll_protocol::{PollOutcome, PollSnapshot, RoomCode};

/// One live poll.
///
/// Tallies only move through vote casting and the active flag only
/// through the engine's expiry check. Outside the crate a room is
/// read-only.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    creator_name: String,
    question: String,
    options: Vec<String>,
    vote_counts: Vec<u64>,
    voter_choices: HashMap<String, usize>,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
}

impl Room {
    /// Opens a room with zeroed tallies. `options` must hold at least two
    /// entries; the factory guarantees it.
    pub(crate) fn new(
        code: RoomCode,
        creator_name: String,
        question: String,
        options: Vec<String>,
        started_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        let vote_counts = vec![0; options.len()];
        Self {
            code,
            creator_name,
            question,
            options,
            vote_counts,
            voter_choices: HashMap::new(),
            started_at,
            ends_at,
            is_active: true,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn creator_name(&self) -> &str {
        &self.creator_name
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Whether the room still accepts votes, as of the last expiry check.
    ///
    /// This is the stored flag. A room whose window has passed stays
    /// `true` here until something observes it; use
    /// [`expiry::evaluate`](crate::expiry::evaluate) for the time-aware
    /// answer.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Votes for `option_index`, or `None` if there is no such option.
    pub fn count_for(&self, option_index: usize) -> Option<u64> {
        self.vote_counts.get(option_index).copied()
    }

    /// The option `participant` chose, if they voted.
    pub fn choice_of(&self, participant: &str) -> Option<usize> {
        self.voter_choices.get(participant).copied()
    }

    pub fn has_voted(&self, participant: &str) -> bool {
        self.voter_choices.contains_key(participant)
    }

    pub fn total_votes(&self) -> u64 {
        self.vote_counts.iter().sum()
    }

    pub fn voter_count(&self) -> usize {
        self.voter_choices.len()
    }

    /// Who is ahead right now, regardless of whether voting has ended.
    pub fn tally(&self) -> PollOutcome {
        let max = self.vote_counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return PollOutcome::NoVotes;
        }

        let leaders: Vec<usize> = self
            .vote_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == max)
            .map(|(index, _)| index)
            .collect();

        match leaders.as_slice() {
            [index] => PollOutcome::Winner {
                option_index: *index,
                option: self.options[*index].clone(),
            },
            _ => PollOutcome::Tie {
                option_indices: leaders,
            },
        }
    }

    /// The final result, once the room has ended.
    pub fn outcome(&self) -> Option<PollOutcome> {
        (!self.is_active).then(|| self.tally())
    }

    /// Milliseconds left in the voting window at `now`; 0 once ended.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        if !self.is_active {
            return 0;
        }
        (self.ends_at - now).num_milliseconds().max(0) as u64
    }

    /// The wire view of this room at `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> PollSnapshot {
        PollSnapshot {
            code: self.code.clone(),
            creator_name: self.creator_name.clone(),
            question: self.question.clone(),
            options: self.options.clone(),
            vote_counts: self.vote_counts.iter().copied().enumerate().collect(),
            voter_choices: self
                .voter_choices
                .iter()
                .map(|(name, choice)| (name.clone(), *choice))
                .collect::<BTreeMap<_, _>>(),
            started_at: self.started_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
            total_votes: self.total_votes(),
            remaining_ms: self.remaining_ms(now),
            outcome: self.outcome(),
        }
    }

    /// Flips the room to ended. Never flips back.
    pub(crate) fn mark_ended(&mut self) {
        self.is_active = false;
    }

    /// Records `participant`'s choice and bumps the matching count in one
    /// step. Callers check for duplicates and range first.
    pub(crate) fn record_vote(&mut self, participant: &str, option_index: usize) {
        self.voter_choices
            .insert(participant.to_string(), option_index);
        self.vote_counts[option_index] += 1;
    }
}
