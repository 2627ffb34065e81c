//! Room creation: code generation and request normalization.

use chrono::{DateTime, TimeDelta, Utc};
use livepoll_protocol::RoomCode;
use rand::Rng;
use tracing::debug;

use crate::{PollConfig, Room, RoomStore};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate room codes.
///
/// Candidates don't need to be unique; the factory retries on collision.
/// Implementations must return `length` characters from `A–Z0–9`.
pub trait CodeGenerator: Send {
    fn generate(&mut self, length: usize) -> RoomCode;
}

/// Uniformly random codes from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn generate(&mut self, length: usize) -> RoomCode {
        let mut rng = rand::rng();
        let code: String = (0..length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        RoomCode::from(code)
    }
}

/// A create request as the client sent it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPoll {
    pub creator_name: String,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
}

/// Builds new rooms with unique codes and sanitized content.
pub struct RoomFactory {
    generator: Box<dyn CodeGenerator>,
    code_length: usize,
    voting_window: TimeDelta,
    default_question: String,
    default_options: Vec<String>,
}

impl std::fmt::Debug for RoomFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomFactory")
            .field("code_length", &self.code_length)
            .field("voting_window", &self.voting_window)
            .finish_non_exhaustive()
    }
}

impl RoomFactory {
    pub fn new(config: &PollConfig) -> Self {
        Self::with_generator(config, RandomCodes)
    }

    pub fn with_generator(config: &PollConfig, generator: impl CodeGenerator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
            code_length: config.code_length,
            voting_window: config.voting_window_delta(),
            default_question: config.default_question.clone(),
            default_options: config.default_options.clone(),
        }
    }

    /// Creates a room and inserts it into `store`.
    ///
    /// The room starts at `now`, ends one voting window later, and begins
    /// with every count at zero.
    pub fn create<'s>(
        &mut self,
        store: &'s mut RoomStore,
        request: NewPoll,
        now: DateTime<Utc>,
    ) -> &'s Room {
        let code = self.unique_code(store);
        let room = Room::new(
            code,
            request.creator_name.trim().to_string(),
            self.normalize_question(request.question),
            self.normalize_options(request.options),
            now,
            now + self.voting_window,
        );
        store.insert(room)
    }

    fn unique_code(&mut self, store: &RoomStore) -> RoomCode {
        loop {
            let candidate = self.generator.generate(self.code_length);
            if !store.contains(&candidate) {
                return candidate;
            }
            debug!(code = %candidate, "room code collision, regenerating");
        }
    }

    /// Trimmed question, or the default when missing or blank.
    fn normalize_question(&self, question: Option<String>) -> String {
        match question.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => self.default_question.clone(),
        }
    }

    /// Trimmed options if there are at least two and none is blank;
    /// otherwise the defaults, wholesale.
    fn normalize_options(&self, options: Option<Vec<String>>) -> Vec<String> {
        let Some(options) = options else {
            return self.default_options.clone();
        };

        let trimmed: Vec<String> = options.iter().map(|o| o.trim().to_string()).collect();
        if trimmed.len() < 2 || trimmed.iter().any(String::is_empty) {
            debug!(count = options.len(), "malformed options, using defaults");
            return self.default_options.clone();
        }
        trimmed
    }
}
