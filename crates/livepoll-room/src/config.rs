//! Engine configuration.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for the poll engine.
///
/// Construct with `PollConfig::default()` and override what you need;
/// [`PollEngine::new`](crate::PollEngine::new) runs [`validated`](Self::validated)
/// on whatever it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// How long a room accepts votes after it is created.
    pub voting_window: Duration,

    /// How long an ended room stays queryable before the reaper may
    /// remove it.
    pub retention: Duration,

    /// Length of generated room codes.
    pub code_length: usize,

    /// Question used when the creator leaves it blank.
    pub default_question: String,

    /// Options used when the creator's list is missing or malformed.
    pub default_options: Vec<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            voting_window: Duration::from_secs(60),
            retention: Duration::from_secs(30 * 60),
            code_length: 6,
            default_question: "Cats vs Dogs".to_string(),
            default_options: vec!["Option A".to_string(), "Option B".to_string()],
        }
    }
}

impl PollConfig {
    pub const MIN_VOTING_WINDOW: Duration = Duration::from_secs(1);
    pub const MAX_VOTING_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
    pub const MAX_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    pub const MIN_CODE_LENGTH: usize = 4;
    pub const MAX_CODE_LENGTH: usize = 12;

    /// Clamps out-of-range values and restores unusable defaults.
    ///
    /// - `voting_window` into `MIN_VOTING_WINDOW..=MAX_VOTING_WINDOW`
    /// - `retention` to at most `MAX_RETENTION`
    /// - `code_length` into `MIN_CODE_LENGTH..=MAX_CODE_LENGTH`
    /// - a blank `default_question` or a `default_options` list that
    ///   isn't at least two non-blank entries falls back to the built-in
    ///   value
    pub fn validated(mut self) -> Self {
        let builtin = Self::default();

        let window = self
            .voting_window
            .clamp(Self::MIN_VOTING_WINDOW, Self::MAX_VOTING_WINDOW);
        if window != self.voting_window {
            warn!(
                requested_ms = self.voting_window.as_millis() as u64,
                clamped_ms = window.as_millis() as u64,
                "voting window out of range, clamping"
            );
            self.voting_window = window;
        }

        if self.retention > Self::MAX_RETENTION {
            warn!(
                requested_secs = self.retention.as_secs(),
                clamped_secs = Self::MAX_RETENTION.as_secs(),
                "retention out of range, clamping"
            );
            self.retention = Self::MAX_RETENTION;
        }

        let length = self
            .code_length
            .clamp(Self::MIN_CODE_LENGTH, Self::MAX_CODE_LENGTH);
        if length != self.code_length {
            warn!(
                requested = self.code_length,
                clamped = length,
                "room code length out of range, clamping"
            );
            self.code_length = length;
        }

        if self.default_question.trim().is_empty() {
            warn!("blank default question, using built-in default");
            self.default_question = builtin.default_question;
        }

        let usable = self.default_options.len() >= 2
            && self.default_options.iter().all(|o| !o.trim().is_empty());
        if !usable {
            warn!(
                count = self.default_options.len(),
                "default options need at least two non-blank entries, using built-in defaults"
            );
            self.default_options = builtin.default_options;
        }

        self
    }

    /// The voting window as a `chrono` delta.
    pub fn voting_window_delta(&self) -> TimeDelta {
        to_delta(self.voting_window)
    }

    /// The retention window as a `chrono` delta.
    pub fn retention_delta(&self) -> TimeDelta {
        to_delta(self.retention)
    }
}

/// Both windows are clamped well inside `TimeDelta`'s range by
/// `validated`; the fallback only applies to unvalidated configs.
fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or_else(|_| TimeDelta::days(7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_live_poll_settings() {
        let config = PollConfig::default();
        assert_eq!(config.voting_window, Duration::from_secs(60));
        assert_eq!(config.retention, Duration::from_secs(1800));
        assert_eq!(config.code_length, 6);
        assert_eq!(config.default_question, "Cats vs Dogs");
        assert_eq!(config.default_options, vec!["Option A", "Option B"]);
    }

    #[test]
    fn test_validated_keeps_default_unchanged() {
        assert_eq!(PollConfig::default().validated(), PollConfig::default());
    }

    #[test]
    fn test_validated_clamps_window_and_code_length() {
        let config = PollConfig {
            voting_window: Duration::from_millis(10),
            code_length: 40,
            ..PollConfig::default()
        }
        .validated();

        assert_eq!(config.voting_window, PollConfig::MIN_VOTING_WINDOW);
        assert_eq!(config.code_length, PollConfig::MAX_CODE_LENGTH);
    }

    #[test]
    fn test_validated_clamps_retention() {
        let config = PollConfig {
            retention: Duration::from_secs(u64::MAX / 2),
            ..PollConfig::default()
        }
        .validated();

        assert_eq!(config.retention, PollConfig::MAX_RETENTION);
    }

    #[test]
    fn test_validated_restores_unusable_defaults() {
        let config = PollConfig {
            default_question: "   ".into(),
            default_options: vec!["Only".into()],
            ..PollConfig::default()
        }
        .validated();

        assert_eq!(config.default_question, "Cats vs Dogs");
        assert_eq!(config.default_options, vec!["Option A", "Option B"]);
    }

    #[test]
    fn test_deltas_match_durations() {
        let config = PollConfig::default();
        assert_eq!(config.voting_window_delta(), TimeDelta::seconds(60));
        assert_eq!(config.retention_delta(), TimeDelta::minutes(30));
    }
}
