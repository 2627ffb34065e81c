//! Integration tests for the poll engine: full create → join → vote →
//! expire → reap lifecycles driven with explicit timestamps.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use livepoll_protocol::{ClientAction, ErrorCode, PollOutcome, RoomCode, ServerEvent};
use livepoll_room::{CodeGenerator, NewPoll, PollConfig, PollEngine, PollError};

// =========================================================================
// Helpers
// =========================================================================

fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

fn new_poll(question: Option<&str>, options: Option<Vec<&str>>) -> NewPoll {
    NewPoll {
        creator_name: "ana".into(),
        question: question.map(String::from),
        options: options.map(|o| o.into_iter().map(String::from).collect()),
    }
}

fn engine_with_cats_vs_dogs() -> (PollEngine, RoomCode) {
    let mut engine = PollEngine::new(PollConfig::default());
    let created = engine.create_room(new_poll(Some("Cats vs Dogs"), Some(vec!["Cats", "Dogs"])), t0());
    (engine, created.code)
}

/// Hands out a fixed sequence of codes.
struct ScriptedCodes(VecDeque<&'static str>);

impl CodeGenerator for ScriptedCodes {
    fn generate(&mut self, _length: usize) -> RoomCode {
        RoomCode::new(self.0.pop_front().expect("script exhausted"))
    }
}

// =========================================================================
// Creation
// =========================================================================

#[test]
fn test_create_room_counts_start_at_zero() {
    let (engine, code) = engine_with_cats_vs_dogs();
    let room = engine.room(&code).unwrap();

    assert_eq!(room.options().len(), 2);
    assert_eq!(room.total_votes(), 0);
    assert_eq!(room.voter_count(), 0);
    assert_eq!(room.ends_at() - room.started_at(), TimeDelta::seconds(60));
    assert!(room.is_active());
}

#[test]
fn test_create_room_code_is_six_uppercase_alphanumerics() {
    let (_, code) = engine_with_cats_vs_dogs();
    assert_eq!(code.as_str().len(), 6);
    assert!(code
        .as_str()
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
}

#[test]
fn test_create_room_single_option_falls_back_to_defaults() {
    let mut engine = PollEngine::new(PollConfig::default());
    let created = engine.create_room(new_poll(Some("Best?"), Some(vec!["OnlyOne"])), t0());

    assert_eq!(created.room.options, vec!["Option A", "Option B"]);
    assert_eq!(created.room.question, "Best?");
}

#[test]
fn test_create_room_blank_question_uses_default() {
    let mut engine = PollEngine::new(PollConfig::default());
    let created = engine.create_room(new_poll(Some("   "), None), t0());

    assert_eq!(created.room.question, "Cats vs Dogs");
    assert_eq!(created.room.options, vec!["Option A", "Option B"]);
}

#[test]
fn test_create_room_collision_regenerates_code() {
    let script = ScriptedCodes(VecDeque::from(["AAAAAA", "AAAAAA", "BBBBBB"]));
    let mut engine = PollEngine::with_generator(PollConfig::default(), script);

    let first = engine.create_room(new_poll(None, None), t0());
    let second = engine.create_room(new_poll(None, None), t0());

    assert_eq!(first.code.as_str(), "AAAAAA");
    assert_eq!(second.code.as_str(), "BBBBBB");
    assert_eq!(engine.room_count(), 2);
}

#[test]
fn test_create_room_uses_configured_window() {
    let config = PollConfig {
        voting_window: std::time::Duration::from_secs(5),
        ..PollConfig::default()
    };
    let mut engine = PollEngine::new(config);
    let created = engine.create_room(new_poll(None, None), t0());

    assert_eq!(created.room.ends_at - created.room.started_at, TimeDelta::seconds(5));
    assert_eq!(created.room.remaining_ms, 5_000);
}

// =========================================================================
// Joining
// =========================================================================

#[test]
fn test_join_room_code_is_case_insensitive() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let lower = RoomCode::new(&code.as_str().to_lowercase());

    let joined = engine.join_room(&lower, "ben", t0()).result.unwrap();
    assert_eq!(joined.code, code);
    assert_eq!(joined.your_vote, None);
}

#[test]
fn test_join_room_restores_previous_vote() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    engine.submit_vote(&code, "ben", 1, t0()).result.unwrap();

    let joined = engine.join_room(&code, "ben", t0() + TimeDelta::seconds(5)).result.unwrap();
    assert_eq!(joined.your_vote, Some(1));
    assert_eq!(joined.room.choice_of("ben"), Some(1));
}

#[test]
fn test_join_room_unknown_code_not_found() {
    let mut engine = PollEngine::new(PollConfig::default());
    let outcome = engine.join_room(&RoomCode::new("ZZZZZZ"), "ben", t0());

    assert_eq!(outcome.result.unwrap_err(), PollError::RoomNotFound(RoomCode::new("ZZZZZZ")));
    assert!(outcome.broadcasts.is_empty());
}

#[test]
fn test_join_room_after_deadline_ends_poll_and_still_joins() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let outcome = engine.join_room(&code, "ben", t0() + TimeDelta::seconds(61));

    let joined = outcome.result.unwrap();
    assert!(!joined.room.is_active);
    assert_eq!(joined.room.outcome, Some(PollOutcome::NoVotes));
    assert_eq!(outcome.broadcasts.len(), 1);
    assert!(matches!(outcome.broadcasts[0].event, ServerEvent::PollEnded { .. }));
}

// =========================================================================
// Voting
// =========================================================================

#[test]
fn test_submit_vote_counts_match_voters() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    for (name, choice) in [("ana", 0), ("ben", 1), ("cy", 0), ("dee", 0)] {
        engine.submit_vote(&code, name, choice, t0()).result.unwrap();
    }

    let room = engine.room(&code).unwrap();
    assert_eq!(room.total_votes(), 4);
    assert_eq!(room.total_votes(), room.voter_count() as u64);
    assert_eq!(room.count_for(0), Some(3));
    assert_eq!(room.count_for(1), Some(1));
}

#[test]
fn test_submit_vote_broadcasts_full_snapshot() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let outcome = engine.submit_vote(&code, "ben", 0, t0() + TimeDelta::seconds(10));

    let snapshot = outcome.result.unwrap();
    assert_eq!(snapshot.total_votes, 1);
    assert_eq!(snapshot.remaining_ms, 50_000);
    assert_eq!(outcome.broadcasts.len(), 1);
    assert_eq!(outcome.broadcasts[0].room, code);
    assert_eq!(
        outcome.broadcasts[0].event,
        ServerEvent::VoteUpdate { room: snapshot }
    );
}

#[test]
fn test_submit_vote_twice_already_voted_counts_unchanged() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    engine.submit_vote(&code, "ben", 0, t0()).result.unwrap();

    let outcome = engine.submit_vote(&code, "ben", 1, t0());
    assert!(matches!(outcome.result, Err(PollError::AlreadyVoted { .. })));
    assert!(outcome.broadcasts.is_empty());

    let room = engine.room(&code).unwrap();
    assert_eq!(room.count_for(0), Some(1));
    assert_eq!(room.count_for(1), Some(0));
}

#[test]
fn test_submit_vote_invalid_index_rejected() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    for index in [2, -1] {
        let outcome = engine.submit_vote(&code, "ben", index, t0());
        assert_eq!(outcome.result.unwrap_err().code(), ErrorCode::InvalidOption);
    }
    assert_eq!(engine.room(&code).unwrap().total_votes(), 0);
}

#[test]
fn test_submit_vote_just_before_and_at_deadline_accepted() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let ends_at = engine.room(&code).unwrap().ends_at();

    let before = engine.submit_vote(&code, "ana", 1, ends_at - TimeDelta::milliseconds(1));
    assert_eq!(before.result.unwrap().remaining_ms, 1);
    assert_eq!(before.broadcasts.len(), 1);

    let outcome = engine.submit_vote(&code, "ben", 0, ends_at);
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.result.unwrap().remaining_ms, 0);
    assert!(engine.room(&code).unwrap().is_active());
}

#[test]
fn test_submit_vote_one_ms_late_poll_ended_with_broadcast() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let ends_at = engine.room(&code).unwrap().ends_at();

    let outcome = engine.submit_vote(&code, "ben", 0, ends_at + TimeDelta::milliseconds(1));
    assert_eq!(outcome.result.unwrap_err(), PollError::PollEnded(code.clone()));
    assert_eq!(outcome.broadcasts.len(), 1);
    assert!(matches!(outcome.broadcasts[0].event, ServerEvent::PollEnded { .. }));

    // The edge is reported once; the next late vote is a plain rejection.
    let again = engine.submit_vote(&code, "cy", 0, ends_at + TimeDelta::seconds(5));
    assert_eq!(again.result.unwrap_err().code(), ErrorCode::PollEnded);
    assert!(again.broadcasts.is_empty());
}

#[test]
fn test_submit_vote_ended_poll_checked_before_duplicate() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    engine.submit_vote(&code, "ben", 0, t0()).result.unwrap();

    let outcome = engine.submit_vote(&code, "ben", 0, t0() + TimeDelta::seconds(90));
    assert_eq!(outcome.result.unwrap_err().code(), ErrorCode::PollEnded);
}

// =========================================================================
// Expiry
// =========================================================================

#[test]
fn test_expiry_edge_reported_once_across_observers() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let late = t0() + TimeDelta::seconds(61);

    let status = engine.check_status(&code, late);
    assert_eq!(status.broadcasts.len(), 1);
    assert!(!status.result.unwrap().is_active);

    assert!(engine.sweep_expired(late).is_empty());
    assert!(engine.check_status(&code, late).broadcasts.is_empty());
    assert!(engine.join_room(&code, "ben", late).broadcasts.is_empty());
}

#[test]
fn test_cats_vs_dogs_scenario_winner_cats() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    engine.submit_vote(&code, "ana", 0, t0()).result.unwrap();
    engine.submit_vote(&code, "ben", 0, t0() + TimeDelta::seconds(1)).result.unwrap();

    let late = t0() + TimeDelta::seconds(61);
    let status = engine.check_status(&code, late);
    let snapshot = status.result.unwrap();

    assert!(!snapshot.is_active);
    assert_eq!(snapshot.count_for(0), Some(2));
    assert_eq!(snapshot.count_for(1), Some(0));
    assert_eq!(
        snapshot.outcome,
        Some(PollOutcome::Winner {
            option_index: 0,
            option: "Cats".into()
        })
    );
    match &status.broadcasts[0].event {
        ServerEvent::PollEnded { room } => assert_eq!(room, &snapshot),
        other => panic!("expected PollEnded, got {other:?}"),
    }
}

#[test]
fn test_sweep_expired_only_touches_overdue_rooms() {
    let mut engine = PollEngine::new(PollConfig::default());
    let early = engine.create_room(new_poll(None, None), t0()).code;
    let late = engine
        .create_room(new_poll(None, None), t0() + TimeDelta::seconds(30))
        .code;

    let ended = engine.sweep_expired(t0() + TimeDelta::seconds(61));
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].room, early);
    assert!(engine.room(&late).unwrap().is_active());
}

// =========================================================================
// Reaping
// =========================================================================

#[test]
fn test_reap_after_retention_then_join_not_found() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let ends_at = engine.room(&code).unwrap().ends_at();

    assert!(engine.reap(ends_at + TimeDelta::minutes(29)).is_empty());
    assert_eq!(engine.reap(ends_at + TimeDelta::minutes(31)), vec![code.clone()]);
    assert_eq!(engine.room_count(), 0);

    let outcome = engine.join_room(&code, "ben", ends_at + TimeDelta::minutes(32));
    assert_eq!(outcome.result.unwrap_err().code(), ErrorCode::RoomNotFound);
}

// =========================================================================
// Dispatch
// =========================================================================

#[test]
fn test_dispatch_status_replies_with_snapshot() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let dispatch = engine.dispatch(
        ClientAction::CheckPollStatus {
            room_code: code.clone(),
        },
        t0(),
    );

    assert!(matches!(dispatch.reply, Some(ServerEvent::PollStatus { .. })));
    assert!(dispatch.subscribe.is_none());
    assert!(dispatch.broadcasts.is_empty());
}

#[test]
fn test_dispatch_join_subscribes_caller_to_room() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let dispatch = engine.dispatch(
        ClientAction::JoinRoom {
            room_code: RoomCode::new(&code.as_str().to_lowercase()),
            participant_name: "ben".into(),
        },
        t0(),
    );

    assert_eq!(dispatch.subscribe, Some(code));
    assert!(matches!(dispatch.reply, Some(ServerEvent::RoomJoined { your_vote: None, .. })));
}

#[test]
fn test_dispatch_vote_error_replies_to_caller() {
    let (mut engine, code) = engine_with_cats_vs_dogs();
    let dispatch = engine.dispatch(
        ClientAction::SubmitVote {
            room_code: code,
            participant_name: "ben".into(),
            option_index: 5,
        },
        t0(),
    );

    match dispatch.reply {
        Some(ServerEvent::Error { code, .. }) => assert_eq!(code, ErrorCode::InvalidOption),
        other => panic!("expected error reply, got {other:?}"),
    }
    assert!(dispatch.broadcasts.is_empty());
}
