//! The poll engine: every participant action and background sweep.

use chrono::{DateTime, Utc};
use livepoll_protocol::{ClientAction, PollSnapshot, RoomCode, ServerEvent};
use tracing::{debug, info};

use crate::expiry::{self, Expiry};
use crate::factory::{CodeGenerator, NewPoll, RoomFactory};
use crate::{PollConfig, PollError, Reaper, Room, RoomStore, voting};

/// An event for every viewer of `room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub room: RoomCode,
    pub event: ServerEvent,
}

impl Broadcast {
    fn poll_ended(room: &Room, now: DateTime<Utc>) -> Self {
        Self {
            room: room.code().clone(),
            event: ServerEvent::PollEnded {
                room: room.snapshot(now),
            },
        }
    }
}

/// The result of an action plus whatever it needs broadcast.
///
/// Broadcasts can be present even when `result` is an error: a vote that
/// arrives just after the deadline is rejected and also ends the poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub result: Result<T, PollError>,
    pub broadcasts: Vec<Broadcast>,
}

impl<T> Outcome<T> {
    fn rejected(err: PollError, broadcasts: Vec<Broadcast>) -> Self {
        Self {
            result: Err(err),
            broadcasts,
        }
    }
}

/// A freshly created room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub code: RoomCode,
    pub room: PollSnapshot,
}

/// A successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub code: RoomCode,
    pub room: PollSnapshot,
    /// The option this participant already voted for, if any.
    pub your_vote: Option<usize>,
}

/// What the server should do after a decoded [`ClientAction`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// Sent to the caller only.
    pub reply: Option<ServerEvent>,
    /// Room whose broadcast group the caller joins, before anything is
    /// delivered.
    pub subscribe: Option<RoomCode>,
    /// Sent to every viewer of each room, after the reply.
    pub broadcasts: Vec<Broadcast>,
}

/// Owns the room store and runs every operation against it.
///
/// Operations are synchronous and take `now` explicitly; the caller
/// provides mutual exclusion.
#[derive(Debug)]
pub struct PollEngine {
    store: RoomStore,
    factory: RoomFactory,
    reaper: Reaper,
    config: PollConfig,
}

impl PollEngine {
    pub fn new(config: PollConfig) -> Self {
        let config = config.validated();
        let factory = RoomFactory::new(&config);
        Self::assemble(config, factory)
    }

    /// Like [`new`](Self::new) but with a custom code source.
    pub fn with_generator(config: PollConfig, generator: impl CodeGenerator + 'static) -> Self {
        let config = config.validated();
        let factory = RoomFactory::with_generator(&config, generator);
        Self::assemble(config, factory)
    }

    fn assemble(config: PollConfig, factory: RoomFactory) -> Self {
        Self {
            store: RoomStore::new(),
            factory,
            reaper: Reaper::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.store.get(code)
    }

    pub fn room_count(&self) -> usize {
        self.store.len()
    }

    // -----------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------

    /// Opens a room. Never fails: bad content is replaced with defaults.
    pub fn create_room(&mut self, request: NewPoll, now: DateTime<Utc>) -> Created {
        let created = self.factory.create(&mut self.store, request, now);
        let code = created.code().clone();
        let room = created.snapshot(now);

        info!(
            room = %code,
            creator = %room.creator_name,
            options = room.options.len(),
            "room created"
        );

        Created { code, room }
    }

    /// Looks up a room for a viewer, restoring their earlier vote if any.
    pub fn join_room(&mut self, code: &RoomCode, participant: &str, now: DateTime<Utc>) -> Outcome<Joined> {
        let participant = participant.trim();
        let Some((room, broadcasts)) = self.observe(code, now) else {
            return Outcome::rejected(PollError::RoomNotFound(code.clone()), Vec::new());
        };

        let your_vote = room.choice_of(participant);
        Outcome {
            result: Ok(Joined {
                code: code.clone(),
                room: room.snapshot(now),
                your_vote,
            }),
            broadcasts,
        }
    }

    /// Records one vote and broadcasts the new tallies.
    ///
    /// Rejections, first match wins: unknown room, poll over, already
    /// voted, option out of range.
    pub fn submit_vote(
        &mut self,
        code: &RoomCode,
        participant: &str,
        option_index: i64,
        now: DateTime<Utc>,
    ) -> Outcome<PollSnapshot> {
        let participant = participant.trim();
        let Some(room) = self.store.get_mut(code) else {
            return Outcome::rejected(PollError::RoomNotFound(code.clone()), Vec::new());
        };

        let (expiry, mut broadcasts) = apply_expiry(room, now);
        if !expiry.is_active {
            return Outcome::rejected(PollError::PollEnded(code.clone()), broadcasts);
        }

        match voting::cast(room, participant, option_index) {
            Ok(index) => {
                debug!(room = %code, participant, option = index, "vote recorded");
                let snapshot = room.snapshot(now);
                broadcasts.push(Broadcast {
                    room: code.clone(),
                    event: ServerEvent::VoteUpdate {
                        room: snapshot.clone(),
                    },
                });
                Outcome {
                    result: Ok(snapshot),
                    broadcasts,
                }
            }
            Err(err) => {
                debug!(room = %code, participant, error = %err, "vote rejected");
                Outcome::rejected(err, broadcasts)
            }
        }
    }

    /// Current state of a room, ending it first if its window is over.
    pub fn check_status(&mut self, code: &RoomCode, now: DateTime<Utc>) -> Outcome<PollSnapshot> {
        match self.observe(code, now) {
            Some((room, broadcasts)) => Outcome {
                result: Ok(room.snapshot(now)),
                broadcasts,
            },
            None => Outcome::rejected(PollError::RoomNotFound(code.clone()), Vec::new()),
        }
    }

    // -----------------------------------------------------------------
    // Background work
    // -----------------------------------------------------------------

    /// Ends every room whose window has passed and returns one
    /// `poll_ended` broadcast per room that just ended.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<Broadcast> {
        self.store
            .iter_mut()
            .flat_map(|room| apply_expiry(room, now).1)
            .collect()
    }

    /// Evicts rooms past retention and returns their codes.
    pub fn reap(&mut self, now: DateTime<Utc>) -> Vec<RoomCode> {
        self.reaper.sweep(&mut self.store, now)
    }

    // -----------------------------------------------------------------
    // Wire entry point
    // -----------------------------------------------------------------

    /// Runs a decoded client action and says what to deliver where.
    pub fn dispatch(&mut self, action: ClientAction, now: DateTime<Utc>) -> Dispatch {
        match action {
            ClientAction::CreateRoom {
                creator_name,
                question,
                options,
            } => {
                let created = self.create_room(
                    NewPoll {
                        creator_name,
                        question,
                        options,
                    },
                    now,
                );
                Dispatch {
                    subscribe: Some(created.code.clone()),
                    reply: Some(ServerEvent::RoomCreated {
                        room_code: created.code,
                        room: created.room,
                    }),
                    broadcasts: Vec::new(),
                }
            }

            ClientAction::JoinRoom {
                room_code,
                participant_name,
            } => {
                let Outcome { result, broadcasts } = self.join_room(&room_code, &participant_name, now);
                match result {
                    Ok(joined) => Dispatch {
                        subscribe: Some(joined.code.clone()),
                        reply: Some(ServerEvent::RoomJoined {
                            room_code: joined.code,
                            room: joined.room,
                            your_vote: joined.your_vote,
                        }),
                        broadcasts,
                    },
                    Err(err) => Dispatch::failed(err, broadcasts),
                }
            }

            ClientAction::SubmitVote {
                room_code,
                participant_name,
                option_index,
            } => {
                let Outcome { result, broadcasts } =
                    self.submit_vote(&room_code, &participant_name, option_index, now);
                match result {
                    Ok(_) => Dispatch {
                        broadcasts,
                        ..Dispatch::default()
                    },
                    Err(err) => Dispatch::failed(err, broadcasts),
                }
            }

            ClientAction::CheckPollStatus { room_code } => {
                let Outcome { result, broadcasts } = self.check_status(&room_code, now);
                match result {
                    Ok(room) => Dispatch {
                        reply: Some(ServerEvent::PollStatus { room }),
                        subscribe: None,
                        broadcasts,
                    },
                    Err(err) => Dispatch::failed(err, broadcasts),
                }
            }
        }
    }

    /// Looks up a room and runs the expiry check on it.
    fn observe(&mut self, code: &RoomCode, now: DateTime<Utc>) -> Option<(&Room, Vec<Broadcast>)> {
        let room = self.store.get_mut(code)?;
        let (_, broadcasts) = apply_expiry(room, now);
        Some((&*room, broadcasts))
    }
}

impl Dispatch {
    fn failed(err: PollError, broadcasts: Vec<Broadcast>) -> Self {
        Self {
            reply: Some(err.to_event()),
            subscribe: None,
            broadcasts,
        }
    }
}

/// Evaluates expiry and, on the edge, ends the room and builds its
/// `poll_ended` broadcast.
fn apply_expiry(room: &mut Room, now: DateTime<Utc>) -> (Expiry, Vec<Broadcast>) {
    let expiry = expiry::evaluate(room, now);
    if !expiry.just_ended {
        return (expiry, Vec::new());
    }

    room.mark_ended();
    info!(
        room = %room.code(),
        votes = room.total_votes(),
        voters = room.voter_count(),
        "poll ended"
    );
    (expiry, vec![Broadcast::poll_ended(room, now)])
}
