//! Poll room session engine for Livepoll.
//!
//! Everything here is synchronous and in-memory. Each operation takes the
//! current time as a parameter, runs to completion, and hands back a
//! result for the caller plus the broadcasts that should reach every
//! viewer of the affected room. Delivering those is the server's job.
//!
//! # Key types
//!
//! - [`PollEngine`]: the action entry point (create/join/vote/status,
//!   expiry sweep, reaping)
//! - [`Room`]: one live poll and its tallies
//! - [`RoomStore`]: code → room map; sole owner of room lifetime
//! - [`RoomFactory`] / [`CodeGenerator`]: room codes and initial state
//! - [`expiry::evaluate`]: pure check for the active → ended edge
//! - [`Reaper`]: evicts rooms retained long past their end
//! - [`PollConfig`]: voting window, retention, code length, defaults

mod config;
mod engine;
mod error;
pub mod expiry;
mod factory;
mod reaper;
mod room;
mod store;
mod voting;

pub use config::PollConfig;
pub use engine::{Broadcast, Created, Dispatch, Joined, Outcome, PollEngine};
pub use error::PollError;
pub use expiry::Expiry;
pub use factory::{CodeGenerator, NewPoll, RandomCodes, RoomFactory};
pub use reaper::Reaper;
pub use room::Room;
pub use store::RoomStore;
