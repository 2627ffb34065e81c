//! Wire protocol for Livepoll.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Actions** ([`ClientAction`]): create, join, vote, check status.
//! - **Events** ([`ServerEvent`]): replies to the caller and broadcasts
//!   to every viewer of a room.
//! - **Snapshots** ([`PollSnapshot`], [`PollOutcome`]): the room state
//!   carried by every event.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   become bytes.
//!
//! It knows nothing about connections or how rooms are stored.

mod codec;
mod error;
mod snapshot;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use snapshot::{PollOutcome, PollSnapshot};
pub use types::{ClientAction, ErrorCode, RoomCode, ServerEvent};
