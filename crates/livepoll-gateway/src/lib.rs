//! Broadcast gateway for Livepoll.
//!
//! The poll engine decides *what* to tell a room; this crate knows *who*
//! is watching it. It keeps:
//!
//! 1. **Viewers**: one per live connection, each with an outbound
//!    channel drained by that connection's writer task.
//! 2. **Broadcast groups**: for every room code, the set of viewers that
//!    created or joined it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)   ← registers connections, delivers engine output here
//!     ↕
//! Gateway (this crate)  ← viewer registry + room-scoped fan-out
//!     ↕
//! Protocol / Transport (below)  ← ServerEvent, RoomCode, ConnectionId
//! ```
//!
//! Delivery is fire-and-forget: a send to a viewer whose connection is
//! already gone is dropped and never reported back to the engine.

mod error;
mod gateway;
mod viewer;

pub use error::GatewayError;
pub use gateway::Gateway;
pub use viewer::{Viewer, ViewerReceiver, ViewerSender, viewer_channel};
