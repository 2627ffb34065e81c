//! # Livepoll
//!
//! Server for short-lived live polls. A creator opens a room with a
//! question and options, participants join by room code and vote once
//! each, and every viewer of the room sees the tallies move until the
//! voting window closes.
//!
//! This crate is the glue: it accepts WebSocket connections, decodes
//! [`ClientAction`](livepoll_protocol::ClientAction) frames, runs them
//! through the [`PollEngine`](livepoll_room::PollEngine), and fans the
//! resulting events out through the [`Gateway`](livepoll_gateway::Gateway).
//! Two background tasks sweep the engine: one ends overdue polls, the
//! other reaps rooms that have been over for a while.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livepoll::prelude::*;
//!
//! # async fn run() -> Result<(), LivepollError> {
//! let server = LivepollServer::builder()
//!     .bind("0.0.0.0:5000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod sweeper;

pub use config::ServerConfig;
pub use error::LivepollError;
pub use server::{LivepollServer, LivepollServerBuilder};

/// The types most servers and clients need.
pub mod prelude {
    pub use crate::{LivepollError, LivepollServer, LivepollServerBuilder, ServerConfig};
    pub use livepoll_protocol::{
        ClientAction, ErrorCode, PollOutcome, PollSnapshot, RoomCode, ServerEvent,
    };
    pub use livepoll_room::PollConfig;
}
