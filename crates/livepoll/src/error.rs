//! Unified error type for Livepoll.

use livepoll_gateway::GatewayError;
use livepoll_protocol::ProtocolError;
use livepoll_room::PollError;
use livepoll_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum LivepollError {
    /// Connection, send, receive, or bind failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode, decode, or invalid message.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Viewer registry misuse.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A rejected poll action.
    #[error(transparent)]
    Poll(#[from] PollError),
}
