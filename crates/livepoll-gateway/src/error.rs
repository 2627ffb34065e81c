//! Error types for the gateway.

use livepoll_transport::ConnectionId;

/// Errors from viewer registration and group membership.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No viewer is registered under this connection.
    #[error("viewer {0} is not registered")]
    UnknownViewer(ConnectionId),

    /// A viewer is already registered under this connection.
    #[error("viewer {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}
