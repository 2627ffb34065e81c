//! `LivepollServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → engine → gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use livepoll_gateway::Gateway;
use livepoll_protocol::JsonCodec;
use livepoll_room::{Broadcast, PollConfig, PollEngine};
use livepoll_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::sweeper;
use crate::{LivepollError, ServerConfig};

/// Shared server state passed to each connection handler and sweeper.
///
/// Lock order is always `engine` then `gateway`. Holding the engine while
/// enqueueing keeps delivery order equal to the order actions ran in.
pub(crate) struct ServerState {
    pub(crate) engine: Mutex<PollEngine>,
    pub(crate) gateway: Mutex<Gateway>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

impl ServerState {
    pub(crate) fn new(config: &ServerConfig) -> Self {
        Self {
            engine: Mutex::new(PollEngine::new(config.poll.clone())),
            gateway: Mutex::new(Gateway::new()),
            codec: JsonCodec,
            idle_timeout: config.idle_timeout,
        }
    }
}

/// Enqueues each broadcast for every viewer of its room.
pub(crate) fn deliver(gateway: &Gateway, broadcasts: Vec<Broadcast>) {
    for Broadcast { room, event } in broadcasts {
        let kind = event.kind();
        let delivered = gateway.notify_room(&room, event);
        tracing::trace!(room_code = %room, event = kind, delivered, "broadcast");
    }
}

/// Builder for configuring and starting a Livepoll server.
///
/// # Example
///
/// ```rust,ignore
/// let server = LivepollServer::builder()
///     .bind("127.0.0.1:0")
///     .voting_window(Duration::from_secs(30))
///     .build()
///     .await?;
/// let addr = server.local_addr()?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct LivepollServerBuilder {
    config: ServerConfig,
}

impl LivepollServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing config, e.g. [`ServerConfig::from_env`].
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the engine configuration.
    pub fn poll_config(mut self, poll: PollConfig) -> Self {
        self.config.poll = poll;
        self
    }

    pub fn voting_window(mut self, window: Duration) -> Self {
        self.config.poll.voting_window = window;
        self
    }

    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.poll.retention = retention;
        self
    }

    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.config.reap_interval = interval;
        self
    }

    /// Zero disables the background expiry sweep.
    pub fn expiry_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.expiry_sweep_interval = interval;
        self
    }

    /// Applies only to connections watching no room. Zero disables it.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener and prepares the server.
    ///
    /// # Errors
    /// [`LivepollError::Transport`] if the address can't be bound.
    pub async fn build(self) -> Result<LivepollServer, LivepollError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let state = Arc::new(ServerState::new(&self.config));

        Ok(LivepollServer {
            transport,
            state,
            config: self.config,
        })
    }
}

/// A bound Livepoll server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LivepollServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl LivepollServer {
    /// Creates a new builder.
    pub fn builder() -> LivepollServerBuilder {
        LivepollServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LivepollError> {
        Ok(self.transport.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the background sweeps and the accept loop.
    ///
    /// Spawns a handler task per connection. Runs until the process is
    /// terminated or the future is dropped.
    pub async fn run(mut self) -> Result<(), LivepollError> {
        let addr = self.local_addr()?;
        tracing::info!(
            %addr,
            voting_window_secs = self.config.poll.voting_window.as_secs(),
            "livepoll server listening"
        );

        let expiry = tokio::spawn(sweeper::run_expiry_sweep(
            Arc::clone(&self.state),
            self.config.expiry_sweep_interval,
        ));
        let reaper = tokio::spawn(sweeper::run_reaper(
            Arc::clone(&self.state),
            self.config.reap_interval,
        ));
        let _sweepers = AbortOnDrop(vec![expiry, reaper]);

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Stops the sweeper tasks when the server future goes away.
struct AbortOnDrop(Vec<tokio::task::JoinHandle<()>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
