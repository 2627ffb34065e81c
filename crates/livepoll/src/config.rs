//! Server configuration and environment loading.

use std::str::FromStr;
use std::time::Duration;

use livepoll_room::PollConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for a [`LivepollServer`](crate::LivepollServer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// How often the reaper evicts rooms past retention.
    pub reap_interval: Duration,

    /// How often overdue polls are ended and announced. Zero disables the
    /// sweep; polls then end only when someone looks at them.
    pub expiry_sweep_interval: Duration,

    /// A connection that watches no room and sends nothing for this long
    /// is closed. Viewers of a room are never timed out. Zero disables it.
    pub idle_timeout: Duration,

    /// Engine settings.
    pub poll: PollConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            reap_interval: Duration::from_secs(10 * 60),
            expiry_sweep_interval: Duration::from_secs(1),
            idle_timeout: Duration::from_secs(5 * 60),
            poll: PollConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Builds a config from `LIVEPOLL_*` environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `LIVEPOLL_BIND` (or `PORT`, binding `0.0.0.0`) | `bind_addr` |
    /// | `LIVEPOLL_VOTING_WINDOW_SECS` | `poll.voting_window` |
    /// | `LIVEPOLL_RETENTION_SECS` | `poll.retention` |
    /// | `LIVEPOLL_REAP_INTERVAL_SECS` | `reap_interval` |
    /// | `LIVEPOLL_EXPIRY_SWEEP_MS` | `expiry_sweep_interval` |
    /// | `LIVEPOLL_IDLE_TIMEOUT_SECS` | `idle_timeout` |
    ///
    /// Missing variables keep their defaults. Values that don't parse are
    /// logged and ignored; this never fails.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = lookup("LIVEPOLL_BIND").filter(|b| !b.trim().is_empty()) {
            config.bind_addr = bind.trim().to_string();
        } else if let Some(port) = parse::<u16>(&lookup, "PORT") {
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(secs) = parse::<u64>(&lookup, "LIVEPOLL_VOTING_WINDOW_SECS") {
            config.poll.voting_window = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "LIVEPOLL_RETENTION_SECS") {
            config.poll.retention = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "LIVEPOLL_REAP_INTERVAL_SECS") {
            config.reap_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = parse::<u64>(&lookup, "LIVEPOLL_EXPIRY_SWEEP_MS") {
            config.expiry_sweep_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse::<u64>(&lookup, "LIVEPOLL_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}
