//! Live poll server.
//!
//! Configuration comes from the environment (`LIVEPOLL_BIND` or `PORT`,
//! `LIVEPOLL_VOTING_WINDOW_SECS`, ...). Log filtering follows `RUST_LOG`
//! and defaults to `info`.

use livepoll::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let server = LivepollServerBuilder::from_config(config).build().await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
