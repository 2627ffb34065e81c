//! Background sweeps over the poll engine.
//!
//! Both tasks lock the engine only for the sweep itself and release it
//! before waiting for the next one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use livepoll_sweep::SweepScheduler;

use crate::server::{ServerState, deliver};

/// Ends overdue polls and announces them with `poll_ended`.
pub(crate) async fn run_expiry_sweep(state: Arc<ServerState>, interval: Duration) {
    let mut scheduler = SweepScheduler::every("expiry", interval);
    if scheduler.is_disabled() {
        tracing::info!("expiry sweep disabled, polls end on next observation");
        return;
    }

    loop {
        scheduler.wait_for_sweep().await;
        expire_once(&state).await;
        scheduler.record_sweep_end();
    }
}

/// Evicts rooms past retention and drops their broadcast groups.
pub(crate) async fn run_reaper(state: Arc<ServerState>, interval: Duration) {
    let mut scheduler = SweepScheduler::every("reaper", interval);
    if scheduler.is_disabled() {
        tracing::info!("reaper disabled");
        return;
    }

    loop {
        let info = scheduler.wait_for_sweep().await;
        let reaped = reap_once(&state).await;
        scheduler.record_sweep_end();

        if reaped > 0 {
            let metrics = scheduler.metrics();
            tracing::info!(
                sweep = info.sweep,
                reaped,
                sweep_ms = metrics.last_sweep_time.as_millis() as u64,
                overruns = metrics.total_overruns,
                "reaper sweep finished"
            );
        }
    }
}

pub(crate) async fn expire_once(state: &ServerState) -> usize {
    let mut engine = state.engine.lock().await;
    let broadcasts = engine.sweep_expired(Utc::now());
    let ended = broadcasts.len();
    if ended > 0 {
        let gateway = state.gateway.lock().await;
        deliver(&gateway, broadcasts);
    }
    ended
}

pub(crate) async fn reap_once(state: &ServerState) -> usize {
    let mut engine = state.engine.lock().await;
    let reaped = engine.reap(Utc::now());
    if !reaped.is_empty() {
        let mut gateway = state.gateway.lock().await;
        for code in &reaped {
            let dropped = gateway.close_room(code);
            tracing::debug!(room_code = %code, viewers = dropped, "closed broadcast group");
        }
    }
    reaped.len()
}

#[cfg(test)]
mod tests {
    use livepoll_gateway::viewer_channel;
    use livepoll_protocol::ServerEvent;
    use livepoll_room::{NewPoll, PollConfig};
    use livepoll_transport::ConnectionId;

    use super::*;
    use crate::ServerConfig;

    fn state() -> ServerState {
        ServerState::new(&ServerConfig::default())
    }

    #[tokio::test]
    async fn test_expire_once_broadcasts_poll_ended_to_viewers() {
        let state = state();
        let (tx, mut rx) = viewer_channel();
        let id = ConnectionId::new(1);

        let code = {
            let mut engine = state.engine.lock().await;
            let past = Utc::now() - chrono::TimeDelta::seconds(120);
            engine.create_room(NewPoll::default(), past).code
        };
        {
            let mut gateway = state.gateway.lock().await;
            gateway.register(id, tx).unwrap();
            gateway.subscribe(id, &code).unwrap();
        }

        assert_eq!(expire_once(&state).await, 1);
        assert_eq!(expire_once(&state).await, 0);

        match rx.try_recv().unwrap() {
            ServerEvent::PollEnded { room } => {
                assert_eq!(room.code, code);
                assert!(!room.is_active);
            }
            other => panic!("expected PollEnded, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reap_once_removes_room_and_group() {
        let state = ServerState::new(&ServerConfig {
            poll: PollConfig {
                retention: Duration::ZERO,
                ..PollConfig::default()
            },
            ..ServerConfig::default()
        });
        let (tx, _rx) = viewer_channel();
        let id = ConnectionId::new(1);

        let code = {
            let mut engine = state.engine.lock().await;
            let past = Utc::now() - chrono::TimeDelta::seconds(120);
            engine.create_room(NewPoll::default(), past).code
        };
        {
            let mut gateway = state.gateway.lock().await;
            gateway.register(id, tx).unwrap();
            gateway.subscribe(id, &code).unwrap();
        }

        assert_eq!(reap_once(&state).await, 1);
        assert_eq!(state.engine.lock().await.room_count(), 0);
        assert_eq!(state.gateway.lock().await.group_size(&code), 0);
    }

    #[tokio::test]
    async fn test_reap_once_keeps_fresh_rooms() {
        let state = state();
        state
            .engine
            .lock()
            .await
            .create_room(NewPoll::default(), Utc::now());

        assert_eq!(reap_once(&state).await, 0);
        assert_eq!(state.engine.lock().await.room_count(), 1);
    }
}
