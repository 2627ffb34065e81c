//! The gateway: tracks viewers and fans events out to room groups.
//!
//! # Concurrency note
//!
//! `Gateway` is a plain data structure with no interior locking. The
//! server keeps it behind a mutex and always takes the engine lock first,
//! so the order events are enqueued matches the order the engine
//! produced them.

use std::collections::{HashMap, HashSet};

use livepoll_protocol::{RoomCode, ServerEvent};
use livepoll_transport::ConnectionId;

use crate::{GatewayError, Viewer, ViewerSender};

/// Viewer registry plus one broadcast group per room code.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ subscribe(room) ──→ notify_room(room, ..)
///     │                                   │
///     ▼                                   ▼
/// unregister()  (connection closed)   close_room(room)  (room reaped)
/// ```
#[derive(Debug, Default)]
pub struct Gateway {
    viewers: HashMap<ConnectionId, Viewer>,
    /// Room code → viewers subscribed to it. Kept in sync with each
    /// viewer's own room set; empty groups are removed.
    groups: HashMap<RoomCode, HashSet<ConnectionId>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and the channel its writer task drains.
    ///
    /// # Errors
    /// [`GatewayError::AlreadyRegistered`] if `id` is already known.
    pub fn register(
        &mut self,
        id: ConnectionId,
        sender: ViewerSender,
    ) -> Result<(), GatewayError> {
        if self.viewers.contains_key(&id) {
            return Err(GatewayError::AlreadyRegistered(id));
        }
        self.viewers.insert(id, Viewer::new(id, sender));
        tracing::debug!(conn_id = %id, viewers = self.viewers.len(), "viewer registered");
        Ok(())
    }

    /// Removes a connection and drops it from every group it was in.
    ///
    /// Returns the removed viewer, or `None` if it was never registered.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Viewer> {
        let viewer = self.viewers.remove(&id)?;
        for room in viewer.rooms() {
            self.leave_group(room, id);
        }
        tracing::debug!(conn_id = %id, viewers = self.viewers.len(), "viewer unregistered");
        Some(viewer)
    }

    /// Adds a viewer to a room's broadcast group.
    ///
    /// Returns `Ok(true)` if the viewer was newly added, `Ok(false)` if it
    /// was already in the group.
    ///
    /// # Errors
    /// [`GatewayError::UnknownViewer`] if `id` isn't registered.
    pub fn subscribe(
        &mut self,
        id: ConnectionId,
        room: &RoomCode,
    ) -> Result<bool, GatewayError> {
        let viewer = self
            .viewers
            .get_mut(&id)
            .ok_or(GatewayError::UnknownViewer(id))?;

        if !viewer.watch(room.clone()) {
            return Ok(false);
        }
        self.groups.entry(room.clone()).or_default().insert(id);
        tracing::debug!(conn_id = %id, room_code = %room, "viewer subscribed");
        Ok(true)
    }

    /// Sends an event to a single viewer.
    ///
    /// Returns `false` if the viewer is unknown or its writer task is gone.
    pub fn send_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let Some(viewer) = self.viewers.get(&id) else {
            tracing::debug!(conn_id = %id, kind = event.kind(), "send to unknown viewer dropped");
            return false;
        };
        let delivered = viewer.deliver(event);
        if !delivered {
            tracing::debug!(conn_id = %id, "viewer channel closed, event dropped");
        }
        delivered
    }

    /// Sends an event to every viewer of `room`.
    ///
    /// Returns how many viewers it was enqueued for.
    pub fn notify_room(&self, room: &RoomCode, event: ServerEvent) -> usize {
        let Some(members) = self.groups.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for id in members {
            if let Some(viewer) = self.viewers.get(id) {
                if viewer.deliver(event.clone()) {
                    delivered += 1;
                } else {
                    tracing::debug!(conn_id = %id, room_code = %room, "viewer channel closed, broadcast dropped");
                }
            }
        }

        tracing::debug!(
            room_code = %room,
            kind = event.kind(),
            delivered,
            group = members.len(),
            "room notified"
        );
        delivered
    }

    /// Dissolves a room's group, e.g. after the room was reaped.
    ///
    /// Returns how many viewers were in it.
    pub fn close_room(&mut self, room: &RoomCode) -> usize {
        let Some(members) = self.groups.remove(room) else {
            return 0;
        };
        for id in &members {
            if let Some(viewer) = self.viewers.get_mut(id) {
                viewer.unwatch(room);
            }
        }
        members.len()
    }

    /// Number of viewers currently subscribed to `room`.
    pub fn group_size(&self, room: &RoomCode) -> usize {
        self.groups.get(room).map_or(0, HashSet::len)
    }

    pub fn viewer(&self, id: ConnectionId) -> Option<&Viewer> {
        self.viewers.get(&id)
    }

    /// Number of registered viewers.
    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    fn leave_group(&mut self, room: &RoomCode, id: ConnectionId) {
        if let Some(members) = self.groups.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                self.groups.remove(room);
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
