//! Viewer types: one connected client and its outbound channel.

use std::collections::BTreeSet;

use livepoll_protocol::{RoomCode, ServerEvent};
use livepoll_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel sender for delivering events to one viewer's writer task.
///
/// Unbounded so that enqueueing never waits: the server enqueues while
/// holding the engine lock, and a slow viewer must not stall a room.
pub type ViewerSender = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half, owned by the connection's writer task.
pub type ViewerReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Creates the channel pair for a new viewer.
pub fn viewer_channel() -> (ViewerSender, ViewerReceiver) {
    mpsc::unbounded_channel()
}

/// A connected client as the gateway sees it.
#[derive(Debug)]
pub struct Viewer {
    id: ConnectionId,
    sender: ViewerSender,
    /// Rooms whose broadcasts this viewer receives.
    rooms: BTreeSet<RoomCode>,
}

impl Viewer {
    pub(crate) fn new(id: ConnectionId, sender: ViewerSender) -> Self {
        Self {
            id,
            sender,
            rooms: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Rooms this viewer is subscribed to, in code order.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomCode> {
        self.rooms.iter()
    }

    pub fn is_watching(&self, room: &RoomCode) -> bool {
        self.rooms.contains(room)
    }

    pub(crate) fn watch(&mut self, room: RoomCode) -> bool {
        self.rooms.insert(room)
    }

    pub(crate) fn unwatch(&mut self, room: &RoomCode) -> bool {
        self.rooms.remove(room)
    }

    /// Enqueues an event. Returns `false` if the writer task is gone.
    pub(crate) fn deliver(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}
