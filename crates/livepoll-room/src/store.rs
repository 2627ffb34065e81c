//! The room store.

use std::collections::HashMap;
use std::collections::hash_map;

use livepoll_protocol::RoomCode;

use crate::Room;

/// Map from room code to room.
///
/// Rooms live here from creation until the reaper removes them. Codes are
/// stored in canonical uppercase form, so lookups should go through a
/// [`RoomCode`] built with [`RoomCode::new`].
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub(crate) fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Inserts a room under its own code. The factory only hands out
    /// codes that are free.
    pub(crate) fn insert(&mut self, room: Room) -> &mut Room {
        self.rooms
            .entry(room.code().clone())
            .insert_entry(room)
            .into_mut()
    }

    pub(crate) fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        self.rooms.remove(code)
    }

    pub fn iter(&self) -> hash_map::Values<'_, RoomCode, Room> {
        self.rooms.values()
    }

    pub(crate) fn iter_mut(&mut self) -> hash_map::ValuesMut<'_, RoomCode, Room> {
        self.rooms.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
