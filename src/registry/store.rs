//! Room registry implementation
//!
//! The central registry that maps room IDs to live rooms.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::auth::AuthContext;

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::message::{ConnectionId, RoomId};
use super::room::{Departure, Room, RoomStats, Subscription};

/// Central registry for all live rooms
///
/// The map lock decides insertion and removal. Each room's membership is
/// guarded by the room's own lock, and the lock order is always map first,
/// then room. Neither lock is held across an await point.
pub struct RoomRegistry {
    /// Map of room ID to room
    rooms: RwLock<HashMap<RoomId, Arc<Room>>>,

    /// Configuration
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Create a new room registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new room registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return the live room for `room_id`, creating an empty one if needed
    ///
    /// A room created here stays registered while empty, so the caller
    /// must join it or call `remove_if_empty` afterwards. Prefer
    /// [`RoomRegistry::join`], which never leaves an empty room behind.
    pub fn get_or_create(&self, room_id: &RoomId) -> Arc<Room> {
        if let Some(room) = self.rooms.read().get(room_id) {
            return Arc::clone(room);
        }

        let mut rooms = self.rooms.write();
        Arc::clone(self.get_or_insert(&mut rooms, room_id))
    }

    /// Join a room on behalf of the caller, creating the room if needed
    ///
    /// The join happens while the map lock is still held, so a concurrent
    /// `remove_if_empty` cannot retire the room between lookup and join.
    pub fn join(&self, room_id: &RoomId, auth: &AuthContext) -> Subscription {
        {
            let rooms = self.rooms.read();
            if let Some(room) = rooms.get(room_id) {
                return room.join(auth);
            }
        }

        let mut rooms = self.rooms.write();
        self.get_or_insert(&mut rooms, room_id).join(auth)
    }

    /// Insert an empty room unless one exists; caller holds the write lock
    fn get_or_insert<'a>(
        &self,
        rooms: &'a mut HashMap<RoomId, Arc<Room>>,
        room_id: &RoomId,
    ) -> &'a Arc<Room> {
        rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!(room = %room_id, "Room created");
            Arc::new(Room::new(room_id.clone(), self.config.capacity()))
        })
    }

    /// Look up a room without creating it
    pub fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.read().get(room_id).cloned()
    }

    /// Look up a room that currently has subscribers
    pub fn get_active(&self, room_id: &RoomId) -> Result<Arc<Room>, RegistryError> {
        self.get(room_id)
            .filter(|room| !room.is_empty())
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.clone()))
    }

    /// Remove the room if it has no subscribers left
    ///
    /// Returns `true` if the room was removed.
    pub fn remove_if_empty(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.write();

        let empty = match rooms.get(room_id) {
            Some(room) => room.is_empty(),
            None => return false,
        };

        if empty {
            rooms.remove(room_id);
            tracing::info!(room = %room_id, rooms = rooms.len(), "Room removed");
        }

        empty
    }

    /// Remove a connection from a room and drop the room once it is empty
    pub fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) -> Option<Departure> {
        let departure = self.get(room_id)?.leave(connection_id);
        self.remove_if_empty(room_id);
        departure
    }

    /// Get room statistics
    pub fn room_stats(&self, room_id: &RoomId) -> Option<RoomStats> {
        self.get(room_id).map(|room| room.stats())
    }

    /// Get total number of rooms
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// IDs of all live rooms, sorted
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Check the bookkeeping of every room
    ///
    /// Besides each room's own invariants, no empty room may be reachable.
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        let rooms = self.rooms.read();
        for (id, room) in rooms.iter() {
            if room.is_empty() {
                tracing::error!(room = %id, "Empty room still registered");
                return Err(RegistryError::InvariantViolation(format!(
                    "room {} is empty but registered",
                    id
                )));
            }
            room.check_invariants()?;
        }
        Ok(())
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
