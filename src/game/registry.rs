//! Registry of live rooms and the connection -> room binding

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use super::error::GameError;
use super::player::Slot;
use super::room::Room;
use super::{ConnectionId, RoomId};

/// Registry of all active rooms
///
/// Lock order is always map shard, then room. Nothing here calls back into
/// the map while a room lock is held.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    /// Map of connection -> current room
    connections: DashMap<ConnectionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            connections: DashMap::new(),
        }
    }

    pub fn get(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|room| room.value().clone())
    }

    /// Seat a connection in a room, creating the room if needed
    ///
    /// The seat is taken while the map entry is held, so an eviction
    /// racing with this join cannot drop the room out from under it.
    pub fn join(
        &self,
        id: &RoomId,
        connection: ConnectionId,
        name: &str,
    ) -> Result<(Arc<Room>, Slot), GameError> {
        let seated = {
            let entry = self.get_or_create_entry(id);
            let room = entry.value().clone();
            let slot = room.join(connection, name)?;
            (room, slot)
        };
        self.bind(connection, id.clone());
        Ok(seated)
    }

    /// Remove a connection from whatever room it is in
    pub fn leave(&self, connection: ConnectionId) -> Option<(Arc<Room>, Slot)> {
        let id = self.unbind(connection)?;
        self.vacate(&id, connection)
    }

    /// Free the connection's seat in one room, leaving its binding alone
    pub fn vacate(&self, id: &RoomId, connection: ConnectionId) -> Option<(Arc<Room>, Slot)> {
        let room = self.get(id)?;
        let slot = room.leave(connection);
        self.remove_if_empty(id);
        slot.map(|slot| (room, slot))
    }

    pub fn bind(&self, connection: ConnectionId, id: RoomId) {
        self.connections.insert(connection, id);
    }

    pub fn unbind(&self, connection: ConnectionId) -> Option<RoomId> {
        self.connections.remove(&connection).map(|(_, id)| id)
    }

    pub fn room_of(&self, connection: ConnectionId) -> Option<RoomId> {
        self.connections.get(&connection).map(|id| id.value().clone())
    }

    /// Evict the room if nobody is seated in it
    pub fn remove_if_empty(&self, id: &RoomId) -> bool {
        let removed = self.rooms.remove_if(id, |_, room| room.is_empty()).is_some();
        if removed {
            info!(room_id = %id, active_rooms = self.rooms.len(), "Room evicted");
        }
        removed
    }

    /// Current rooms, cloned out so no map lock is held while ticking
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.iter().map(|room| room.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Connections currently bound to a room
    pub fn seated(&self) -> usize {
        self.connections.len()
    }

    /// Map entry for the room, creating it on first use
    fn get_or_create_entry(&self, id: &RoomId) -> RefMut<'_, RoomId, Arc<Room>> {
        self.rooms
            .entry(id.clone())
            .or_insert_with(|| Self::create(id))
    }

    fn create(id: &RoomId) -> Arc<Room> {
        info!(room_id = %id, "Room created");
        Arc::new(Room::new(id.clone()))
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn joins_to_same_id_share_one_room() {
        let registry = RoomRegistry::new();
        let id = RoomId::from("r1");

        let (first, _) = registry.join(&id, ConnectionId::new(), "A").unwrap();
        let (second, _) = registry.join(&id, ConnectionId::new(), "B").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn vacate_keeps_the_binding() {
        let registry = RoomRegistry::new();
        let old = RoomId::from("old");
        let new = RoomId::from("new");
        let a = ConnectionId::new();
        registry.join(&old, a, "A").unwrap();
        registry.join(&new, a, "A").unwrap();

        let (_, slot) = registry.vacate(&old, a).unwrap();

        assert_eq!(slot, Slot::One);
        assert!(registry.get(&old).is_none());
        assert_eq!(registry.room_of(a), Some(new));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn join_binds_and_leave_evicts() {
        let registry = RoomRegistry::new();
        let id = RoomId::from("r1");
        let a = ConnectionId::new();

        let (_, slot) = registry.join(&id, a, "A").unwrap();
        assert_eq!(slot, Slot::One);
        assert_eq!(registry.room_of(a), Some(id.clone()));
        assert_eq!(registry.seated(), 1);

        let (room, freed) = registry.leave(a).unwrap();
        assert_eq!(freed, Slot::One);
        assert!(room.is_empty());
        assert!(registry.get(&id).is_none());
        assert!(registry.room_of(a).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn room_survives_while_occupied() {
        let registry = RoomRegistry::new();
        let id = RoomId::from("r1");
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.join(&id, a, "A").unwrap();
        registry.join(&id, b, "B").unwrap();

        registry.leave(a);

        assert!(!registry.remove_if_empty(&id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().slot_of(b), Some(Slot::Two));
    }

    #[test]
    fn full_room_does_not_bind() {
        let registry = RoomRegistry::new();
        let id = RoomId::from("r1");
        registry.join(&id, ConnectionId::new(), "A").unwrap();
        registry.join(&id, ConnectionId::new(), "B").unwrap();

        let c = ConnectionId::new();
        assert!(matches!(registry.join(&id, c, "C"), Err(GameError::RoomFull)));
        assert!(registry.room_of(c).is_none());
        assert!(registry.leave(c).is_none());
    }

    #[test]
    fn concurrent_first_joins_seat_exactly_two() {
        let registry = Arc::new(RoomRegistry::new());
        let id = RoomId::from("contested");

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let registry = registry.clone();
                    let id = id.clone();
                    scope.spawn(move || {
                        registry
                            .join(&id, ConnectionId::new(), &format!("P{}", i))
                            .map(|(_, slot)| slot)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let seated = results.iter().filter(|r| r.is_ok()).count();
        let full = results
            .iter()
            .filter(|r| matches!(r, Err(GameError::RoomFull)))
            .count();

        assert_eq!(seated, 2);
        assert_eq!(full, 6);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().occupant_count(), 2);
    }

    #[test]
    fn churn_never_leaves_orphaned_seats() {
        let registry = Arc::new(RoomRegistry::new());
        let id = RoomId::from("churn");

        thread::scope(|scope| {
            for _ in 0..4 {
                let registry = registry.clone();
                let id = id.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        let connection = ConnectionId::new();
                        if registry.join(&id, connection, "X").is_ok() {
                            registry.leave(connection);
                        }
                    }
                });
            }
        });

        assert!(registry.is_empty());
        assert_eq!(registry.seated(), 0);
    }
}
