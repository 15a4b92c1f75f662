use thiserror::Error;
use tracing::info;

use crate::types::{MAX_USERS_PER_ROOM, NUM_ROOMS, RoomId, UserId};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    #[error("room {0} does not exist")]
    NotFound(RoomId),
    #[error("room {0} is full")]
    Full(RoomId),
    #[error("user is not a member of room {0}")]
    NotMember(RoomId),
}

/// A provisioned broadcast group. Membership order reflects insertion order
/// until a removal swaps the last member into the removed slot.
pub struct Room {
    pub id: RoomId,
    capacity: usize,
    members: Vec<UserId>,
}

impl Room {
    fn new(id: RoomId, capacity: usize) -> Self {
        Self { id, capacity, members: Vec::with_capacity(capacity) }
    }

    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, uid: UserId) -> bool {
        self.members.contains(&uid)
    }
}

/// Collection of statically provisioned rooms, indexed by `id - 1`. Rooms
/// are allocated once at boot (room count and per-room capacity are fixed
/// for the registry's lifetime) and never destroyed.
pub struct RoomRegistry {
    rooms: Vec<Room>,
}

impl RoomRegistry {
    /// Provisions `NUM_ROOMS` rooms at the default `MAX_USERS_PER_ROOM` cap.
    pub fn new() -> Self {
        Self::with_capacity(NUM_ROOMS, MAX_USERS_PER_ROOM)
    }

    /// Provisions `num_rooms` rooms, each capped at `room_capacity` members.
    /// Lets the server binary's `--rooms`/`--room-capacity` flags override
    /// the spec's defaults.
    pub fn with_capacity(num_rooms: u8, room_capacity: usize) -> Self {
        let rooms = (1..=num_rooms).map(|id| Room::new(id, room_capacity)).collect();
        Self { rooms }
    }

    pub fn get(&self, id: RoomId) -> Result<&Room, RoomError> {
        if id == 0 || id as usize > self.rooms.len() {
            return Err(RoomError::NotFound(id));
        }
        Ok(&self.rooms[id as usize - 1])
    }

    /// Adds `uid` to the room's member list. Fails with [`RoomError::Full`]
    /// if the room is already at its capacity.
    ///
    /// Does not touch the user's own `room` field — the dispatcher, which
    /// owns both registries, is responsible for keeping that in sync (see
    /// the invariant in `User::room`).
    pub fn add_user(&mut self, room_id: RoomId, uid: UserId) -> Result<(), RoomError> {
        if room_id == 0 || room_id as usize > self.rooms.len() {
            return Err(RoomError::NotFound(room_id));
        }
        let room = &mut self.rooms[room_id as usize - 1];
        if room.members.len() == room.capacity {
            return Err(RoomError::Full(room_id));
        }
        room.members.push(uid);
        info!(uid = uid.0, room = room_id, "user joined room");
        Ok(())
    }

    /// Removes `uid` from the room's member list by swap-with-last. Fails
    /// with [`RoomError::NotMember`] if `uid` is not present.
    pub fn remove_user(&mut self, room_id: RoomId, uid: UserId) -> Result<(), RoomError> {
        if room_id == 0 || room_id as usize > self.rooms.len() {
            return Err(RoomError::NotFound(room_id));
        }
        let room = &mut self.rooms[room_id as usize - 1];
        let pos = room.members.iter().position(|&m| m == uid).ok_or(RoomError::NotMember(room_id))?;
        room.members.swap_remove(pos);
        info!(uid = uid.0, room = room_id, "user left room");
        Ok(())
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

    #[test]
    fn add_and_remove_round_trips_membership() {
        let mut rooms = RoomRegistry::new();
        let uid = UserId(7);
        rooms.add_user(3, uid).unwrap();
        assert!(rooms.get(3).unwrap().contains(uid));
        rooms.remove_user(3, uid).unwrap();
        assert!(!rooms.get(3).unwrap().contains(uid));
    }

    #[test]
    fn get_rejects_out_of_range_ids() {
        let rooms = RoomRegistry::new();
        assert_eq!(rooms.get(0), Err(RoomError::NotFound(0)));
        assert_eq!(rooms.get(NUM_ROOMS + 1).map(|_| ()), Err(RoomError::NotFound(NUM_ROOMS + 1)));
        assert!(rooms.get(NUM_ROOMS).is_ok());
    }

    #[test]
    fn add_user_fails_full_at_cap() {
        let mut rooms = RoomRegistry::new();
        for i in 0..MAX_USERS_PER_ROOM {
            rooms.add_user(1, UserId(i)).unwrap();
        }
        assert_eq!(rooms.add_user(1, UserId(999)), Err(RoomError::Full(1)));
    }

    #[test]
    fn remove_user_fails_not_member() {
        let mut rooms = RoomRegistry::new();
        assert_eq!(rooms.remove_user(1, UserId(1)), Err(RoomError::NotMember(1)));
    }

    #[test]
    fn swap_remove_preserves_other_members() {
        let mut rooms = RoomRegistry::new();
        for i in 0..5 {
            rooms.add_user(2, UserId(i)).unwrap();
        }
        rooms.remove_user(2, UserId(1)).unwrap();
        let members = rooms.get(2).unwrap().members().to_vec();
        assert_eq!(members.len(), 4);
        assert!(!members.contains(&UserId(1)));
        for i in [0, 2, 3, 4] {
            assert!(members.contains(&UserId(i)));
        }
    }
}
