/// A live connection's identity. The connection handle itself (its `mio`
/// token) is a suitable key, so no separate id allocator is needed.
pub use mio::Token as UserId;

/// Room identifier, `1..=NUM_ROOMS`. `INVALID_ROOM` means "not in any room".
pub type RoomId = u8;

/// Sentinel meaning a user is not currently a member of any room.
pub const INVALID_ROOM: RoomId = 0;

/// Number of rooms provisioned at startup. Rooms are never created or
/// destroyed at runtime.
pub const NUM_ROOMS: u8 = 5;

/// Member cap per room.
pub const MAX_USERS_PER_ROOM: usize = 25;
