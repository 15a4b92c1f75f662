//! Room/user registries (C4/C5) and the single-threaded server dispatcher
//! (C6) for the chat relay.

mod dispatcher;
mod room;
mod types;
mod user;

pub use dispatcher::Dispatcher;
pub use room::{Room, RoomError, RoomRegistry};
pub use types::{INVALID_ROOM, MAX_USERS_PER_ROOM, NUM_ROOMS, RoomId, UserId};
pub use user::{User, UserError, UserRegistry};
