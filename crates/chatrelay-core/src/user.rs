use std::collections::HashMap;

use thiserror::Error;

use crate::types::{INVALID_ROOM, RoomId, UserId};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserError {
    #[error("user already registered")]
    Duplicate,
    #[error("user not found")]
    NotFound,
}

/// Per-connection server-side state: display name and current room.
pub struct User {
    pub name: String,
    pub room: RoomId,
}

impl User {
    fn new() -> Self {
        Self { name: "Anonymous".to_string(), room: INVALID_ROOM }
    }
}

/// Connection-identity to user-state mapping. Any associative structure
/// would do; a hash map keyed by the `mio` token is the natural choice since
/// tokens are already unique per live connection.
#[derive(Default)]
pub struct UserRegistry {
    users: HashMap<UserId, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, uid: UserId) -> Result<(), UserError> {
        if self.users.contains_key(&uid) {
            return Err(UserError::Duplicate);
        }
        self.users.insert(uid, User::new());
        Ok(())
    }

    pub fn find(&self, uid: UserId) -> Result<&User, UserError> {
        self.users.get(&uid).ok_or(UserError::NotFound)
    }

    pub fn find_mut(&mut self, uid: UserId) -> Result<&mut User, UserError> {
        self.users.get_mut(&uid).ok_or(UserError::NotFound)
    }

    pub fn delete(&mut self, uid: UserId) -> Result<User, UserError> {
        self.users.remove(&uid).ok_or(UserError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
