//! Length-prefixed binary framing for the chat relay.
//!
//! A frame on the wire is `total_len : u32 BE` (inclusive of itself) followed
//! by `total_len - 4` payload bytes, the first of which is a `msg_type` tag.
//! [`Message`] is the decoded form of one frame; [`Message::encode`] /
//! [`Message::decode`] are inverse of each other for well-formed inputs.

mod error;
mod limits;
mod message;
#[cfg(test)]
mod tests;

pub use error::ProtocolError;
pub use limits::{HEADER_LEN, NAME_SIZE_LIMIT, REPLY_SIZE_LIMIT, TEXT_SIZE_LIMIT};
pub use message::{MsgType, Message};
