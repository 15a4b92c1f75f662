use crate::{
    error::ProtocolError,
    limits::{HEADER_LEN, NAME_SIZE_LIMIT, REPLY_SIZE_LIMIT, TEXT_SIZE_LIMIT},
};

/// Wire tag carried as the first payload byte of every frame.
///
/// Fixed once here and used on both ends of the relay — the original source
/// this protocol was distilled from carried two inconsistent orderings; this
/// is the one assignment this workspace uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    Chat = 0,
    Join = 1,
    Name = 2,
    Reply = 3,
}

impl TryFrom<u8> for MsgType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Chat),
            1 => Ok(Self::Join),
            2 => Ok(Self::Name),
            3 => Ok(Self::Reply),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }
}

/// A decoded chat-relay message.
///
/// `Join` is only ever sent client -> server; `Reply` only server -> client.
/// `Chat` and `Name` travel in both directions but the server overwrites
/// `Chat`'s `timestamp`/`name` before rebroadcasting (see `chatrelay-core`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Chat { timestamp: u32, name: String, text: String },
    Join { room_id: u8 },
    Name { name: String },
    Reply { text: String },
}

impl Message {
    /// Encodes this message into a whole frame: the `u32 BE` length prefix
    /// followed by the tagged payload.
    ///
    /// Panics if a field exceeds its wire cap — callers are expected to
    /// validate strings at the system boundary (`Message::decode`, or a
    /// client command parser) before ever constructing a `Message`.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        match self {
            Message::Chat { timestamp, name, text } => {
                payload.push(MsgType::Chat as u8);
                payload.extend_from_slice(&timestamp.to_be_bytes());
                push_len8_str(&mut payload, name, NAME_SIZE_LIMIT, "name");
                push_len16_str(&mut payload, text, TEXT_SIZE_LIMIT, "text");
            }
            Message::Join { room_id } => {
                payload.push(MsgType::Join as u8);
                payload.push(*room_id);
            }
            Message::Name { name } => {
                payload.push(MsgType::Name as u8);
                push_len8_str(&mut payload, name, NAME_SIZE_LIMIT, "name");
            }
            Message::Reply { text } => {
                payload.push(MsgType::Reply as u8);
                push_len8_str(&mut payload, text, REPLY_SIZE_LIMIT, "reply");
            }
        }

        let total_len = (HEADER_LEN + payload.len()) as u32;
        let mut frame = Vec::with_capacity(total_len as usize);
        frame.extend_from_slice(&total_len.to_be_bytes());
        frame.extend_from_slice(&payload);
        frame
    }

    /// Decodes one whole frame (length prefix + payload) into a `Message`.
    ///
    /// Fails with [`ProtocolError`] on truncation, a `total_len` mismatch, an
    /// unknown tag, an over-long field, trailing bytes past the variant's
    /// prescribed layout, or a string missing its NUL terminator.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.len() < 5 {
            return Err(ProtocolError::Truncated(frame.len()));
        }

        let declared = u32::from_be_bytes(frame[..HEADER_LEN].try_into().unwrap());
        if declared as usize != frame.len() {
            return Err(ProtocolError::LengthMismatch { declared, actual: frame.len() });
        }

        let tag = frame[HEADER_LEN];
        let mut r = Reader::new(&frame[HEADER_LEN + 1..]);

        let msg = match MsgType::try_from(tag)? {
            MsgType::Chat => {
                let timestamp = r.read_u32_be()?;
                let name = r.read_len8_str(NAME_SIZE_LIMIT, "name")?;
                let text = r.read_len16_str(TEXT_SIZE_LIMIT, "text")?;
                Message::Chat { timestamp, name, text }
            }
            MsgType::Join => {
                let room_id = r.read_u8()?;
                Message::Join { room_id }
            }
            MsgType::Name => {
                let name = r.read_len8_str(NAME_SIZE_LIMIT, "name")?;
                Message::Name { name }
            }
            MsgType::Reply => {
                let text = r.read_len8_str(REPLY_SIZE_LIMIT, "reply")?;
                Message::Reply { text }
            }
        };

        r.expect_exhausted()?;
        Ok(msg)
    }
}

fn push_len8_str(buf: &mut Vec<u8>, s: &str, max: usize, field: &'static str) {
    let len = s.len() + 1;
    assert!(len <= max, "{field} exceeds the {max} byte wire cap ({len} bytes with NUL)");
    buf.push(len as u8);
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn push_len16_str(buf: &mut Vec<u8>, s: &str, max: usize, field: &'static str) {
    let len = s.len() + 1;
    assert!(len <= max, "{field} exceeds the {max} byte wire cap ({len} bytes with NUL)");
    buf.extend_from_slice(&(len as u16).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Cursor over one decoded variant's remaining payload bytes.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::Truncated(self.buf.len()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32_be(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_len8_str(&mut self, max: usize, field: &'static str) -> Result<String, ProtocolError> {
        let len = self.read_u8()? as usize;
        self.read_nul_string(len, max, field)
    }

    fn read_len16_str(
        &mut self,
        max: usize,
        field: &'static str,
    ) -> Result<String, ProtocolError> {
        let len = u16::from_be_bytes(self.take(2)?.try_into().unwrap()) as usize;
        self.read_nul_string(len, max, field)
    }

    fn read_nul_string(
        &mut self,
        len: usize,
        max: usize,
        field: &'static str,
    ) -> Result<String, ProtocolError> {
        if len == 0 || len > max {
            return Err(ProtocolError::Overlong { field, len, max });
        }
        let bytes = self.take(len)?;
        if bytes[len - 1] != 0 {
            return Err(ProtocolError::NotNulTerminated { field });
        }
        let content = &bytes[..len - 1];
        if content.contains(&0) {
            return Err(ProtocolError::EmbeddedNul { field });
        }
        std::str::from_utf8(content)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidUtf8 { field })
    }

    fn expect_exhausted(&self) -> Result<(), ProtocolError> {
        if self.remaining() != 0 {
            return Err(ProtocolError::TrailingBytes(self.remaining()));
        }
        Ok(())
    }
}
