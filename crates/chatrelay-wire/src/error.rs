use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame declares total_len {declared} but {actual} bytes were given")]
    LengthMismatch { declared: u32, actual: usize },
    #[error("frame shorter than the minimum 5 bytes (got {0})")]
    Truncated(usize),
    #[error("unknown message type tag {0}")]
    UnknownType(u8),
    #[error("{field} field is {len} bytes, over the {max} byte cap")]
    Overlong { field: &'static str, len: usize, max: usize },
    #[error("{field} is not NUL-terminated")]
    NotNulTerminated { field: &'static str },
    #[error("{field} contains an embedded NUL before its terminator")]
    EmbeddedNul { field: &'static str },
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
    #[error("{0} unconsumed bytes left over after decoding a complete message")]
    TrailingBytes(usize),
}
