/// Bytes for `total_len : u32 BE`.
pub const HEADER_LEN: usize = core::mem::size_of::<u32>();

/// Max bytes for a display name, including its trailing NUL.
pub const NAME_SIZE_LIMIT: usize = 50;
/// Max bytes for chat text, including its trailing NUL.
pub const TEXT_SIZE_LIMIT: usize = 1000;
/// Max bytes for a server reply, including its trailing NUL.
pub const REPLY_SIZE_LIMIT: usize = 100;
